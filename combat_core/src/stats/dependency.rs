//! StatSheet - base stats folded through toggleable dependency edges
//!
//! Derived values are never written in place. A read folds the base and
//! bonus vectors through every currently-enabled edge:
//!
//! ```text
//! value(d) = (base[d] + bonus[d] + Σ coef * value(source))  *  Π factor
//!                                  additive edges into d       multiplicative edges on d
//! ```
//!
//! Toggling an edge only marks the cached vector dirty; the fold runs on the
//! next read.

use super::{Stat, StatVector};
use crate::error::SetupError;
use std::cell::RefCell;
use strum::{EnumCount, IntoEnumIterator};

/// How a dependency edge contributes to its derived stat
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatRelation {
    /// derived += coefficient * value(source)
    Additive { coefficient: f64 },
    /// derived *= factor (source must equal derived)
    Multiplicative { factor: f64 },
}

/// A single edge in the dependency graph
#[derive(Debug, Clone, PartialEq)]
pub struct StatDependency {
    pub source: Stat,
    pub derived: Stat,
    pub relation: StatRelation,
    enabled: bool,
    enabled_at_start: bool,
    /// Active auras currently holding this edge on
    holds: u32,
    /// State to restore once the last hold is released
    held_from: bool,
}

impl StatDependency {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn holds(&self) -> u32 {
        self.holds
    }
}

/// Stats of one unit
#[derive(Debug, Clone, Default)]
pub struct StatSheet {
    base: StatVector,
    bonus: StatVector,
    edges: Vec<StatDependency>,
    cache: RefCell<Option<StatVector>>,
}

impl StatSheet {
    pub fn new(base: StatVector) -> Self {
        StatSheet {
            base,
            ..Default::default()
        }
    }

    /// Add a flat bonus on top of the base value
    pub fn add_bonus(&mut self, stat: Stat, amount: f64) {
        self.bonus[stat] += amount;
        self.invalidate();
    }

    /// Register an edge; returns its index
    pub fn add_dependency(
        &mut self,
        source: Stat,
        derived: Stat,
        relation: StatRelation,
        enabled: bool,
    ) -> Result<usize, SetupError> {
        match relation {
            StatRelation::Multiplicative { factor } => {
                if source != derived || !factor.is_finite() || factor <= 0.0 {
                    return Err(SetupError::InvalidDependency {
                        source_stat: source,
                        derived,
                    });
                }
            }
            StatRelation::Additive { coefficient } => {
                if !coefficient.is_finite() {
                    return Err(SetupError::InvalidDependency {
                        source_stat: source,
                        derived,
                    });
                }
                if source == derived || self.reaches(derived, source) {
                    return Err(SetupError::DependencyCycle {
                        source_stat: source,
                        derived,
                    });
                }
            }
        }

        self.edges.push(StatDependency {
            source,
            derived,
            relation,
            enabled,
            enabled_at_start: enabled,
            holds: 0,
            held_from: enabled,
        });
        self.invalidate();
        Ok(self.edges.len() - 1)
    }

    /// Enable or disable an edge. Returns true if the state changed.
    pub fn set_enabled(&mut self, index: usize, enabled: bool) -> bool {
        let Some(edge) = self.edges.get_mut(index) else {
            return false;
        };
        if edge.enabled == enabled {
            return false;
        }
        edge.enabled = enabled;
        self.invalidate();
        true
    }

    /// Take a hold on an edge, enabling it. Holds nest: the edge keeps the
    /// state it had before the first hold and returns to it once every hold
    /// is released.
    pub fn hold(&mut self, index: usize) {
        let Some(edge) = self.edges.get_mut(index) else {
            return;
        };
        if edge.holds == 0 {
            edge.held_from = edge.enabled;
        }
        edge.holds += 1;
        self.set_enabled(index, true);
    }

    /// Release a hold taken with [`StatSheet::hold`]
    pub fn release(&mut self, index: usize) {
        let Some(edge) = self.edges.get_mut(index) else {
            return;
        };
        if edge.holds == 0 {
            return;
        }
        edge.holds -= 1;
        if edge.holds == 0 {
            let restore = edge.held_from;
            self.set_enabled(index, restore);
        }
    }

    pub fn dependency(&self, index: usize) -> Option<&StatDependency> {
        self.edges.get(index)
    }

    /// Current value of a stat
    pub fn get(&self, stat: Stat) -> f64 {
        self.all()[stat]
    }

    /// Current values of all stats
    pub fn all(&self) -> StatVector {
        if let Some(cached) = *self.cache.borrow() {
            return cached;
        }
        let computed = self.compute();
        *self.cache.borrow_mut() = Some(computed);
        computed
    }

    pub fn base(&self) -> &StatVector {
        &self.base
    }

    /// Restore every edge to the state it was registered with
    pub fn reset(&mut self) {
        for edge in &mut self.edges {
            edge.enabled = edge.enabled_at_start;
            edge.holds = 0;
            edge.held_from = edge.enabled_at_start;
        }
        self.invalidate();
    }

    fn invalidate(&self) {
        *self.cache.borrow_mut() = None;
    }

    /// Whether `to` is reachable from `from` through additive edges
    fn reaches(&self, from: Stat, to: Stat) -> bool {
        let mut visited = [false; Stat::COUNT];
        let mut stack = vec![from];
        while let Some(stat) = stack.pop() {
            if stat == to {
                return true;
            }
            if std::mem::replace(&mut visited[stat.index()], true) {
                continue;
            }
            for edge in &self.edges {
                if edge.source == stat && matches!(edge.relation, StatRelation::Additive { .. }) {
                    stack.push(edge.derived);
                }
            }
        }
        false
    }

    fn compute(&self) -> StatVector {
        let mut values = StatVector::new();
        let mut done = [false; Stat::COUNT];
        for stat in Stat::iter() {
            self.resolve(stat, &mut values, &mut done);
        }
        values
    }

    fn resolve(&self, stat: Stat, values: &mut StatVector, done: &mut [bool; Stat::COUNT]) -> f64 {
        if done[stat.index()] {
            return values[stat];
        }

        let mut value = self.base[stat] + self.bonus[stat];
        let mut multiplier = 1.0;
        for edge in self.edges.iter().filter(|e| e.enabled && e.derived == stat) {
            match edge.relation {
                StatRelation::Additive { coefficient } => {
                    value += coefficient * self.resolve(edge.source, values, done);
                }
                StatRelation::Multiplicative { factor } => multiplier *= factor,
            }
        }

        values[stat] = value * multiplier;
        done[stat.index()] = true;
        values[stat]
    }
}
