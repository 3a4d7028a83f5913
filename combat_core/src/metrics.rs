//! Per-iteration metrics
//!
//! Spells accumulate [`TargetMetrics`] as results land. At the end of an
//! iteration the simulation folds everything into an [`IterationMetrics`]
//! snapshot, which is plain data and can cross threads.

use crate::resource::ResourceMetrics;
use crate::spell::SpellResult;
use crate::types::{Outcome, SpellSchool, UnitKind};
use serde::{Deserialize, Serialize};
use strum::EnumCount;

/// Totals for one spell against one target
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TargetMetrics {
    pub events: u32,
    pub ticks: u32,
    pub damage: f64,
    pub healing: f64,
    pub threat: f64,
    pub outcomes: [u32; Outcome::COUNT],
}

impl TargetMetrics {
    pub(crate) fn record(&mut self, result: &SpellResult) {
        self.events += 1;
        if result.periodic {
            self.ticks += 1;
        }
        if result.healing {
            self.healing += result.amount;
        } else {
            self.damage += result.amount;
        }
        self.threat += result.threat;
        self.outcomes[result.outcome.index()] += 1;
    }

    pub fn count(&self, outcome: Outcome) -> u32 {
        self.outcomes[outcome.index()]
    }

    pub(crate) fn merge(&mut self, other: &TargetMetrics) {
        self.events += other.events;
        self.ticks += other.ticks;
        self.damage += other.damage;
        self.healing += other.healing;
        self.threat += other.threat;
        for (a, b) in self.outcomes.iter_mut().zip(other.outcomes.iter()) {
            *a += b;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellMetrics {
    pub label: String,
    pub school: SpellSchool,
    pub casts: u32,
    /// Indexed by target unit
    pub targets: Vec<TargetMetrics>,
}

impl SpellMetrics {
    /// Sum over all targets
    pub fn total(&self) -> TargetMetrics {
        let mut total = TargetMetrics::default();
        for t in &self.targets {
            total.merge(t);
        }
        total
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuraMetrics {
    pub label: String,
    pub uptime_secs: f64,
    pub activations: u32,
    pub refreshes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitMetrics {
    pub label: String,
    pub kind: UnitKind,
    pub spells: Vec<SpellMetrics>,
    pub auras: Vec<AuraMetrics>,
    pub resource: Option<ResourceMetrics>,
}

impl UnitMetrics {
    pub fn damage_dealt(&self) -> f64 {
        self.spells.iter().map(|s| s.total().damage).sum()
    }

    pub fn healing_dealt(&self) -> f64 {
        self.spells.iter().map(|s| s.total().healing).sum()
    }

    pub fn threat(&self) -> f64 {
        self.spells.iter().map(|s| s.total().threat).sum()
    }
}

/// Everything one iteration produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationMetrics {
    pub seed: u64,
    pub duration_secs: f64,
    /// Damage taken by enemy units
    pub encounter_damage: f64,
    pub units: Vec<UnitMetrics>,
}

impl IterationMetrics {
    /// Damage per second dealt by a unit
    pub fn dps(&self, unit: usize) -> f64 {
        match self.units.get(unit) {
            Some(u) if self.duration_secs > 0.0 => u.damage_dealt() / self.duration_secs,
            _ => 0.0,
        }
    }
}
