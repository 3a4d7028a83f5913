//! Periodic damage and healing with snapshotting
//!
//! Applying a dot captures its per-tick base amount and the caster's
//! multipliers at that instant. Ticks reuse the snapshot for the caster side
//! and resolve the target side, mitigation and outcome fresh. Re-applying
//! restarts the dot; pending ticks from the earlier application are stale by
//! generation.

use crate::spell::{BaseAmountFn, OutcomeRoll};
use crate::types::{SpellId, UnitId};
use crate::Simulation;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, warn};

/// Periodic effect attached to a spell
#[derive(Clone)]
pub struct DotConfig {
    pub tick_period: Duration,
    pub num_ticks: u32,
    /// Base amount of one tick, evaluated at application
    pub tick_base: BaseAmountFn,
    /// `Tick` or `SnapshotCrit`
    pub outcome: OutcomeRoll,
}

impl fmt::Debug for DotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DotConfig")
            .field("tick_period", &self.tick_period)
            .field("num_ticks", &self.num_ticks)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

impl DotConfig {
    pub fn new<F>(tick_period: Duration, num_ticks: u32, tick_base: F) -> Self
    where
        F: Fn(&mut Simulation, SpellId, UnitId) -> f64 + 'static,
    {
        DotConfig {
            tick_period,
            num_ticks,
            tick_base: Rc::new(tick_base),
            outcome: OutcomeRoll::Tick,
        }
    }

    pub fn with_snapshot_crit(mut self) -> Self {
        self.outcome = OutcomeRoll::SnapshotCrit;
        self
    }
}

/// Values frozen when a dot is applied
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DotSnapshot {
    pub base: f64,
    pub multiplier: f64,
    pub crit_chance: f64,
}

/// Per-target dot state held by the spell
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DotState {
    pub active: bool,
    pub generation: u64,
    pub ticks_remaining: u32,
    pub next_tick_at: Duration,
    pub snapshot: DotSnapshot,
}

impl Simulation {
    /// Apply or re-apply the spell's dot to `target`
    pub fn apply_dot(&mut self, spell: SpellId, target: UnitId) {
        let Some(dot) = self.spell(spell).config().dot.clone() else {
            warn!(spell = %self.spell(spell).label(), "apply_dot on a spell without a dot");
            return;
        };
        let snapshot = self.take_dot_snapshot(spell, target, &dot);
        let at = self.now() + dot.tick_period;

        let Some(state) = self.dot_state_mut(spell, target) else {
            return;
        };
        let refreshed = state.active;
        state.active = true;
        state.generation += 1;
        state.ticks_remaining = dot.num_ticks;
        state.next_tick_at = at;
        state.snapshot = snapshot;
        let generation = state.generation;

        debug!(
            spell = %self.spell(spell).label(),
            target = target.index(),
            refreshed,
            "dot applied"
        );
        self.schedule_dot_tick(spell, target, generation, at);
    }

    /// Stop a running dot; pending ticks become stale
    pub fn cancel_dot(&mut self, spell: SpellId, target: UnitId) {
        if let Some(state) = self.dot_state_mut(spell, target) {
            if state.active {
                state.active = false;
                state.generation += 1;
            }
        }
    }

    /// Refresh the snapshot of a running dot without restarting its ticks
    pub fn resnapshot_dot(&mut self, spell: SpellId, target: UnitId) {
        if !self.is_dot_active(spell, target) {
            return;
        }
        let Some(dot) = self.spell(spell).config().dot.clone() else {
            return;
        };
        let snapshot = self.take_dot_snapshot(spell, target, &dot);
        if let Some(state) = self.dot_state_mut(spell, target) {
            state.snapshot = snapshot;
        }
    }

    pub fn is_dot_active(&self, spell: SpellId, target: UnitId) -> bool {
        self.dot_state(spell, target).is_some_and(|s| s.active)
    }

    pub fn dot_state(&self, spell: SpellId, target: UnitId) -> Option<&DotState> {
        self.spell(spell).dots.get(target.index())
    }

    fn dot_state_mut(&mut self, spell: SpellId, target: UnitId) -> Option<&mut DotState> {
        self.spell_mut(spell).dots.get_mut(target.index())
    }

    fn take_dot_snapshot(&mut self, spell: SpellId, target: UnitId, dot: &DotConfig) -> DotSnapshot {
        let base = (dot.tick_base)(self, spell, target);
        let healing = self.spell(spell).config().is_healing();
        let multiplier = self.attacker_multiplier(spell, target, healing);
        let crit_chance = if dot.outcome == OutcomeRoll::SnapshotCrit {
            let roll = if healing {
                OutcomeRoll::HealingCrit
            } else {
                OutcomeRoll::MagicCrit
            };
            self.roll_chances(spell, target, roll).crit
        } else {
            0.0
        };
        DotSnapshot {
            base,
            multiplier,
            crit_chance,
        }
    }

    fn schedule_dot_tick(&mut self, spell: SpellId, target: UnitId, generation: u64, at: Duration) {
        self.scheduler.schedule(
            at,
            Box::new(move |sim: &mut Simulation| sim.tick_dot(spell, target, generation)),
        );
    }

    fn tick_dot(&mut self, spell: SpellId, target: UnitId, generation: u64) {
        let Some(dot) = self.spell(spell).config().dot.clone() else {
            return;
        };
        let Some(state) = self.dot_state_mut(spell, target) else {
            return;
        };
        if !state.active || state.generation != generation {
            return;
        }
        state.ticks_remaining = state.ticks_remaining.saturating_sub(1);
        let snapshot = state.snapshot;

        let handle = self.calc_periodic(spell, target, snapshot, dot.outcome);
        self.land_result(handle);

        // Hooks run by the tick may have cancelled or re-applied the dot
        let now = self.now();
        let Some(state) = self.dot_state_mut(spell, target) else {
            return;
        };
        if !state.active || state.generation != generation {
            return;
        }
        if state.ticks_remaining == 0 {
            state.active = false;
            return;
        }
        let at = now + dot.tick_period;
        state.next_tick_at = at;
        self.schedule_dot_tick(spell, target, generation, at);
    }
}
