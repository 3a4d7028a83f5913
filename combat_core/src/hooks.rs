//! Callback types and per-unit hook lists
//!
//! Callbacks receive the whole simulation mutably, so they are reference
//! counted and cloned out of their owner before being invoked.

use crate::spell::{Spell, SpellResult};
use crate::types::{AuraId, SpellId, UnitId};
use crate::Simulation;
use std::rc::Rc;
use strum::{EnumCount, EnumIter};

/// Fired when a unit finishes casting a spell
pub type CastHook = Rc<dyn Fn(&mut Simulation, SpellId)>;
/// Fired when a landed or avoided result is applied
pub type SpellResultHook = Rc<dyn Fn(&mut Simulation, &SpellResult)>;
/// Adjusts a spell as it is registered (talents, glyphs, set bonuses)
pub type SpellRegisteredHook = Rc<dyn Fn(&mut Spell)>;
/// Offered at every decision point
pub type RotationHook = Rc<dyn Fn(&mut Simulation, UnitId)>;

/// Aura lifecycle callbacks
pub type AuraCallback = Rc<dyn Fn(&mut Simulation, AuraId)>;
/// Called with (old, new) stack counts
pub type StackCallback = Rc<dyn Fn(&mut Simulation, AuraId, u32, u32)>;
/// Result hook scoped to an aura; only fires while it is active
pub type AuraResultHook = Rc<dyn Fn(&mut Simulation, AuraId, &SpellResult)>;
/// Cast hook scoped to an aura; only fires while it is active
pub type AuraCastHook = Rc<dyn Fn(&mut Simulation, AuraId, SpellId)>;

/// Which side of a result a hook listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumCount, EnumIter)]
pub enum ResultEvent {
    SpellHitDealt,
    SpellHitTaken,
    PeriodicDamageDealt,
    PeriodicDamageTaken,
    HealDealt,
    HealTaken,
    PeriodicHealDealt,
    PeriodicHealTaken,
}

impl ResultEvent {
    /// (dealt, taken) events for a result
    pub fn for_result(result: &SpellResult) -> (ResultEvent, ResultEvent) {
        match (result.healing, result.periodic) {
            (false, false) => (ResultEvent::SpellHitDealt, ResultEvent::SpellHitTaken),
            (false, true) => (
                ResultEvent::PeriodicDamageDealt,
                ResultEvent::PeriodicDamageTaken,
            ),
            (true, false) => (ResultEvent::HealDealt, ResultEvent::HealTaken),
            (true, true) => (
                ResultEvent::PeriodicHealDealt,
                ResultEvent::PeriodicHealTaken,
            ),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Hooks registered on one unit
#[derive(Clone)]
pub struct UnitHooks {
    pub(crate) cast_complete: Vec<CastHook>,
    pub(crate) spell_registered: Vec<SpellRegisteredHook>,
    results: [Vec<SpellResultHook>; ResultEvent::COUNT],
}

impl Default for UnitHooks {
    fn default() -> Self {
        UnitHooks {
            cast_complete: Vec::new(),
            spell_registered: Vec::new(),
            results: std::array::from_fn(|_| Vec::new()),
        }
    }
}

impl UnitHooks {
    pub(crate) fn add_result_hook(&mut self, event: ResultEvent, hook: SpellResultHook) {
        self.results[event.index()].push(hook);
    }

    pub(crate) fn result_hooks(&self, event: ResultEvent) -> &[SpellResultHook] {
        &self.results[event.index()]
    }
}
