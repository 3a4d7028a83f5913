//! Decision points and the major-cooldown arbiter
//!
//! A driven unit (one with a rotation or major cooldowns) is offered a
//! decision point at iteration start, after every completed cast and when
//! its global cooldown comes back. At each point the arbiter activates at
//! most one major cooldown, then the rotation hook runs.

use crate::error::SetupError;
use crate::types::{SpellId, UnitId};
use crate::Simulation;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, trace};

pub type ActivationPredicate = Rc<dyn Fn(&Simulation, UnitId) -> bool>;

/// A long cooldown competing for activation
#[derive(Clone)]
pub struct MajorCooldown {
    pub spell: SpellId,
    /// Higher tiers are considered first
    pub tier: i32,
    pub target: UnitId,
    pub should_activate: ActivationPredicate,
}

impl fmt::Debug for MajorCooldown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MajorCooldown")
            .field("spell", &self.spell)
            .field("tier", &self.tier)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Register a major cooldown owned by the spell's unit
    pub fn add_major_cooldown<F>(
        &mut self,
        spell: SpellId,
        tier: i32,
        target: UnitId,
        should_activate: F,
    ) -> Result<(), SetupError>
    where
        F: Fn(&Simulation, UnitId) -> bool + 'static,
    {
        self.check_setup(spell.unit)?;
        if spell.index >= self.units[spell.unit.index()].spells.len() {
            return Err(SetupError::ForeignHandle);
        }
        if target.index() >= self.units.len() {
            return Err(SetupError::UnknownUnit(target.index()));
        }
        self.units[spell.unit.index()]
            .major_cooldowns
            .push(MajorCooldown {
                spell,
                tier,
                target,
                should_activate: Rc::new(should_activate),
            });
        Ok(())
    }

    /// Ask for a decision point at `at`. An earlier or equal pending request
    /// already covers it.
    pub fn request_decision(&mut self, unit: UnitId, at: Duration) {
        let at = at.max(self.now());
        let owner = &mut self.units[unit.index()];
        if !owner.is_driven() {
            return;
        }
        if owner.decision.pending.is_some_and(|p| p <= at) {
            return;
        }
        owner.decision.generation += 1;
        owner.decision.pending = Some(at);
        let generation = owner.decision.generation;
        trace!(unit = unit.index(), ?at, "decision requested");
        self.scheduler.schedule(
            at,
            Box::new(move |sim: &mut Simulation| sim.decide(unit, generation)),
        );
    }

    /// Rotations call this to be woken at `at` when nothing is castable now
    pub fn wait_until(&mut self, unit: UnitId, at: Duration) {
        self.request_decision(unit, at);
    }

    fn decide(&mut self, unit: UnitId, generation: u64) {
        let now = self.now();
        let owner = &mut self.units[unit.index()];
        if owner.decision.generation != generation {
            return;
        }
        owner.decision.pending = None;

        if let Some(hardcast) = owner.hardcast.filter(|h| h.ends_at > now) {
            self.request_decision(unit, hardcast.ends_at);
            return;
        }

        self.run_arbiter(unit);
        if let Some(rotation) = self.units[unit.index()].rotation.clone() {
            rotation(self, unit);
        }

        // Come back when the GCD frees up unless something else already asked
        let owner = &self.units[unit.index()];
        let gcd_ready = owner.gcd.ready_at();
        if gcd_ready > now && !owner.is_hardcasting(now) {
            self.request_decision(unit, gcd_ready);
        }
    }

    /// Activate the first ready major cooldown, highest tier first
    fn run_arbiter(&mut self, unit: UnitId) {
        let cooldowns = self.units[unit.index()].major_cooldowns.clone();
        for cd in cooldowns {
            if !self.can_cast(cd.spell) || !(cd.should_activate)(self, unit) {
                continue;
            }
            if self.cast(cd.spell, cd.target) {
                debug!(
                    unit = unit.index(),
                    spell = %self.spell(cd.spell).label(),
                    tier = cd.tier,
                    "major cooldown activated"
                );
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SimConstants;
    use crate::sim::EncounterConfig;
    use crate::spell::SpellConfig;
    use crate::types::{ProcMask, SpellFlags, SpellSchool, UnitId, UnitKind};
    use crate::unit::UnitConfig;
    use crate::Simulation;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    fn setup() -> (Simulation, UnitId, UnitId) {
        let mut sim = Simulation::new(
            SimConstants::default(),
            EncounterConfig {
                duration: Duration::from_secs(30),
                ..Default::default()
            },
        );
        let player = sim
            .add_unit(UnitConfig::new("player", UnitKind::Player, 80))
            .unwrap();
        let boss = sim
            .add_unit(UnitConfig::new("boss", UnitKind::Enemy, 83))
            .unwrap();
        (sim, player, boss)
    }

    fn cooldown(label: &str, log: &Rc<RefCell<Vec<String>>>) -> SpellConfig {
        let log = Rc::clone(log);
        let name = label.to_string();
        SpellConfig::new(label, SpellSchool::Physical, ProcMask::EMPTY)
            .with_flags(SpellFlags::BYPASS_GCD)
            .with_cooldown(Duration::from_secs(120))
            .with_effects(move |_, _, _| log.borrow_mut().push(name.clone()))
    }

    #[test]
    fn test_arbiter_prefers_higher_tier() {
        let (mut sim, player, _) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));
        let low = sim.register_spell(player, cooldown("trinket", &log)).unwrap();
        let high = sim.register_spell(player, cooldown("bloodlust", &log)).unwrap();
        sim.add_major_cooldown(low, 1, player, |_, _| true).unwrap();
        sim.add_major_cooldown(high, 5, player, |_, _| true).unwrap();
        sim.finalize().unwrap();
        sim.run().unwrap();

        // One activation per decision point; both are used at time zero
        // because each completed cast offers a new point
        let log = log.borrow();
        assert_eq!(log.as_slice(), ["bloodlust", "trinket"]);
    }

    #[test]
    fn test_predicate_gates_activation() {
        let (mut sim, player, _) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));
        let spell = sim.register_spell(player, cooldown("execute_cd", &log)).unwrap();
        sim.add_major_cooldown(spell, 0, player, |sim, _| {
            sim.now() >= Duration::from_secs(10)
        })
        .unwrap();
        // Rotation keeps decision points coming every second
        sim.set_rotation(player, |sim, unit| {
            let next = sim.now() + Duration::from_secs(1);
            sim.wait_until(unit, next);
        })
        .unwrap();
        sim.finalize().unwrap();
        sim.run().unwrap();

        assert_eq!(log.borrow().len(), 1);
        let spell = sim.spell(spell);
        assert_eq!(spell.casts(), 1);
    }

    #[test]
    fn test_undriven_unit_gets_no_decisions() {
        let (mut sim, player, _) = setup();
        sim.finalize().unwrap();
        sim.request_decision(player, Duration::ZERO);
        assert!(sim.scheduler.is_empty());
    }
}
