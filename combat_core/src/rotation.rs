//! Data-driven priority rotations
//!
//! A rotation is a list of `(label, predicate, spell)` entries evaluated top
//! to bottom; the first entry whose predicate holds and whose cast succeeds
//! wins the decision point.

use crate::types::{SpellId, UnitId};
use crate::Simulation;
use std::rc::Rc;
use tracing::trace;

pub type RotationPredicate = Rc<dyn Fn(&Simulation, UnitId) -> bool>;

#[derive(Clone)]
pub struct RotationEntry {
    pub label: String,
    pub spell: SpellId,
    pub condition: RotationPredicate,
}

#[derive(Clone)]
pub struct PriorityRotation {
    target: UnitId,
    entries: Vec<RotationEntry>,
}

impl PriorityRotation {
    pub fn new(target: UnitId) -> Self {
        PriorityRotation {
            target,
            entries: Vec::new(),
        }
    }

    /// Append an entry below the existing ones
    pub fn with_entry<F>(mut self, label: impl Into<String>, spell: SpellId, condition: F) -> Self
    where
        F: Fn(&Simulation, UnitId) -> bool + 'static,
    {
        self.entries.push(RotationEntry {
            label: label.into(),
            spell,
            condition: Rc::new(condition),
        });
        self
    }

    /// Unconditional entry
    pub fn with_spell(self, label: impl Into<String>, spell: SpellId) -> Self {
        self.with_entry(label, spell, |_, _| true)
    }

    pub fn entries(&self) -> &[RotationEntry] {
        &self.entries
    }

    /// Evaluate once; returns the label of the entry that cast
    pub fn execute(&self, sim: &mut Simulation, unit: UnitId) -> Option<&str> {
        for entry in &self.entries {
            if !(entry.condition)(sim, unit) {
                continue;
            }
            if sim.cast(entry.spell, self.target) {
                trace!(unit = unit.index(), entry = %entry.label, "rotation cast");
                return Some(&entry.label);
            }
        }
        None
    }

    /// Install as the unit's rotation hook
    pub fn install(self, sim: &mut Simulation, unit: UnitId) -> Result<(), crate::SetupError> {
        sim.set_rotation(unit, move |sim, unit| {
            self.execute(sim, unit);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConstants;
    use crate::resource::ResourceConfig;
    use crate::sim::EncounterConfig;
    use crate::spell::{OutcomeRoll, SpellConfig};
    use crate::types::{ProcMask, SpellSchool, UnitKind};
    use crate::unit::UnitConfig;
    use std::time::Duration;

    fn setup() -> (Simulation, UnitId, UnitId, SpellId, SpellId) {
        let mut sim = Simulation::new(
            SimConstants::default(),
            EncounterConfig {
                duration: Duration::from_secs(15),
                ..Default::default()
            },
        );
        let rogue = sim
            .add_unit(
                UnitConfig::new("rogue", UnitKind::Player, 80)
                    .with_resource(ResourceConfig::energy(100.0)),
            )
            .unwrap();
        let boss = sim
            .add_unit(UnitConfig::new("boss", UnitKind::Enemy, 80))
            .unwrap();
        let finisher = sim
            .register_spell(
                rogue,
                SpellConfig::new("finisher", SpellSchool::Physical, ProcMask::MELEE_MH_SPECIAL)
                    .with_cost(35.0)
                    .with_cooldown(Duration::from_secs(10))
                    .with_flat_amount(500.0)
                    .with_outcome(OutcomeRoll::AlwaysHit),
            )
            .unwrap();
        let filler = sim
            .register_spell(
                rogue,
                SpellConfig::new("filler", SpellSchool::Physical, ProcMask::MELEE_MH_SPECIAL)
                    .with_cost(40.0)
                    .with_flat_amount(100.0)
                    .with_outcome(OutcomeRoll::AlwaysHit),
            )
            .unwrap();
        (sim, rogue, boss, finisher, filler)
    }

    #[test]
    fn test_first_matching_entry_wins() {
        let (mut sim, rogue, boss, finisher, filler) = setup();
        let rotation = PriorityRotation::new(boss)
            .with_spell("finisher", finisher)
            .with_spell("filler", filler);
        sim.finalize().unwrap();

        assert_eq!(rotation.execute(&mut sim, rogue), Some("finisher"));
        // GCD now blocks everything
        assert_eq!(rotation.execute(&mut sim, rogue), None);
    }

    #[test]
    fn test_condition_skips_entry() {
        let (mut sim, rogue, boss, finisher, filler) = setup();
        let rotation = PriorityRotation::new(boss)
            .with_entry("finisher", finisher, |sim, unit| sim.current_resource(unit) < 50.0)
            .with_spell("filler", filler);
        sim.finalize().unwrap();

        assert_eq!(rotation.execute(&mut sim, rogue), Some("filler"));
    }

    #[test]
    fn test_installed_rotation_drives_casts() {
        let (mut sim, rogue, boss, finisher, filler) = setup();
        PriorityRotation::new(boss)
            .with_spell("finisher", finisher)
            .with_spell("filler", filler)
            .install(&mut sim, rogue)
            .unwrap();
        sim.finalize().unwrap();
        sim.run().unwrap();

        assert_eq!(sim.spell(finisher).casts(), 2);
        assert!(sim.spell(filler).casts() >= 2);
    }
}
