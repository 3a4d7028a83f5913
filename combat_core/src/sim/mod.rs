//! The simulation: units, clock and RNG for one encounter
//!
//! A [`Simulation`] is built once through the setup calls, frozen with
//! [`Simulation::finalize`], then run any number of times. Each run starts
//! from [`Simulation::reset`] with its own seed, so one instance per worker
//! thread can be reused for every iteration that thread executes.

mod encounter;
mod scheduler;

pub use encounter::{Encounter, EncounterConfig};
pub use scheduler::{
    advance, schedule_periodic, Action, PeriodicHandle, ScheduleContext, Scheduler,
};

use crate::attack_table::AttackTable;
use crate::config::SimConstants;
use crate::error::SetupError;
use crate::hooks::{ResultEvent, SpellResultHook};
use crate::metrics::{AuraMetrics, IterationMetrics, SpellMetrics, UnitMetrics};
use crate::resource::REGEN_SOURCE;
use crate::spell::{ResultArena, Spell, SpellConfig, SpellResult};
use crate::stats::{PseudoStats, Stat, StatRelation};
use crate::timer::Timer;
use crate::trace::TraceSink;
use crate::types::{DependencyId, SpellId, TimerId, UnitId, UnitKind};
use crate::unit::{Unit, UnitConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, trace};

/// One encounter and everything taking part in it
pub struct Simulation {
    pub(crate) constants: SimConstants,
    pub(crate) encounter: Encounter,
    pub(crate) scheduler: Scheduler<Simulation>,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) units: Vec<Unit>,
    pub(crate) results: ResultArena,
    pub(crate) trace: Option<Box<dyn TraceSink>>,
    finalized: bool,
    seed: u64,
}

impl ScheduleContext for Simulation {
    fn scheduler(&self) -> &Scheduler<Self> {
        &self.scheduler
    }

    fn scheduler_mut(&mut self) -> &mut Scheduler<Self> {
        &mut self.scheduler
    }

    fn on_advance(&mut self) {
        self.expire_overdue_auras();
    }
}

impl Simulation {
    pub fn new(constants: SimConstants, encounter: EncounterConfig) -> Self {
        Simulation {
            constants,
            encounter: Encounter::new(encounter),
            scheduler: Scheduler::new(),
            rng: ChaCha8Rng::seed_from_u64(0),
            units: Vec::new(),
            results: ResultArena::new(),
            trace: None,
            finalized: false,
            seed: 0,
        }
    }

    /// Setup calls are only valid before `finalize` and for known units
    pub(crate) fn check_setup(&self, unit: UnitId) -> Result<(), SetupError> {
        if self.finalized {
            return Err(SetupError::AlreadyFinalized);
        }
        if unit.index() >= self.units.len() {
            return Err(SetupError::UnknownUnit(unit.index()));
        }
        Ok(())
    }

    // ========================================================================
    // Setup
    // ========================================================================

    pub fn add_unit(&mut self, config: UnitConfig) -> Result<UnitId, SetupError> {
        if self.finalized {
            return Err(SetupError::AlreadyFinalized);
        }
        let id = UnitId(self.units.len());
        debug!(unit = %config.label, kind = ?config.kind, "unit added");
        self.units.push(Unit::new(id, config));
        Ok(id)
    }

    /// Register a spell on `unit`
    ///
    /// The config is validated here and every `on_spell_registered` hook of
    /// the unit gets to adjust the new spell before it is stored.
    pub fn register_spell(&mut self, unit: UnitId, config: SpellConfig) -> Result<SpellId, SetupError> {
        self.check_setup(unit)?;
        config.validate()?;
        if config.cost > 0.0 && self.units[unit.index()].resource.is_none() {
            return Err(SetupError::MissingResource(config.label));
        }
        if let Some(shared) = config.shared_cooldown {
            if shared.timer.unit != unit || shared.timer.index >= self.units[unit.index()].timers.len() {
                return Err(SetupError::ForeignHandle);
            }
        }

        let cooldown_timer = match config.cooldown {
            Some(_) => Some(self.new_timer(unit)?),
            None => None,
        };
        let owner = &mut self.units[unit.index()];
        let id = SpellId {
            unit,
            index: owner.spells.len(),
        };
        let mut spell = Spell::new(id, config, &self.constants, cooldown_timer);
        for hook in owner.hooks.spell_registered.clone() {
            hook(&mut spell);
        }
        debug!(unit = %owner.label(), spell = %spell.label(), "spell registered");
        owner.spells.push(spell);
        Ok(id)
    }

    /// A cooldown timer that several spells can share
    pub fn new_timer(&mut self, unit: UnitId) -> Result<TimerId, SetupError> {
        self.check_setup(unit)?;
        let timers = &mut self.units[unit.index()].timers;
        timers.push(Timer::default());
        Ok(TimerId {
            unit,
            index: timers.len() - 1,
        })
    }

    pub fn add_stat_dependency(
        &mut self,
        unit: UnitId,
        source: Stat,
        derived: Stat,
        relation: StatRelation,
        enabled: bool,
    ) -> Result<DependencyId, SetupError> {
        self.check_setup(unit)?;
        let index = self.units[unit.index()]
            .stats
            .add_dependency(source, derived, relation, enabled)?;
        Ok(DependencyId { unit, index })
    }

    pub fn add_bonus_stat(&mut self, unit: UnitId, stat: Stat, amount: f64) -> Result<(), SetupError> {
        self.check_setup(unit)?;
        self.units[unit.index()].stats.add_bonus(stat, amount);
        Ok(())
    }

    /// Mutable pseudo-stats. Values set before `finalize` become the
    /// start-of-iteration state.
    pub fn pseudo_stats_mut(&mut self, unit: UnitId) -> &mut PseudoStats {
        &mut self.units[unit.index()].pseudo
    }

    pub fn pseudo_stats(&self, unit: UnitId) -> &PseudoStats {
        &self.units[unit.index()].pseudo
    }

    // ========================================================================
    // Hook registration
    // ========================================================================

    /// Runs for every spell of the unit, including ones already registered
    pub fn on_spell_registered<F>(&mut self, unit: UnitId, hook: F) -> Result<(), SetupError>
    where
        F: Fn(&mut Spell) + 'static,
    {
        self.check_setup(unit)?;
        let hook: Rc<dyn Fn(&mut Spell)> = Rc::new(hook);
        let owner = &mut self.units[unit.index()];
        for spell in &mut owner.spells {
            hook(spell);
        }
        owner.hooks.spell_registered.push(hook);
        Ok(())
    }

    pub fn on_cast_complete<F>(&mut self, unit: UnitId, hook: F) -> Result<(), SetupError>
    where
        F: Fn(&mut Simulation, SpellId) + 'static,
    {
        self.check_setup(unit)?;
        self.units[unit.index()].hooks.cast_complete.push(Rc::new(hook));
        Ok(())
    }

    /// Register a unit-level hook for one side of landed results
    pub fn on_result<F>(&mut self, unit: UnitId, event: ResultEvent, hook: F) -> Result<(), SetupError>
    where
        F: Fn(&mut Simulation, &SpellResult) + 'static,
    {
        self.check_setup(unit)?;
        let hook: SpellResultHook = Rc::new(hook);
        self.units[unit.index()].hooks.add_result_hook(event, hook);
        Ok(())
    }

    pub fn on_spell_hit_dealt<F>(&mut self, unit: UnitId, hook: F) -> Result<(), SetupError>
    where
        F: Fn(&mut Simulation, &SpellResult) + 'static,
    {
        self.on_result(unit, ResultEvent::SpellHitDealt, hook)
    }

    pub fn on_spell_hit_taken<F>(&mut self, unit: UnitId, hook: F) -> Result<(), SetupError>
    where
        F: Fn(&mut Simulation, &SpellResult) + 'static,
    {
        self.on_result(unit, ResultEvent::SpellHitTaken, hook)
    }

    pub fn on_periodic_damage_dealt<F>(&mut self, unit: UnitId, hook: F) -> Result<(), SetupError>
    where
        F: Fn(&mut Simulation, &SpellResult) + 'static,
    {
        self.on_result(unit, ResultEvent::PeriodicDamageDealt, hook)
    }

    pub fn on_periodic_damage_taken<F>(&mut self, unit: UnitId, hook: F) -> Result<(), SetupError>
    where
        F: Fn(&mut Simulation, &SpellResult) + 'static,
    {
        self.on_result(unit, ResultEvent::PeriodicDamageTaken, hook)
    }

    pub fn on_heal_dealt<F>(&mut self, unit: UnitId, hook: F) -> Result<(), SetupError>
    where
        F: Fn(&mut Simulation, &SpellResult) + 'static,
    {
        self.on_result(unit, ResultEvent::HealDealt, hook)
    }

    pub fn on_heal_taken<F>(&mut self, unit: UnitId, hook: F) -> Result<(), SetupError>
    where
        F: Fn(&mut Simulation, &SpellResult) + 'static,
    {
        self.on_result(unit, ResultEvent::HealTaken, hook)
    }

    pub fn on_periodic_heal_dealt<F>(&mut self, unit: UnitId, hook: F) -> Result<(), SetupError>
    where
        F: Fn(&mut Simulation, &SpellResult) + 'static,
    {
        self.on_result(unit, ResultEvent::PeriodicHealDealt, hook)
    }

    pub fn on_periodic_heal_taken<F>(&mut self, unit: UnitId, hook: F) -> Result<(), SetupError>
    where
        F: Fn(&mut Simulation, &SpellResult) + 'static,
    {
        self.on_result(unit, ResultEvent::PeriodicHealTaken, hook)
    }

    /// The unit's rotation, offered every decision point after the
    /// major-cooldown arbiter
    pub fn set_rotation<F>(&mut self, unit: UnitId, rotation: F) -> Result<(), SetupError>
    where
        F: Fn(&mut Simulation, UnitId) + 'static,
    {
        self.check_setup(unit)?;
        self.units[unit.index()].rotation = Some(Rc::new(rotation));
        Ok(())
    }

    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.trace = Some(sink);
    }

    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.trace.take()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Freeze setup: build attack tables, size per-target state and snapshot
    /// the start-of-iteration state
    pub fn finalize(&mut self) -> Result<(), SetupError> {
        if self.finalized {
            return Err(SetupError::AlreadyFinalized);
        }
        if !self.units.iter().any(|u| u.kind() == UnitKind::Enemy) {
            return Err(SetupError::NoEnemies);
        }

        let count = self.units.len();
        let levels: Vec<u32> = self.units.iter().map(Unit::level).collect();
        for unit in &mut self.units {
            let attacker = unit.id;
            unit.attack_tables = (0..count)
                .map(|d| {
                    AttackTable::new(
                        &self.constants,
                        attacker,
                        levels[attacker.index()],
                        UnitId(d),
                        levels[d],
                    )
                })
                .collect();
            unit.initial_pseudo = unit.pseudo.clone();
            for spell in &mut unit.spells {
                spell.finalize(count);
            }
            // Stable: registration order survives within a tier
            unit.major_cooldowns.sort_by(|a, b| b.tier.cmp(&a.tier));
        }

        self.finalized = true;
        debug!(units = count, "simulation finalized");
        self.reset(0)
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Restore the start-of-iteration state and reseed
    ///
    /// No aura or spell callbacks run for the restore itself; start auras
    /// are then activated normally and every driven unit gets a decision
    /// point at time zero.
    pub fn reset(&mut self, seed: u64) -> Result<(), SetupError> {
        if !self.finalized {
            return Err(SetupError::NotFinalized);
        }
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.scheduler.clear();
        self.results.clear();
        self.encounter.reset(&mut self.rng);
        self.units.iter_mut().for_each(Unit::reset);

        self.activate_start_auras();
        self.start_regen();
        let ids: Vec<UnitId> = self.units.iter().map(Unit::id).collect();
        for id in ids {
            self.request_decision(id, Duration::ZERO);
        }
        trace!(seed, duration = ?self.encounter.duration(), "iteration reset");
        Ok(())
    }

    /// Run the current iteration to completion
    pub fn run(&mut self) -> Result<IterationMetrics, SetupError> {
        if !self.finalized {
            return Err(SetupError::NotFinalized);
        }
        let duration = self.encounter.duration();
        while let Some(next) = self.scheduler.next_time() {
            if next >= duration || self.encounter.is_complete() {
                break;
            }
            advance(self);
        }
        let end = if self.encounter.is_complete() {
            self.now()
        } else {
            duration
        };
        debug!(
            seed = self.seed,
            end = ?end,
            damage = self.encounter.damage_taken(),
            "iteration complete"
        );
        Ok(self.collect_metrics(end))
    }

    /// `reset(seed)` followed by `run()`
    pub fn run_iteration(&mut self, seed: u64) -> Result<IterationMetrics, SetupError> {
        self.reset(seed)?;
        self.run()
    }

    fn collect_metrics(&self, end: Duration) -> IterationMetrics {
        let units = self
            .units
            .iter()
            .map(|unit| UnitMetrics {
                label: unit.label().to_string(),
                kind: unit.kind(),
                spells: unit
                    .spells
                    .iter()
                    .map(|s| SpellMetrics {
                        label: s.label().to_string(),
                        school: s.school(),
                        casts: s.casts,
                        targets: s.targets.clone(),
                    })
                    .collect(),
                auras: unit
                    .auras
                    .iter()
                    .map(|a| AuraMetrics {
                        label: a.label().to_string(),
                        uptime_secs: a.uptime_at(end).as_secs_f64(),
                        activations: a.state().activations,
                        refreshes: a.state().refreshes,
                    })
                    .collect(),
                resource: unit.resource.as_ref().map(|r| r.metrics().clone()),
            })
            .collect();
        IterationMetrics {
            seed: self.seed,
            duration_secs: end.as_secs_f64(),
            encounter_damage: self.encounter.damage_taken(),
            units,
        }
    }

    fn start_regen(&mut self) {
        let regens: Vec<(UnitId, Duration)> = self
            .units
            .iter()
            .filter_map(|u| {
                let interval = u.resource.as_ref()?.regen().interval()?;
                Some((u.id, interval))
            })
            .collect();
        for (unit, interval) in regens {
            schedule_periodic(
                self,
                interval,
                None,
                false,
                Rc::new(move |sim: &mut Simulation, _| sim.regen_tick(unit)),
            );
        }
    }

    fn regen_tick(&mut self, unit: UnitId) {
        let now = self.now();
        let owner = &mut self.units[unit.index()];
        let spirit = owner.stat(Stat::Spirit);
        let mp5 = owner.stat(Stat::Mp5);
        let Some(pool) = owner.resource.as_mut() else {
            return;
        };
        let amount = pool.regen().tick_amount(spirit, mp5);
        let gained = pool.gain(amount, REGEN_SOURCE);
        // A unit idling on resource gets to reconsider
        if gained > 0.0 && !owner.is_hardcasting(now) && owner.gcd.is_ready(now) {
            self.request_decision(unit, now);
        }
    }

    // ========================================================================
    // Runtime access
    // ========================================================================

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn constants(&self) -> &SimConstants {
        &self.constants
    }

    pub fn encounter(&self) -> &Encounter {
        &self.encounter
    }

    /// The iteration's RNG stream, for collaborator procs
    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    pub fn unit(&self, id: UnitId) -> &Unit {
        &self.units[id.index()]
    }

    pub fn unit_mut(&mut self, id: UnitId) -> &mut Unit {
        &mut self.units[id.index()]
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn spell(&self, id: SpellId) -> &Spell {
        &self.units[id.unit.index()].spells[id.index]
    }

    pub fn spell_mut(&mut self, id: SpellId) -> &mut Spell {
        &mut self.units[id.unit.index()].spells[id.index]
    }

    pub fn spell_by_label(&self, unit: UnitId, label: &str) -> Option<SpellId> {
        self.units
            .get(unit.index())?
            .spells
            .iter()
            .find(|s| s.label() == label)
            .map(Spell::id)
    }

    pub fn stat(&self, unit: UnitId, stat: Stat) -> f64 {
        self.units[unit.index()].stat(stat)
    }

    pub fn enable_dependency(&mut self, id: DependencyId) {
        if self.units[id.unit.index()].stats.set_enabled(id.index, true) {
            trace!(unit = id.unit.index(), dependency = id.index, "dependency enabled");
        }
    }

    pub fn disable_dependency(&mut self, id: DependencyId) {
        if self.units[id.unit.index()].stats.set_enabled(id.index, false) {
            trace!(unit = id.unit.index(), dependency = id.index, "dependency disabled");
        }
    }

    pub fn timer(&self, id: TimerId) -> &Timer {
        &self.units[id.unit.index()].timers[id.index]
    }

    pub fn is_timer_ready(&self, id: TimerId) -> bool {
        self.timer(id).is_ready(self.now())
    }

    pub fn current_resource(&self, unit: UnitId) -> f64 {
        self.units[unit.index()]
            .resource
            .as_ref()
            .map_or(0.0, |r| r.current())
    }

    pub fn max_resource(&self, unit: UnitId) -> f64 {
        self.units[unit.index()]
            .resource
            .as_ref()
            .map_or(0.0, |r| r.max())
    }

    /// Returns the amount actually gained after the cap
    pub fn add_resource(&mut self, unit: UnitId, amount: f64, source: &str) -> f64 {
        self.units[unit.index()]
            .resource
            .as_mut()
            .map_or(0.0, |r| r.gain(amount, source))
    }

    /// All or nothing
    pub fn spend_resource(&mut self, unit: UnitId, amount: f64, source: &str) -> bool {
        self.units[unit.index()]
            .resource
            .as_mut()
            .is_some_and(|r| r.spend(amount, source))
    }

    /// Schedule a collaborator action on the simulation clock
    pub fn schedule<F>(&mut self, at: Duration, action: F)
    where
        F: FnOnce(&mut Simulation) + 'static,
    {
        self.scheduler.schedule(at, Box::new(action));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Regen, ResourceConfig};
    use crate::spell::OutcomeRoll;
    use crate::types::{ProcMask, SpellSchool};

    fn setup() -> (Simulation, UnitId, UnitId) {
        let mut sim = Simulation::new(
            SimConstants::default(),
            EncounterConfig {
                duration: Duration::from_secs(10),
                ..Default::default()
            },
        );
        let player = sim
            .add_unit(
                UnitConfig::new("player", UnitKind::Player, 80)
                    .with_resource(ResourceConfig::energy(100.0).with_starting(0.0)),
            )
            .unwrap();
        let boss = sim
            .add_unit(UnitConfig::new("boss", UnitKind::Enemy, 83))
            .unwrap();
        (sim, player, boss)
    }

    #[test]
    fn test_finalize_requires_enemy() {
        let mut sim = Simulation::new(SimConstants::default(), EncounterConfig::default());
        sim.add_unit(UnitConfig::new("player", UnitKind::Player, 80))
            .unwrap();
        assert_eq!(sim.finalize(), Err(SetupError::NoEnemies));
    }

    #[test]
    fn test_setup_after_finalize_rejected() {
        let (mut sim, player, _) = setup();
        sim.finalize().unwrap();
        assert_eq!(
            sim.add_bonus_stat(player, Stat::Strength, 10.0),
            Err(SetupError::AlreadyFinalized)
        );
        assert_eq!(sim.new_timer(player), Err(SetupError::AlreadyFinalized));
        assert!(matches!(
            sim.add_unit(UnitConfig::new("late", UnitKind::Pet, 80)),
            Err(SetupError::AlreadyFinalized)
        ));
    }

    #[test]
    fn test_run_before_finalize_rejected() {
        let (mut sim, _, _) = setup();
        assert!(matches!(sim.run(), Err(SetupError::NotFinalized)));
        assert_eq!(sim.reset(3), Err(SetupError::NotFinalized));
    }

    #[test]
    fn test_unknown_unit_rejected() {
        let (mut sim, _, _) = setup();
        assert_eq!(
            sim.add_bonus_stat(UnitId(9), Stat::Agility, 1.0),
            Err(SetupError::UnknownUnit(9))
        );
    }

    #[test]
    fn test_cost_without_resource_rejected() {
        let (mut sim, _, boss) = setup();
        let config = SpellConfig::new("cleave", SpellSchool::Physical, ProcMask::MELEE_SPECIAL)
            .with_cost(20.0);
        assert_eq!(
            sim.register_spell(boss, config),
            Err(SetupError::MissingResource("cleave".into()))
        );
    }

    #[test]
    fn test_spell_registered_hook_applies_to_existing_spells() {
        let (mut sim, player, _) = setup();
        let early = sim
            .register_spell(
                player,
                SpellConfig::new("early", SpellSchool::Fire, ProcMask::SPELL_DAMAGE),
            )
            .unwrap();
        sim.on_spell_registered(player, |spell| spell.tunables.damage_multiplier *= 1.1)
            .unwrap();
        let late = sim
            .register_spell(
                player,
                SpellConfig::new("late", SpellSchool::Fire, ProcMask::SPELL_DAMAGE),
            )
            .unwrap();
        assert!((sim.spell(early).tunables.damage_multiplier - 1.1).abs() < 1e-9);
        assert!((sim.spell(late).tunables.damage_multiplier - 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_energy_regen_over_iteration() {
        let (mut sim, player, _) = setup();
        sim.finalize().unwrap();
        let metrics = sim.run().unwrap();
        // Ticks at 1..=9 s; the tick at 10 s is at the duration boundary
        assert!((sim.current_resource(player) - 90.0).abs() < 1e-9);
        let resource = metrics.units[0].resource.as_ref().unwrap();
        assert!((resource.total_gained() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_spirit_regen_uses_current_spirit() {
        let mut sim = Simulation::new(
            SimConstants::default(),
            EncounterConfig {
                duration: Duration::from_secs(5),
                ..Default::default()
            },
        );
        let priest = sim
            .add_unit(
                UnitConfig::new("priest", UnitKind::Player, 80)
                    .with_base_stats(crate::stats::StatVector::from_pairs([(Stat::Spirit, 100.0)]))
                    .with_resource(
                        ResourceConfig::mana(10_000.0)
                            .with_starting(0.0)
                            .with_regen(Regen::Spirit {
                                interval: Duration::from_secs(2),
                                coefficient: 0.5,
                            }),
                    ),
            )
            .unwrap();
        sim.add_unit(UnitConfig::new("boss", UnitKind::Enemy, 83))
            .unwrap();
        sim.finalize().unwrap();
        sim.run().unwrap();
        // Two ticks (2 s, 4 s) of 0.5 * 100 * 2
        assert!((sim.current_resource(priest) - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_encounter_health_ends_run_early() {
        let mut sim = Simulation::new(
            SimConstants::default(),
            EncounterConfig {
                duration: Duration::from_secs(60),
                health: Some(500.0),
                ..Default::default()
            },
        );
        let player = sim
            .add_unit(UnitConfig::new("player", UnitKind::Player, 80))
            .unwrap();
        let boss = sim
            .add_unit(UnitConfig::new("boss", UnitKind::Enemy, 80))
            .unwrap();
        let bolt = sim
            .register_spell(
                player,
                SpellConfig::new("bolt", SpellSchool::Holy, ProcMask::SPELL_DAMAGE)
                    .with_flat_amount(100.0)
                    .with_outcome(OutcomeRoll::AlwaysHit),
            )
            .unwrap();
        sim.set_rotation(player, move |sim, _| {
            sim.cast(bolt, boss);
        })
        .unwrap();
        sim.finalize().unwrap();
        let metrics = sim.run().unwrap();
        assert!(sim.encounter().is_complete());
        // Five 100-damage casts on a 1.5 s GCD: the last lands at 6 s
        assert!((metrics.duration_secs - 6.0).abs() < 1e-9);
        assert!((metrics.encounter_damage - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_reuses_instance() {
        let (mut sim, player, _) = setup();
        sim.finalize().unwrap();
        sim.run().unwrap();
        sim.reset(42).unwrap();
        assert_eq!(sim.now(), Duration::ZERO);
        assert!(sim.current_resource(player).abs() < f64::EPSILON);
        assert_eq!(sim.seed(), 42);
    }
}
