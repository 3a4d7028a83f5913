//! Spells: configuration, per-run state and the cast/resolution pipeline
//!
//! A spell is registered once against its caster with a [`SpellConfig`].
//! The configuration is a capability set: every optional behavior (cost,
//! cooldowns, a base-amount formula, a custom effect, a dot, missile travel)
//! is a field that is either present or absent, validated at registration.

mod calc;
mod cast;
mod finalize;
mod outcome;
mod result;

pub use outcome::{
    resolve_single_roll, resolve_two_stage, OutcomeEffects, OutcomeRoll, RollChances,
};
pub use result::{ResultArena, ResultHandle, SpellResult, StageValues};

use crate::config::SimConstants;
use crate::dot::{DotConfig, DotState};
use crate::error::SetupError;
use crate::metrics::TargetMetrics;
use crate::types::{ProcMask, SpellFlags, SpellId, SpellSchool, TimerId, UnitId};
use crate::Simulation;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Computes the base amount of a hit or heal
pub type BaseAmountFn = Rc<dyn Fn(&mut Simulation, SpellId, UnitId) -> f64>;
/// Replaces the default effect of a spell
pub type EffectFn = Rc<dyn Fn(&mut Simulation, SpellId, UnitId)>;

/// A cooldown timer shared between several spells
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharedCooldown {
    pub timer: TimerId,
    pub duration: Duration,
}

/// Immutable spell definition
#[derive(Clone)]
pub struct SpellConfig {
    pub label: String,
    pub school: SpellSchool,
    pub proc_mask: ProcMask,
    pub flags: SpellFlags,
    pub cost: f64,
    pub cast_time: Duration,
    /// Global cooldown armed by the cast; the engine default when `None`
    pub gcd: Option<Duration>,
    pub cooldown: Option<Duration>,
    pub shared_cooldown: Option<SharedCooldown>,
    pub base_amount: Option<BaseAmountFn>,
    pub apply_effects: Option<EffectFn>,
    pub outcome: OutcomeRoll,
    pub damage_multiplier: f64,
    /// Defaults by school and healing flag from the simulation constants
    pub crit_multiplier: Option<f64>,
    pub threat_multiplier: f64,
    pub flat_threat_bonus: f64,
    pub bonus_hit_rating: f64,
    pub bonus_crit_rating: f64,
    /// Yards per second; travel time is distance / speed
    pub missile_speed: Option<f64>,
    pub dot: Option<DotConfig>,
}

impl fmt::Debug for SpellConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpellConfig")
            .field("label", &self.label)
            .field("school", &self.school)
            .field("proc_mask", &self.proc_mask)
            .field("flags", &self.flags)
            .field("cost", &self.cost)
            .field("cast_time", &self.cast_time)
            .field("outcome", &self.outcome)
            .field("dot", &self.dot)
            .finish_non_exhaustive()
    }
}

impl SpellConfig {
    pub fn new(label: impl Into<String>, school: SpellSchool, proc_mask: ProcMask) -> Self {
        SpellConfig {
            label: label.into(),
            school,
            proc_mask,
            flags: SpellFlags::empty(),
            cost: 0.0,
            cast_time: Duration::ZERO,
            gcd: None,
            cooldown: None,
            shared_cooldown: None,
            base_amount: None,
            apply_effects: None,
            outcome: OutcomeRoll::AlwaysHit,
            damage_multiplier: 1.0,
            crit_multiplier: None,
            threat_multiplier: 1.0,
            flat_threat_bonus: 0.0,
            bonus_hit_rating: 0.0,
            bonus_crit_rating: 0.0,
            missile_speed: None,
            dot: None,
        }
    }

    pub fn with_flags(mut self, flags: SpellFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_cast_time(mut self, cast_time: Duration) -> Self {
        self.cast_time = cast_time;
        self
    }

    pub fn with_gcd(mut self, gcd: Duration) -> Self {
        self.gcd = Some(gcd);
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    pub fn with_shared_cooldown(mut self, timer: TimerId, duration: Duration) -> Self {
        self.shared_cooldown = Some(SharedCooldown { timer, duration });
        self
    }

    pub fn with_base_amount<F>(mut self, formula: F) -> Self
    where
        F: Fn(&mut Simulation, SpellId, UnitId) -> f64 + 'static,
    {
        self.base_amount = Some(Rc::new(formula));
        self
    }

    /// Constant base amount
    pub fn with_flat_amount(self, amount: f64) -> Self {
        self.with_base_amount(move |_, _, _| amount)
    }

    pub fn with_effects<F>(mut self, effects: F) -> Self
    where
        F: Fn(&mut Simulation, SpellId, UnitId) + 'static,
    {
        self.apply_effects = Some(Rc::new(effects));
        self
    }

    pub fn with_outcome(mut self, outcome: OutcomeRoll) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn with_damage_multiplier(mut self, multiplier: f64) -> Self {
        self.damage_multiplier = multiplier;
        self
    }

    pub fn with_crit_multiplier(mut self, multiplier: f64) -> Self {
        self.crit_multiplier = Some(multiplier);
        self
    }

    pub fn with_threat(mut self, multiplier: f64, flat_bonus: f64) -> Self {
        self.threat_multiplier = multiplier;
        self.flat_threat_bonus = flat_bonus;
        self
    }

    pub fn with_bonus_ratings(mut self, hit: f64, crit: f64) -> Self {
        self.bonus_hit_rating = hit;
        self.bonus_crit_rating = crit;
        self
    }

    pub fn with_missile_speed(mut self, speed: f64) -> Self {
        self.missile_speed = Some(speed);
        self
    }

    pub fn with_dot(mut self, dot: DotConfig) -> Self {
        self.dot = Some(dot);
        self
    }

    pub fn is_healing(&self) -> bool {
        self.flags.contains(SpellFlags::HEALING)
    }

    /// Setup-time contract checks that do not need the owning unit
    pub(crate) fn validate(&self) -> Result<(), SetupError> {
        if self.proc_mask.is_empty() {
            return Err(SetupError::MissingClassification(self.label.clone()));
        }
        if self.proc_mask.contains(ProcMask::EMPTY) && self.proc_mask != ProcMask::EMPTY {
            return Err(SetupError::ExclusiveEmptyClassification(self.label.clone()));
        }
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(SetupError::InvalidCost {
                label: self.label.clone(),
                cost: self.cost,
            });
        }
        if let Some(speed) = self.missile_speed {
            if !speed.is_finite() || speed <= 0.0 {
                return Err(SetupError::InvalidMissileSpeed {
                    label: self.label.clone(),
                    speed,
                });
            }
        }
        if let Some(dot) = &self.dot {
            if dot.num_ticks == 0 || dot.tick_period.is_zero() {
                return Err(SetupError::InvalidDot(self.label.clone()));
            }
        }
        Ok(())
    }
}

/// Values registration hooks and auras may adjust. Restored on reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpellTunables {
    pub cost: f64,
    pub damage_multiplier: f64,
    pub crit_multiplier: f64,
    pub threat_multiplier: f64,
    pub flat_threat_bonus: f64,
    pub bonus_hit_rating: f64,
    pub bonus_crit_rating: f64,
}

/// A registered spell with its per-run state
pub struct Spell {
    id: SpellId,
    config: SpellConfig,
    pub tunables: SpellTunables,
    initial_tunables: SpellTunables,
    pub(crate) cooldown_timer: Option<TimerId>,
    pub(crate) casts: u32,
    pub(crate) targets: Vec<TargetMetrics>,
    pub(crate) dots: Vec<DotState>,
}

impl fmt::Debug for Spell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spell")
            .field("id", &self.id)
            .field("label", &self.config.label)
            .field("tunables", &self.tunables)
            .field("casts", &self.casts)
            .finish_non_exhaustive()
    }
}

impl Spell {
    pub(crate) fn new(
        id: SpellId,
        config: SpellConfig,
        constants: &SimConstants,
        cooldown_timer: Option<TimerId>,
    ) -> Self {
        let crit_multiplier = config.crit_multiplier.unwrap_or(if config.is_healing() {
            constants.crit.healing_multiplier
        } else if config.school.is_physical() {
            constants.crit.physical_multiplier
        } else {
            constants.crit.spell_multiplier
        });
        let tunables = SpellTunables {
            cost: config.cost,
            damage_multiplier: config.damage_multiplier,
            crit_multiplier,
            threat_multiplier: config.threat_multiplier,
            flat_threat_bonus: config.flat_threat_bonus,
            bonus_hit_rating: config.bonus_hit_rating,
            bonus_crit_rating: config.bonus_crit_rating,
        };
        Spell {
            id,
            config,
            tunables,
            initial_tunables: tunables,
            cooldown_timer,
            casts: 0,
            targets: Vec::new(),
            dots: Vec::new(),
        }
    }

    pub fn id(&self) -> SpellId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.config.label
    }

    pub fn config(&self) -> &SpellConfig {
        &self.config
    }

    pub fn school(&self) -> SpellSchool {
        self.config.school
    }

    pub fn flags(&self) -> SpellFlags {
        self.config.flags
    }

    pub fn proc_mask(&self) -> ProcMask {
        self.config.proc_mask
    }

    pub fn casts(&self) -> u32 {
        self.casts
    }

    pub fn target_metrics(&self, target: UnitId) -> Option<&TargetMetrics> {
        self.targets.get(target.index())
    }

    /// Size per-target state for the final unit count and freeze tunables
    pub(crate) fn finalize(&mut self, unit_count: usize) {
        self.targets = vec![TargetMetrics::default(); unit_count];
        self.dots = vec![DotState::default(); unit_count];
        self.initial_tunables = self.tunables;
    }

    pub(crate) fn reset(&mut self) {
        self.tunables = self.initial_tunables;
        self.casts = 0;
        self.targets.iter_mut().for_each(|t| *t = TargetMetrics::default());
        self.dots.iter_mut().for_each(|d| *d = DotState::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SpellConfig {
        SpellConfig::new("shadow_bolt", SpellSchool::Shadow, ProcMask::SPELL_DAMAGE)
    }

    #[test]
    fn test_validate_classification() {
        assert!(config().validate().is_ok());

        let missing = SpellConfig::new("x", SpellSchool::Fire, ProcMask::empty());
        assert_eq!(
            missing.validate(),
            Err(SetupError::MissingClassification("x".into()))
        );

        let mixed = SpellConfig::new("y", SpellSchool::Fire, ProcMask::EMPTY | ProcMask::SPELL_DAMAGE);
        assert_eq!(
            mixed.validate(),
            Err(SetupError::ExclusiveEmptyClassification("y".into()))
        );

        let empty_only = SpellConfig::new("z", SpellSchool::Fire, ProcMask::EMPTY);
        assert!(empty_only.validate().is_ok());
    }

    #[test]
    fn test_validate_cost() {
        let err = config().with_cost(-5.0).validate().unwrap_err();
        assert!(matches!(err, SetupError::InvalidCost { .. }));
        assert!(config().with_cost(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_validate_missile_speed() {
        for speed in [0.0, -20.0, f64::NAN, f64::INFINITY] {
            let err = config().with_missile_speed(speed).validate().unwrap_err();
            assert!(matches!(err, SetupError::InvalidMissileSpeed { .. }));
        }
        assert!(config().with_missile_speed(24.0).validate().is_ok());
    }

    #[test]
    fn test_default_crit_multiplier_by_school() {
        let constants = SimConstants::default();
        let id = SpellId {
            unit: UnitId(0),
            index: 0,
        };
        let spell = Spell::new(id, config(), &constants, None);
        assert!((spell.tunables.crit_multiplier - 1.5).abs() < f64::EPSILON);

        let melee = SpellConfig::new("strike", SpellSchool::Physical, ProcMask::MELEE_MH_SPECIAL);
        let spell = Spell::new(id, melee, &constants, None);
        assert!((spell.tunables.crit_multiplier - 2.0).abs() < f64::EPSILON);

        let custom = config().with_crit_multiplier(2.25);
        let spell = Spell::new(id, custom, &constants, None);
        assert!((spell.tunables.crit_multiplier - 2.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset_restores_tunables() {
        let constants = SimConstants::default();
        let id = SpellId {
            unit: UnitId(0),
            index: 0,
        };
        let mut spell = Spell::new(id, config().with_cost(100.0), &constants, None);
        spell.tunables.damage_multiplier *= 1.2;
        spell.finalize(2);
        spell.tunables.cost = 0.0;
        spell.casts = 3;
        spell.reset();
        assert!((spell.tunables.cost - 100.0).abs() < f64::EPSILON);
        assert!((spell.tunables.damage_multiplier - 1.2).abs() < 1e-12);
        assert_eq!(spell.casts(), 0);
        assert_eq!(spell.targets.len(), 2);
    }
}
