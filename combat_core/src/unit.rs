//! Units: players, pets and enemies taking part in an encounter

use crate::attack_table::AttackTable;
use crate::aura::Aura;
use crate::config::SimConstants;
use crate::cooldown::MajorCooldown;
use crate::hooks::{RotationHook, UnitHooks};
use crate::resource::{ResourceConfig, ResourcePool};
use crate::spell::Spell;
use crate::stats::{PseudoStats, Stat, StatSheet, StatVector};
use crate::timer::Timer;
use crate::types::{SpellId, UnitId, UnitKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Floor for the cast speed multiplier, so cast times stay finite
pub const MIN_CAST_SPEED: f64 = 0.01;

/// Everything needed to add a unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitConfig {
    pub label: String,
    #[serde(default)]
    pub kind: UnitKind,
    pub level: u32,
    /// Race/class base stats plus gear, before any dependency edges
    #[serde(skip)]
    pub base_stats: StatVector,
    #[serde(default)]
    pub resource: Option<ResourceConfig>,
    #[serde(default)]
    pub max_health: Option<f64>,
    /// Yards to the primary target; drives missile travel time
    #[serde(default)]
    pub distance_from_target: f64,
}

impl UnitConfig {
    pub fn new(label: impl Into<String>, kind: UnitKind, level: u32) -> Self {
        UnitConfig {
            label: label.into(),
            kind,
            level,
            base_stats: StatVector::new(),
            resource: None,
            max_health: None,
            distance_from_target: 0.0,
        }
    }

    pub fn with_base_stats(mut self, stats: StatVector) -> Self {
        self.base_stats = stats;
        self
    }

    pub fn with_resource(mut self, resource: ResourceConfig) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn with_health(mut self, max_health: f64) -> Self {
        self.max_health = Some(max_health);
        self
    }

    pub fn with_distance(mut self, yards: f64) -> Self {
        self.distance_from_target = yards;
        self
    }
}

/// Current and maximum health
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthBar {
    pub max: f64,
    pub current: f64,
}

impl HealthBar {
    fn new(max: f64) -> Self {
        let max = max.max(0.0);
        HealthBar { max, current: max }
    }

    pub(crate) fn damage(&mut self, amount: f64) {
        self.current = (self.current - amount.max(0.0)).max(0.0);
    }

    pub(crate) fn heal(&mut self, amount: f64) {
        self.current = (self.current + amount.max(0.0)).min(self.max);
    }

    pub fn fraction(&self) -> f64 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }
}

/// A cast in progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hardcast {
    pub spell: SpellId,
    pub ends_at: Duration,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DecisionState {
    pub(crate) pending: Option<Duration>,
    pub(crate) generation: u64,
}

/// One participant in the simulation
pub struct Unit {
    pub(crate) id: UnitId,
    label: String,
    kind: UnitKind,
    level: u32,
    pub distance_from_target: f64,
    pub(crate) stats: StatSheet,
    pub(crate) pseudo: PseudoStats,
    pub(crate) initial_pseudo: PseudoStats,
    pub(crate) resource: Option<ResourcePool>,
    pub(crate) health: Option<HealthBar>,
    pub(crate) spells: Vec<Spell>,
    pub(crate) auras: Vec<Aura>,
    pub(crate) aura_labels: HashMap<String, usize>,
    pub(crate) timers: Vec<Timer>,
    pub(crate) gcd: Timer,
    pub(crate) hardcast: Option<Hardcast>,
    pub(crate) attack_tables: Vec<AttackTable>,
    pub(crate) hooks: UnitHooks,
    pub(crate) rotation: Option<RotationHook>,
    pub(crate) major_cooldowns: Vec<MajorCooldown>,
    pub(crate) decision: DecisionState,
}

impl Unit {
    pub(crate) fn new(id: UnitId, config: UnitConfig) -> Self {
        Unit {
            id,
            label: config.label,
            kind: config.kind,
            level: config.level,
            distance_from_target: config.distance_from_target,
            stats: StatSheet::new(config.base_stats),
            pseudo: PseudoStats::default(),
            initial_pseudo: PseudoStats::default(),
            resource: config.resource.map(ResourcePool::new),
            health: config.max_health.map(HealthBar::new),
            spells: Vec::new(),
            auras: Vec::new(),
            aura_labels: HashMap::new(),
            timers: Vec::new(),
            gcd: Timer::default(),
            hardcast: None,
            attack_tables: Vec::new(),
            hooks: UnitHooks::default(),
            rotation: None,
            major_cooldowns: Vec::new(),
            decision: DecisionState::default(),
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn stat(&self, stat: Stat) -> f64 {
        self.stats.get(stat)
    }

    pub fn stats(&self) -> &StatSheet {
        &self.stats
    }

    pub fn pseudo_stats(&self) -> &PseudoStats {
        &self.pseudo
    }

    pub fn resource(&self) -> Option<&ResourcePool> {
        self.resource.as_ref()
    }

    pub fn health(&self) -> Option<&HealthBar> {
        self.health.as_ref()
    }

    pub fn spells(&self) -> &[Spell] {
        &self.spells
    }

    pub fn auras(&self) -> &[Aura] {
        &self.auras
    }

    pub fn gcd_ready_at(&self) -> Duration {
        self.gcd.ready_at()
    }

    pub fn hardcast(&self) -> Option<Hardcast> {
        self.hardcast
    }

    pub fn is_hardcasting(&self, now: Duration) -> bool {
        self.hardcast.is_some_and(|h| h.ends_at > now)
    }

    pub fn attack_table(&self, defender: UnitId) -> Option<&AttackTable> {
        self.attack_tables.get(defender.index())
    }

    /// Multiplier applied to cast times and hasted global cooldowns, never
    /// below [`MIN_CAST_SPEED`]
    pub fn cast_speed(&self, constants: &SimConstants) -> f64 {
        let haste = self.stat(Stat::SpellHaste) / constants.ratings.haste_per_percent / 100.0;
        // f64::max also maps NaN to the floor
        (self.pseudo.cast_speed_multiplier * (1.0 + haste)).max(MIN_CAST_SPEED)
    }

    /// Whether this unit takes part in decision points
    pub(crate) fn is_driven(&self) -> bool {
        self.rotation.is_some() || !self.major_cooldowns.is_empty()
    }

    /// Restore the start-of-iteration state without invoking callbacks
    pub(crate) fn reset(&mut self) {
        self.stats.reset();
        self.pseudo = self.initial_pseudo.clone();
        if let Some(pool) = self.resource.as_mut() {
            pool.reset();
        }
        if let Some(health) = self.health.as_mut() {
            health.current = health.max;
        }
        self.spells.iter_mut().for_each(Spell::reset);
        self.auras.iter_mut().for_each(Aura::reset);
        self.timers.iter_mut().for_each(Timer::reset);
        self.gcd.reset();
        self.hardcast = None;
        self.decision = DecisionState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_bar_clamps() {
        let mut bar = HealthBar::new(100.0);
        bar.damage(30.0);
        assert!((bar.current - 70.0).abs() < f64::EPSILON);
        bar.damage(500.0);
        assert!(bar.current.abs() < f64::EPSILON);
        bar.heal(1000.0);
        assert!((bar.current - 100.0).abs() < f64::EPSILON);
        bar.damage(-10.0);
        assert!((bar.fraction() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cast_speed_from_haste_rating() {
        let constants = SimConstants::default();
        let config = UnitConfig::new("mage", UnitKind::Player, 80).with_base_stats(
            StatVector::from_pairs([(Stat::SpellHaste, constants.ratings.haste_per_percent * 10.0)]),
        );
        let mut unit = Unit::new(UnitId(0), config);
        assert!((unit.cast_speed(&constants) - 1.1).abs() < 1e-9);
        unit.pseudo.cast_speed_multiplier = 1.2;
        assert!((unit.cast_speed(&constants) - 1.32).abs() < 1e-9);
    }

    #[test]
    fn test_reset_restores_pseudo_and_resource() {
        let config = UnitConfig::new("rogue", UnitKind::Player, 80)
            .with_resource(ResourceConfig::energy(100.0))
            .with_health(1000.0);
        let mut unit = Unit::new(UnitId(0), config);
        unit.initial_pseudo.damage_dealt_multiplier = 1.05;
        unit.pseudo.damage_dealt_multiplier = 2.0;
        unit.resource.as_mut().map(|r| r.spend(60.0, "eviscerate"));
        unit.health.as_mut().map(|h| h.damage(400.0));

        unit.reset();
        assert!((unit.pseudo.damage_dealt_multiplier - 1.05).abs() < f64::EPSILON);
        assert!((unit.resource().map(|r| r.current()).unwrap_or(0.0) - 100.0).abs() < f64::EPSILON);
        assert!((unit.health().map(|h| h.current).unwrap_or(0.0) - 1000.0).abs() < f64::EPSILON);
    }
}
