//! Primary resource pool (mana, energy or rage) and its metrics

use crate::config::duration_secs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Source label used for passive regeneration
pub const REGEN_SOURCE: &str = "regen";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Mana,
    Energy,
    Rage,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Mana => write!(f, "Mana"),
            ResourceKind::Energy => write!(f, "Energy"),
            ResourceKind::Rage => write!(f, "Rage"),
        }
    }
}

/// Passive regeneration model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Regen {
    #[default]
    None,
    /// Flat amount every interval
    Fixed {
        #[serde(with = "duration_secs")]
        interval: Duration,
        amount: f64,
    },
    /// `coefficient * spirit` per second plus MP5, paid every interval
    Spirit {
        #[serde(with = "duration_secs")]
        interval: Duration,
        coefficient: f64,
    },
}

impl Regen {
    pub fn interval(&self) -> Option<Duration> {
        match *self {
            Regen::None => None,
            Regen::Fixed { interval, .. } | Regen::Spirit { interval, .. } => {
                (!interval.is_zero()).then_some(interval)
            }
        }
    }

    /// Amount restored by one regen tick
    pub fn tick_amount(&self, spirit: f64, mp5: f64) -> f64 {
        match *self {
            Regen::None => 0.0,
            Regen::Fixed { amount, .. } => amount,
            Regen::Spirit {
                interval,
                coefficient,
            } => {
                let secs = interval.as_secs_f64();
                coefficient * spirit * secs + mp5 * secs / 5.0
            }
        }
    }
}

/// Pool configuration supplied when a unit is added
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub kind: ResourceKind,
    pub max: f64,
    /// Defaults to empty for rage and full otherwise
    #[serde(default)]
    pub starting: Option<f64>,
    #[serde(default)]
    pub regen: Regen,
}

impl ResourceConfig {
    pub fn mana(max: f64) -> Self {
        ResourceConfig {
            kind: ResourceKind::Mana,
            max,
            starting: None,
            regen: Regen::None,
        }
    }

    pub fn energy(max: f64) -> Self {
        ResourceConfig {
            kind: ResourceKind::Energy,
            max,
            starting: None,
            regen: Regen::Fixed {
                interval: Duration::from_secs(1),
                amount: 10.0,
            },
        }
    }

    pub fn rage(max: f64) -> Self {
        ResourceConfig {
            kind: ResourceKind::Rage,
            max,
            starting: None,
            regen: Regen::None,
        }
    }

    pub fn with_regen(mut self, regen: Regen) -> Self {
        self.regen = regen;
        self
    }

    pub fn with_starting(mut self, starting: f64) -> Self {
        self.starting = Some(starting);
        self
    }

    fn starting_value(&self) -> f64 {
        let value = match (self.starting, self.kind) {
            (Some(value), _) => value,
            (None, ResourceKind::Rage) => 0.0,
            (None, _) => self.max,
        };
        value.clamp(0.0, self.max.max(0.0))
    }
}

/// Gains, waste and spending attributed to one source
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceMetrics {
    pub events: u32,
    pub gained: f64,
    pub wasted: f64,
    pub spent: f64,
}

/// Per-source resource accounting for one iteration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceMetrics {
    pub sources: BTreeMap<String, SourceMetrics>,
}

impl ResourceMetrics {
    fn entry(&mut self, source: &str) -> &mut SourceMetrics {
        self.sources.entry(source.to_string()).or_default()
    }

    pub fn total_gained(&self) -> f64 {
        self.sources.values().map(|m| m.gained).sum()
    }

    pub fn total_wasted(&self) -> f64 {
        self.sources.values().map(|m| m.wasted).sum()
    }

    pub fn total_spent(&self) -> f64 {
        self.sources.values().map(|m| m.spent).sum()
    }
}

/// A unit's primary resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResourcePool {
    config: ResourceConfig,
    current: f64,
    metrics: ResourceMetrics,
}

impl ResourcePool {
    pub fn new(config: ResourceConfig) -> Self {
        ResourcePool {
            current: config.starting_value(),
            config,
            metrics: ResourceMetrics::default(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.config.kind
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn max(&self) -> f64 {
        self.config.max
    }

    pub fn regen(&self) -> Regen {
        self.config.regen
    }

    pub fn metrics(&self) -> &ResourceMetrics {
        &self.metrics
    }

    pub fn can_afford(&self, amount: f64) -> bool {
        self.current >= amount
    }

    /// Deduct `amount` if affordable. Never partial.
    pub fn spend(&mut self, amount: f64, source: &str) -> bool {
        if amount < 0.0 || !self.can_afford(amount) {
            return false;
        }
        self.current -= amount;
        let entry = self.metrics.entry(source);
        entry.events += 1;
        entry.spent += amount;
        true
    }

    /// Add `amount`, clamped to max. Returns the amount actually gained.
    pub fn gain(&mut self, amount: f64, source: &str) -> f64 {
        if amount <= 0.0 {
            return 0.0;
        }
        let gained = amount.min(self.config.max - self.current).max(0.0);
        self.current += gained;
        let entry = self.metrics.entry(source);
        entry.events += 1;
        entry.gained += gained;
        entry.wasted += amount - gained;
        gained
    }

    pub fn reset(&mut self) {
        self.current = self.config.starting_value();
        self.metrics = ResourceMetrics::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_starting_values() {
        assert!((ResourcePool::new(ResourceConfig::mana(1000.0)).current() - 1000.0).abs() < f64::EPSILON);
        assert!((ResourcePool::new(ResourceConfig::energy(100.0)).current() - 100.0).abs() < f64::EPSILON);
        assert!(ResourcePool::new(ResourceConfig::rage(100.0)).current().abs() < f64::EPSILON);
        let pool = ResourcePool::new(ResourceConfig::rage(100.0).with_starting(250.0));
        assert!((pool.current() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_spend_is_atomic() {
        let mut pool = ResourcePool::new(ResourceConfig::energy(100.0).with_starting(30.0));
        assert!(!pool.spend(40.0, "sinister_strike"));
        assert!((pool.current() - 30.0).abs() < f64::EPSILON);
        assert!(pool.metrics().sources.is_empty());

        assert!(pool.spend(30.0, "sinister_strike"));
        assert!(pool.current().abs() < f64::EPSILON);
        assert!((pool.metrics().total_spent() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_gain_records_waste() {
        let mut pool = ResourcePool::new(ResourceConfig::energy(100.0).with_starting(95.0));
        let gained = pool.gain(10.0, REGEN_SOURCE);
        assert!((gained - 5.0).abs() < f64::EPSILON);
        let regen = pool.metrics().sources[REGEN_SOURCE];
        assert!((regen.gained - 5.0).abs() < f64::EPSILON);
        assert!((regen.wasted - 5.0).abs() < f64::EPSILON);
        assert_eq!(regen.events, 1);
    }

    #[test]
    fn test_spirit_regen_amount() {
        let regen = Regen::Spirit {
            interval: Duration::from_secs(2),
            coefficient: 0.5,
        };
        // 0.5 * 100 * 2 + 50 * 2 / 5
        assert!((regen.tick_amount(100.0, 50.0) - 120.0).abs() < 1e-9);
        assert_eq!(regen.interval(), Some(Duration::from_secs(2)));
        assert_eq!(Regen::None.interval(), None);
    }

    #[test]
    fn test_reset_restores_start() {
        let mut pool = ResourcePool::new(ResourceConfig::mana(500.0));
        pool.spend(200.0, "frostbolt");
        pool.reset();
        assert!((pool.current() - 500.0).abs() < f64::EPSILON);
        assert!(pool.metrics().sources.is_empty());
    }

    proptest! {
        #[test]
        fn prop_pool_never_negative_or_over_max(
            ops in prop::collection::vec((any::<bool>(), 0.0f64..200.0), 0..64)
        ) {
            let mut pool = ResourcePool::new(ResourceConfig::energy(100.0));
            for (is_spend, amount) in ops {
                let before = pool.current();
                if is_spend {
                    let ok = pool.spend(amount, "spend");
                    prop_assert_eq!(ok, before >= amount);
                    if !ok {
                        prop_assert_eq!(pool.current(), before);
                    }
                } else {
                    pool.gain(amount, "gain");
                }
                prop_assert!(pool.current() >= 0.0);
                prop_assert!(pool.current() <= pool.max());
            }
        }
    }
}
