//! Encounter termination: fixed duration and optional health pool

use crate::config::duration_secs;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Encounter length and health settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterConfig {
    /// Nominal fight length
    #[serde(with = "duration_secs")]
    pub duration: Duration,
    /// Each iteration's length is drawn uniformly from duration ± variation
    #[serde(default, with = "duration_secs")]
    pub duration_variation: Duration,
    /// Total damage the enemies can take before the fight ends
    #[serde(default)]
    pub health: Option<f64>,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        EncounterConfig {
            duration: Duration::from_secs(180),
            duration_variation: Duration::ZERO,
            health: None,
        }
    }
}

/// Per-iteration encounter state
#[derive(Debug, Clone)]
pub struct Encounter {
    config: EncounterConfig,
    duration: Duration,
    damage_taken: f64,
}

impl Encounter {
    pub fn new(config: EncounterConfig) -> Self {
        Encounter {
            duration: config.duration,
            config,
            damage_taken: 0.0,
        }
    }

    pub fn config(&self) -> &EncounterConfig {
        &self.config
    }

    /// Length of the current iteration
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn damage_taken(&self) -> f64 {
        self.damage_taken
    }

    pub(crate) fn record_damage(&mut self, amount: f64) {
        self.damage_taken += amount;
    }

    /// Health exhausted
    pub fn is_complete(&self) -> bool {
        self.config
            .health
            .is_some_and(|health| self.damage_taken >= health)
    }

    /// Remaining health fraction, or remaining time fraction without a pool
    pub fn remaining_fraction(&self, now: Duration) -> f64 {
        match self.config.health {
            Some(health) if health > 0.0 => (1.0 - self.damage_taken / health).max(0.0),
            _ if self.duration.is_zero() => 0.0,
            _ => (1.0 - now.as_secs_f64() / self.duration.as_secs_f64()).max(0.0),
        }
    }

    /// Start a new iteration, drawing its length
    pub(crate) fn reset<R: Rng>(&mut self, rng: &mut R) {
        self.damage_taken = 0.0;
        let variation = self.config.duration_variation.as_secs_f64();
        self.duration = if variation > 0.0 {
            let base = self.config.duration.as_secs_f64();
            let offset = rng.gen_range(-variation..=variation);
            Duration::from_secs_f64((base + offset).max(0.0))
        } else {
            self.config.duration
        };
    }
}
