//! Outcome rolls
//!
//! Single-draw rolls lay their bands out in a fixed order on [0, 1):
//!
//! ```text
//! | miss | dodge | parry | glance | block | crit |        hit        |
//! 0                                                                  1
//! ```
//!
//! A band that does not apply to the roll kind has width zero. Whatever is
//! left after the last band is Hit.

use crate::types::Outcome;
use serde::{Deserialize, Serialize};

/// How a spell decides its outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeRoll {
    /// White melee swing: miss, dodge, parry, glance, block, crit
    MeleeWhite,
    /// Melee special attack: as white but never glances
    MeleeSpecial,
    /// Miss, block, crit
    Ranged,
    /// Spell hit roll, then a separate crit roll
    MagicHitAndCrit,
    /// Spell hit roll only
    MagicHit,
    /// Crit roll only
    MagicCrit,
    /// Crit roll using healing crit multipliers
    HealingCrit,
    /// Periodic tick that always hits
    Tick,
    /// Periodic tick that crits with the chance frozen at application
    SnapshotCrit,
    #[default]
    AlwaysHit,
}

/// Band widths for one roll. Negative widths count as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RollChances {
    pub miss: f64,
    pub dodge: f64,
    pub parry: f64,
    pub glance: f64,
    pub block: f64,
    pub crit: f64,
}

fn width(chance: f64) -> f64 {
    if chance.is_nan() {
        0.0
    } else {
        chance.max(0.0)
    }
}

/// Map one uniform draw in [0, 1) onto the cumulative bands
pub fn resolve_single_roll(chances: &RollChances, roll: f64) -> Outcome {
    let bands = [
        (chances.miss, Outcome::Miss),
        (chances.dodge, Outcome::Dodge),
        (chances.parry, Outcome::Parry),
        (chances.glance, Outcome::Glance),
        (chances.block, Outcome::Block),
        (chances.crit, Outcome::Crit),
    ];
    let mut cumulative = 0.0;
    for (chance, outcome) in bands {
        cumulative += width(chance);
        if roll < cumulative {
            return outcome;
        }
    }
    Outcome::Hit
}

/// Spell hit roll followed by an independent crit roll
pub fn resolve_two_stage(miss: f64, crit: f64, hit_roll: f64, crit_roll: f64) -> Outcome {
    if hit_roll < width(miss) {
        Outcome::Miss
    } else if crit_roll < width(crit) {
        Outcome::Crit
    } else {
        Outcome::Hit
    }
}

/// Scale an amount by its outcome
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeEffects {
    pub crit_multiplier: f64,
    pub block_value: f64,
    pub glance_multiplier: f64,
}

impl OutcomeEffects {
    pub fn apply(&self, outcome: Outcome, amount: f64) -> f64 {
        let scaled = match outcome {
            Outcome::Miss | Outcome::Dodge | Outcome::Parry => 0.0,
            Outcome::Crit => amount * self.crit_multiplier,
            Outcome::Block => amount - self.block_value,
            Outcome::Glance => amount * self.glance_multiplier,
            Outcome::Hit | Outcome::Empty => amount,
        };
        scaled.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn white() -> RollChances {
        RollChances {
            miss: 0.08,
            dodge: 0.065,
            parry: 0.0,
            glance: 0.24,
            block: 0.0,
            crit: 0.25,
        }
    }

    #[test]
    fn test_band_boundaries() {
        let c = white();
        assert_eq!(resolve_single_roll(&c, 0.0), Outcome::Miss);
        assert_eq!(resolve_single_roll(&c, 0.0799), Outcome::Miss);
        assert_eq!(resolve_single_roll(&c, 0.08), Outcome::Dodge);
        assert_eq!(resolve_single_roll(&c, 0.15), Outcome::Glance);
        assert_eq!(resolve_single_roll(&c, 0.4), Outcome::Crit);
        assert_eq!(resolve_single_roll(&c, 0.64), Outcome::Hit);
        assert_eq!(resolve_single_roll(&c, 0.9999), Outcome::Hit);
    }

    #[test]
    fn test_negative_band_is_empty() {
        let c = RollChances {
            miss: -0.05,
            crit: 0.5,
            ..Default::default()
        };
        assert_eq!(resolve_single_roll(&c, 0.0), Outcome::Crit);
        assert_eq!(resolve_single_roll(&c, 0.5), Outcome::Hit);
    }

    #[test]
    fn test_fixed_crit_rate_converges() {
        let c = RollChances {
            crit: 0.2,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let crits = (0..10_000)
            .filter(|_| resolve_single_roll(&c, rng.gen::<f64>()) == Outcome::Crit)
            .count();
        let rate = crits as f64 / 10_000.0;
        assert!((rate - 0.2).abs() < 0.02, "crit rate {rate}");
    }

    #[test]
    fn test_two_stage() {
        assert_eq!(resolve_two_stage(0.17, 0.3, 0.1, 0.0), Outcome::Miss);
        assert_eq!(resolve_two_stage(0.17, 0.3, 0.5, 0.2), Outcome::Crit);
        assert_eq!(resolve_two_stage(0.17, 0.3, 0.5, 0.4), Outcome::Hit);
    }

    #[test]
    fn test_outcome_effects() {
        let fx = OutcomeEffects {
            crit_multiplier: 2.0,
            block_value: 30.0,
            glance_multiplier: 0.75,
        };
        assert!((fx.apply(Outcome::Crit, 100.0) - 200.0).abs() < f64::EPSILON);
        assert!((fx.apply(Outcome::Block, 100.0) - 70.0).abs() < f64::EPSILON);
        assert!(fx.apply(Outcome::Block, 20.0).abs() < f64::EPSILON);
        assert!((fx.apply(Outcome::Glance, 100.0) - 75.0).abs() < f64::EPSILON);
        assert!(fx.apply(Outcome::Dodge, 100.0).abs() < f64::EPSILON);
        assert!((fx.apply(Outcome::Hit, 100.0) - 100.0).abs() < f64::EPSILON);
    }

    fn band_order(outcome: Outcome) -> usize {
        match outcome {
            Outcome::Miss => 0,
            Outcome::Dodge => 1,
            Outcome::Parry => 2,
            Outcome::Glance => 3,
            Outcome::Block => 4,
            Outcome::Crit => 5,
            Outcome::Hit | Outcome::Empty => 6,
        }
    }

    proptest! {
        #[test]
        fn prop_bands_partition_unit_interval(
            miss in -0.2f64..0.5,
            dodge in -0.2f64..0.5,
            parry in -0.2f64..0.5,
            glance in -0.2f64..0.5,
            block in -0.2f64..0.5,
            crit in -0.2f64..0.5,
            mut rolls in prop::collection::vec(0.0f64..1.0, 1..32),
        ) {
            let c = RollChances { miss, dodge, parry, glance, block, crit };
            rolls.sort_by(|a, b| a.total_cmp(b));
            let mut last = 0;
            for roll in rolls {
                let outcome = resolve_single_roll(&c, roll);
                prop_assert_ne!(outcome, Outcome::Empty);
                let order = band_order(outcome);
                // monotone in the draw: bands are contiguous and ordered
                prop_assert!(order >= last);
                last = order;
                // a band with no width never wins
                let w = match outcome {
                    Outcome::Miss => miss,
                    Outcome::Dodge => dodge,
                    Outcome::Parry => parry,
                    Outcome::Glance => glance,
                    Outcome::Block => block,
                    Outcome::Crit => crit,
                    _ => 1.0,
                };
                prop_assert!(w > 0.0);
            }
        }
    }
}
