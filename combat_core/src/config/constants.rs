//! Simulation constants configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::ConfigError;

/// Tunable simulation constants
///
/// Built once per configuration and passed into every `Simulation`, so two
/// runs with different constants can coexist in one process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConstants {
    #[serde(default)]
    pub ratings: RatingConstants,
    #[serde(default)]
    pub crit: CritConstants,
    #[serde(default)]
    pub gcd: GcdConstants,
    #[serde(default)]
    pub armor: ArmorConstants,
    #[serde(default)]
    pub resistance: ResistanceConstants,
    #[serde(default = "default_melee_miss")]
    pub melee_miss: LevelTable,
    #[serde(default = "default_spell_miss")]
    pub spell_miss: LevelTable,
    #[serde(default = "default_dodge")]
    pub dodge: LevelTable,
    #[serde(default = "default_parry")]
    pub parry: LevelTable,
    #[serde(default = "default_glance")]
    pub glance: LevelTable,
    #[serde(default = "default_block")]
    pub block: LevelTable,
    #[serde(default = "default_crit_suppression")]
    pub crit_suppression: LevelTable,
    /// Damage multiplier applied to glancing blows
    #[serde(default = "default_glance_multiplier")]
    pub glance_multiplier: f64,
}

impl SimConstants {
    /// Load constants from a TOML file
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let constants: SimConstants = super::load_toml(path)?;
        constants.validate()?;
        Ok(constants)
    }

    /// Parse constants from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let constants: SimConstants = super::parse_toml(content)?;
        constants.validate()?;
        Ok(constants)
    }

    /// Reject values that would break the pipeline's invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratings = [
            ("melee_hit_per_percent", self.ratings.melee_hit_per_percent),
            ("spell_hit_per_percent", self.ratings.spell_hit_per_percent),
            ("crit_per_percent", self.ratings.crit_per_percent),
            ("haste_per_percent", self.ratings.haste_per_percent),
            ("expertise_per_quarter_percent", self.ratings.expertise_per_quarter_percent),
            ("armor_pen_per_percent", self.ratings.armor_pen_per_percent),
            ("defense_per_percent", self.ratings.defense_per_percent),
        ];
        for (name, value) in ratings {
            if !(value > 0.0) {
                return Err(ConfigError::Validation(format!(
                    "rating conversion '{}' must be positive, got {}",
                    name, value
                )));
            }
        }

        let tables = [
            ("melee_miss", &self.melee_miss),
            ("spell_miss", &self.spell_miss),
            ("dodge", &self.dodge),
            ("parry", &self.parry),
            ("glance", &self.glance),
            ("block", &self.block),
            ("crit_suppression", &self.crit_suppression),
        ];
        for (name, table) in tables {
            if table.0.iter().any(|v| !(0.0..=1.0).contains(v)) {
                return Err(ConfigError::Validation(format!(
                    "level table '{}' must contain chances in [0, 1]",
                    name
                )));
            }
        }

        if self.gcd.min > self.gcd.default {
            return Err(ConfigError::Validation(
                "gcd.min must not exceed gcd.default".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.glance_multiplier) {
            return Err(ConfigError::Validation(format!(
                "glance_multiplier must be in [0, 1], got {}",
                self.glance_multiplier
            )));
        }
        Ok(())
    }

    /// Armor constant used by the mitigation formula for an attacker level
    pub fn armor_constant(&self, attacker_level: u32) -> f64 {
        let a = &self.armor;
        let level = attacker_level as f64;
        if attacker_level > a.high_level_threshold {
            a.base + a.per_level * level
                + a.high_level_factor * a.per_level * (level - a.high_level_threshold as f64)
        } else {
            a.base + a.per_level * level
        }
    }
}

/// A chance indexed by level difference (defender minus attacker), clamped to 0..=3
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelTable(pub [f64; 4]);

impl LevelTable {
    pub fn at(&self, level_difference: i32) -> f64 {
        self.0[level_difference.clamp(0, 3) as usize]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingConstants {
    #[serde(default = "default_melee_hit_rating")]
    pub melee_hit_per_percent: f64,
    #[serde(default = "default_spell_hit_rating")]
    pub spell_hit_per_percent: f64,
    #[serde(default = "default_crit_rating")]
    pub crit_per_percent: f64,
    #[serde(default = "default_haste_rating")]
    pub haste_per_percent: f64,
    #[serde(default = "default_expertise_rating")]
    pub expertise_per_quarter_percent: f64,
    #[serde(default = "default_armor_pen_rating")]
    pub armor_pen_per_percent: f64,
    /// Rating per percent of dodge, parry or block on the defender
    #[serde(default = "default_defense_rating")]
    pub defense_per_percent: f64,
}

impl Default for RatingConstants {
    fn default() -> Self {
        RatingConstants {
            melee_hit_per_percent: default_melee_hit_rating(),
            spell_hit_per_percent: default_spell_hit_rating(),
            crit_per_percent: default_crit_rating(),
            haste_per_percent: default_haste_rating(),
            expertise_per_quarter_percent: default_expertise_rating(),
            armor_pen_per_percent: default_armor_pen_rating(),
            defense_per_percent: default_defense_rating(),
        }
    }
}

fn default_melee_hit_rating() -> f64 {
    32.78998947
}
fn default_spell_hit_rating() -> f64 {
    26.23199272
}
fn default_crit_rating() -> f64 {
    45.90598679
}
fn default_haste_rating() -> f64 {
    32.78998947
}
fn default_expertise_rating() -> f64 {
    32.78998947 / 4.0
}
fn default_armor_pen_rating() -> f64 {
    15.39529991
}
fn default_defense_rating() -> f64 {
    39.34798813
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CritConstants {
    /// Damage multiplier of a physical critical strike
    #[serde(default = "default_physical_crit")]
    pub physical_multiplier: f64,
    /// Damage multiplier of a spell critical strike
    #[serde(default = "default_spell_crit")]
    pub spell_multiplier: f64,
    /// Multiplier of a critical heal
    #[serde(default = "default_spell_crit")]
    pub healing_multiplier: f64,
}

impl Default for CritConstants {
    fn default() -> Self {
        CritConstants {
            physical_multiplier: default_physical_crit(),
            spell_multiplier: default_spell_crit(),
            healing_multiplier: default_spell_crit(),
        }
    }
}

fn default_physical_crit() -> f64 {
    2.0
}
fn default_spell_crit() -> f64 {
    1.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcdConstants {
    /// GCD armed by a spell that does not set its own
    #[serde(default = "default_gcd", with = "duration_secs")]
    pub default: std::time::Duration,
    /// Floor for haste-reduced GCDs
    #[serde(default = "default_gcd_min", with = "duration_secs")]
    pub min: std::time::Duration,
}

impl Default for GcdConstants {
    fn default() -> Self {
        GcdConstants {
            default: default_gcd(),
            min: default_gcd_min(),
        }
    }
}

fn default_gcd() -> std::time::Duration {
    std::time::Duration::from_millis(1500)
}
fn default_gcd_min() -> std::time::Duration {
    std::time::Duration::from_secs(1)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmorConstants {
    /// Formula: reduction = armor / (armor + K), K = base + per_level * level (+ high-level term)
    #[serde(default = "default_armor_base")]
    pub base: f64,
    #[serde(default = "default_armor_per_level")]
    pub per_level: f64,
    #[serde(default = "default_armor_threshold")]
    pub high_level_threshold: u32,
    #[serde(default = "default_armor_high_factor")]
    pub high_level_factor: f64,
    /// Maximum fraction of damage armor can remove
    #[serde(default = "default_armor_cap")]
    pub max_reduction: f64,
}

impl Default for ArmorConstants {
    fn default() -> Self {
        ArmorConstants {
            base: default_armor_base(),
            per_level: default_armor_per_level(),
            high_level_threshold: default_armor_threshold(),
            high_level_factor: default_armor_high_factor(),
            max_reduction: default_armor_cap(),
        }
    }
}

fn default_armor_base() -> f64 {
    400.0
}
fn default_armor_per_level() -> f64 {
    85.0
}
fn default_armor_threshold() -> u32 {
    59
}
fn default_armor_high_factor() -> f64 {
    4.5
}
fn default_armor_cap() -> f64 {
    0.75
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResistanceConstants {
    /// Average mitigation = resist / (resist + per_level * attacker_level)
    #[serde(default = "default_resist_per_level")]
    pub per_level: f64,
    /// Maximum average mitigation from resistance
    #[serde(default = "default_resist_cap")]
    pub max_mitigation: f64,
}

impl Default for ResistanceConstants {
    fn default() -> Self {
        ResistanceConstants {
            per_level: default_resist_per_level(),
            max_mitigation: default_resist_cap(),
        }
    }
}

fn default_resist_per_level() -> f64 {
    5.0
}
fn default_resist_cap() -> f64 {
    0.75
}

fn default_melee_miss() -> LevelTable {
    LevelTable([0.05, 0.055, 0.06, 0.08])
}
fn default_spell_miss() -> LevelTable {
    LevelTable([0.04, 0.05, 0.06, 0.17])
}
fn default_dodge() -> LevelTable {
    LevelTable([0.05, 0.055, 0.06, 0.065])
}
fn default_parry() -> LevelTable {
    LevelTable([0.05, 0.055, 0.06, 0.14])
}
fn default_glance() -> LevelTable {
    LevelTable([0.06, 0.12, 0.18, 0.24])
}
fn default_block() -> LevelTable {
    LevelTable([0.05, 0.055, 0.06, 0.065])
}
fn default_crit_suppression() -> LevelTable {
    LevelTable([0.0, 0.01, 0.02, 0.048])
}
fn default_glance_multiplier() -> f64 {
    0.75
}

impl Default for SimConstants {
    fn default() -> Self {
        SimConstants {
            ratings: RatingConstants::default(),
            crit: CritConstants::default(),
            gcd: GcdConstants::default(),
            armor: ArmorConstants::default(),
            resistance: ResistanceConstants::default(),
            melee_miss: default_melee_miss(),
            spell_miss: default_spell_miss(),
            dodge: default_dodge(),
            parry: default_parry(),
            glance: default_glance(),
            block: default_block(),
            crit_suppression: default_crit_suppression(),
            glance_multiplier: default_glance_multiplier(),
        }
    }
}

/// Serialize a `Duration` as fractional seconds
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom("duration must be a non-negative number of seconds"));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constants() {
        let constants = SimConstants::default();
        assert!((constants.crit.physical_multiplier - 2.0).abs() < f64::EPSILON);
        assert!((constants.glance_multiplier - 0.75).abs() < f64::EPSILON);
        assert!((constants.melee_miss.at(3) - 0.08).abs() < f64::EPSILON);
        assert!(constants.validate().is_ok());
    }

    #[test]
    fn test_level_table_clamps_difference() {
        let table = LevelTable([0.1, 0.2, 0.3, 0.4]);
        assert!((table.at(-2) - 0.1).abs() < f64::EPSILON);
        assert!((table.at(7) - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_armor_constant() {
        let constants = SimConstants::default();
        // 400 + 85 * 80 + 4.5 * 85 * 21
        assert!((constants.armor_constant(80) - 15232.5).abs() < 1e-9);
        assert!((constants.armor_constant(50) - 4650.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_partial_override() {
        let toml = r#"
glance_multiplier = 0.7
melee_miss = [0.05, 0.05, 0.05, 0.09]

[crit]
physical_multiplier = 2.2

[gcd]
default = 1.0
min = 0.75
"#;

        let constants = SimConstants::parse(toml).unwrap();
        assert!((constants.glance_multiplier - 0.7).abs() < f64::EPSILON);
        assert!((constants.melee_miss.at(3) - 0.09).abs() < f64::EPSILON);
        assert!((constants.crit.physical_multiplier - 2.2).abs() < f64::EPSILON);
        // untouched fields keep their defaults
        assert!((constants.crit.spell_multiplier - 1.5).abs() < f64::EPSILON);
        assert!((constants.spell_miss.at(3) - 0.17).abs() < f64::EPSILON);
        assert_eq!(constants.gcd.min, std::time::Duration::from_millis(750));
    }

    #[test]
    fn test_rejects_invalid_table() {
        let toml = r#"dodge = [0.05, 0.05, 0.05, 1.5]"#;
        assert!(matches!(
            SimConstants::parse(toml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_inverted_gcd() {
        let toml = r#"
[gcd]
default = 1.0
min = 1.5
"#;
        assert!(SimConstants::parse(toml).is_err());
    }
}
