use serde::Deserialize;
use std::collections::BTreeMap;

/// TOML layout of one table file. Every section is optional.
#[derive(Debug, Deserialize)]
pub struct StatFileConfig {
    #[serde(default)]
    pub races: Vec<EntryConfig>,
    #[serde(default)]
    pub classes: Vec<EntryConfig>,
    #[serde(default)]
    pub racials: Vec<RacialConfig>,
}

/// A race or class and its base stats
#[derive(Debug, Deserialize)]
pub struct EntryConfig {
    pub id: String,
    /// Stat name (snake_case) to value
    #[serde(default)]
    pub stats: BTreeMap<String, f64>,
}

/// Racial bonuses applied on top of a race's base stats
#[derive(Debug, Deserialize)]
pub struct RacialConfig {
    pub race: String,
    /// Flat stat bonuses
    #[serde(default)]
    pub stats: BTreeMap<String, f64>,
    /// Stat name to percent of the summed base value (`health = 5` is +5%)
    #[serde(default)]
    pub percent: BTreeMap<String, f64>,
    /// Pseudo-stat multiplier key (`damage_dealt`, `school_damage_taken.fire`)
    /// to factor
    #[serde(default)]
    pub multipliers: BTreeMap<String, f64>,
}
