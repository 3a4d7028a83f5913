use crate::config::{RacialConfig, StatFileConfig};
use crate::ConfigError;
use combat_core::stats::{is_invertible, MultiplierKind, PseudoStats, Stat, StatVector};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use tracing::debug;

/// Racial bonuses of one race
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Racial {
    /// Flat additions
    pub stats: StatVector,
    /// Fractional scaling of the summed base (0.05 is +5%)
    pub scaling: StatVector,
    /// Pseudo-stat factors, in key order
    pub multipliers: Vec<(MultiplierKind, f64)>,
}

impl Racial {
    fn from_config(config: &RacialConfig) -> Result<Self, String> {
        let stats = parse_stats(&config.stats)?;
        let mut scaling = parse_stats(&config.percent)?;
        for stat in Stat::iter() {
            if scaling[stat] <= -100.0 {
                return Err(format!(
                    "percent bonus for '{stat:?}' must be above -100, got {}",
                    scaling[stat]
                ));
            }
            scaling[stat] /= 100.0;
        }
        let multipliers = config
            .multipliers
            .iter()
            .map(|(key, factor)| {
                let kind = MultiplierKind::parse_key(key)
                    .map_err(|_| format!("unknown multiplier '{key}'"))?;
                if !is_invertible(*factor) {
                    return Err(format!("multiplier '{key}' must be positive, got {factor}"));
                }
                Ok((kind, *factor))
            })
            .collect::<Result<Vec<_>, String>>()?;
        Ok(Racial {
            stats,
            scaling,
            multipliers,
        })
    }

    /// Add the flat bonuses to `base`, then scale by the percent bonuses
    pub fn apply_stats(&self, base: StatVector) -> StatVector {
        let mut total = base + self.stats;
        for stat in Stat::iter() {
            total[stat] *= 1.0 + self.scaling[stat];
        }
        total
    }

    /// Scale a unit's pseudo-stats. Call during setup, before `finalize`
    /// snapshots them.
    pub fn apply_multipliers(&self, pseudo: &mut PseudoStats) {
        for &(kind, factor) in &self.multipliers {
            pseudo.apply(kind, factor);
        }
    }
}

/// Registry of race, class and racial stat tables
#[derive(Debug, Default)]
pub struct BaseStatRegistry {
    races: HashMap<String, StatVector>,
    classes: HashMap<String, StatVector>,
    racials: HashMap<String, (Racial, PathBuf)>,
}

impl BaseStatRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every table under a directory (recursively)
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        registry.load_dir(dir)?;
        registry.check_racials()?;
        debug!(
            races = registry.races.len(),
            classes = registry.classes.len(),
            racials = registry.racials.len(),
            "base stat tables loaded"
        );
        Ok(registry)
    }

    fn load_dir(&mut self, dir: &Path) -> Result<(), ConfigError> {
        if !dir.exists() {
            return Ok(());
        }

        let entries = std::fs::read_dir(dir).map_err(|e| ConfigError::Io {
            error: e,
            path: Some(dir.to_path_buf()),
        })?;

        // Sorted so errors name the same file on every platform
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ConfigError::Io {
                error: e,
                path: Some(dir.to_path_buf()),
            })?;
            paths.push(entry.path());
        }
        paths.sort();

        for path in paths {
            if path.is_dir() {
                self.load_dir(&path)?;
            } else if path.extension().is_some_and(|ext| ext == "toml") {
                self.load_file(&path)?;
            }
        }

        Ok(())
    }

    /// Load a single table file
    pub fn load_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            error: e,
            path: Some(path.to_path_buf()),
        })?;

        let config: StatFileConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            error: e,
            path: path.to_path_buf(),
        })?;

        let invalid = |message: String| ConfigError::Validation {
            message,
            path: path.to_path_buf(),
        };

        for race in config.races {
            let stats = parse_stats(&race.stats).map_err(&invalid)?;
            if self.races.insert(race.id.clone(), stats).is_some() {
                return Err(invalid(format!("duplicate race '{}'", race.id)));
            }
        }
        for class in config.classes {
            let stats = parse_stats(&class.stats).map_err(&invalid)?;
            if self.classes.insert(class.id.clone(), stats).is_some() {
                return Err(invalid(format!("duplicate class '{}'", class.id)));
            }
        }
        for racial in config.racials {
            let bonus = Racial::from_config(&racial).map_err(&invalid)?;
            if let Some((_, first)) = self.racials.get(&racial.race) {
                return Err(invalid(format!(
                    "conflicting racial bonuses for race '{}' (first defined in '{}')",
                    racial.race,
                    first.display()
                )));
            }
            self.racials
                .insert(racial.race, (bonus, path.to_path_buf()));
        }
        Ok(())
    }

    /// Every racial must belong to a known race
    fn check_racials(&self) -> Result<(), ConfigError> {
        let mut unknown: Vec<(&String, &PathBuf)> = self
            .racials
            .iter()
            .filter(|(race, _)| !self.races.contains_key(*race))
            .map(|(race, (_, path))| (race, path))
            .collect();
        unknown.sort();
        match unknown.first() {
            Some((race, path)) => Err(ConfigError::Validation {
                message: format!("racial bonuses for unknown race '{race}'"),
                path: path.to_path_buf(),
            }),
            None => Ok(()),
        }
    }

    /// Race + class with racial bonuses applied, or `None` if either id is
    /// unknown
    pub fn base_stats(&self, race: &str, class: &str) -> Option<StatVector> {
        let race_stats = self.races.get(race)?;
        let class_stats = self.classes.get(class)?;
        let total = *race_stats + *class_stats;
        Some(match self.racial(race) {
            Some(racial) => racial.apply_stats(total),
            None => total,
        })
    }

    /// Pseudo-stat factors granted by a race; empty if it has none
    pub fn racial_multipliers(&self, race: &str) -> &[(MultiplierKind, f64)] {
        self.racial(race)
            .map(|r| r.multipliers.as_slice())
            .unwrap_or_default()
    }

    pub fn race(&self, id: &str) -> Option<&StatVector> {
        self.races.get(id)
    }

    pub fn class(&self, id: &str) -> Option<&StatVector> {
        self.classes.get(id)
    }

    pub fn racial(&self, race: &str) -> Option<&Racial> {
        self.racials.get(race).map(|(racial, _)| racial)
    }

    pub fn race_ids(&self) -> impl Iterator<Item = &str> {
        self.races.keys().map(|s| s.as_str())
    }

    pub fn class_ids(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(|s| s.as_str())
    }
}

fn parse_stats(raw: &BTreeMap<String, f64>) -> Result<StatVector, String> {
    raw.iter()
        .map(|(name, value)| {
            let stat = name
                .parse::<Stat>()
                .map_err(|_| format!("unknown stat '{name}'"))?;
            if !value.is_finite() {
                return Err(format!("stat '{name}' has non-finite value {value}"));
            }
            Ok((stat, *value))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(StatVector::from_pairs)
}
