use crate::RunError;
use combat_core::config::{load_toml, parse_toml};
use combat_core::{ConfigError, EncounterConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How many iterations to run and how each encounter is shaped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_duration")]
    pub duration_secs: f64,
    /// Each iteration's length is drawn uniformly within +/- this
    #[serde(default)]
    pub duration_variation_secs: f64,
    /// Ends an iteration early once enemies have taken this much damage
    #[serde(default)]
    pub health: Option<f64>,
    /// Worker threads; rayon's default when unset
    #[serde(default)]
    pub threads: Option<usize>,
}

fn default_iterations() -> u32 {
    1000
}

fn default_duration() -> f64 {
    180.0
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            iterations: default_iterations(),
            seed: 0,
            duration_secs: default_duration(),
            duration_variation_secs: 0.0,
            health: None,
            threads: None,
        }
    }
}

impl RunConfig {
    pub fn load_from_path(path: &Path) -> Result<Self, RunError> {
        let config: RunConfig = load_toml(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, RunError> {
        let config: RunConfig = parse_toml(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RunError> {
        if self.iterations == 0 {
            return Err(RunError::ZeroIterations);
        }
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "duration_secs must be positive, got {}",
                self.duration_secs
            ))
            .into());
        }
        if !self.duration_variation_secs.is_finite()
            || self.duration_variation_secs < 0.0
            || self.duration_variation_secs > self.duration_secs
        {
            return Err(ConfigError::Validation(format!(
                "duration_variation_secs must be within 0..={}, got {}",
                self.duration_secs, self.duration_variation_secs
            ))
            .into());
        }
        if self.health.is_some_and(|h| !h.is_finite() || h <= 0.0) {
            return Err(ConfigError::Validation("health must be positive".to_string()).into());
        }
        if self.threads == Some(0) {
            return Err(ConfigError::Validation("threads must be at least 1".to_string()).into());
        }
        Ok(())
    }

    pub fn encounter(&self) -> EncounterConfig {
        EncounterConfig {
            duration: Duration::from_secs_f64(self.duration_secs),
            duration_variation: Duration::from_secs_f64(self.duration_variation_secs),
            health: self.health,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = RunConfig::parse("iterations = 50\nseed = 7").unwrap();
        assert_eq!(config.iterations, 50);
        assert_eq!(config.seed, 7);
        assert!((config.duration_secs - 180.0).abs() < f64::EPSILON);
        assert_eq!(config.threads, None);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        assert!(matches!(
            RunConfig::parse("iterations = 0"),
            Err(RunError::ZeroIterations)
        ));
    }

    #[test]
    fn test_bad_variation_rejected() {
        assert!(matches!(
            RunConfig::parse("duration_secs = 60.0\nduration_variation_secs = 90.0"),
            Err(RunError::Config(ConfigError::Validation(_)))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "iterations = 10\nduration_secs = 300.0\nhealth = 5e6\nthreads = 2").unwrap();
        let config = RunConfig::load_from_path(file.path()).unwrap();
        let encounter = config.encounter();
        assert_eq!(encounter.duration, Duration::from_secs(300));
        assert_eq!(encounter.health, Some(5e6));
        assert_eq!(config.threads, Some(2));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = RunConfig::load_from_path(Path::new("/nonexistent/run.toml")).unwrap_err();
        assert!(matches!(err, RunError::Config(ConfigError::Io { .. })));
    }
}
