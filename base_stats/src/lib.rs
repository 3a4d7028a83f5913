//! base_stats - Race and class base stat tables
//!
//! Tables are loaded from a directory of TOML files holding `[[races]]`,
//! `[[classes]]` and `[[racials]]` entries. A unit's starting stat vector is
//! its race plus its class, with its race's racial bonuses applied: flat
//! additions, percent scaling, and pseudo-stat multipliers the caller applies
//! to the unit during setup.

mod config;
mod registry;

pub use registry::{BaseStatRegistry, Racial};

use std::path::PathBuf;
use thiserror::Error;

/// Error loading base stat tables
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading '{path:?}': {error}")]
    Io {
        error: std::io::Error,
        path: Option<PathBuf>,
    },
    #[error("Parse error in '{path}': {error}")]
    Parse {
        error: toml::de::Error,
        path: PathBuf,
    },
    #[error("Validation error in '{path}': {message}")]
    Validation { message: String, path: PathBuf },
}
