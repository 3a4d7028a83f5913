//! sim_runner - Parallel multi-iteration driver for combat_core
//!
//! Each rayon worker builds its own [`combat_core::Simulation`] from the
//! caller's setup closure and reuses it for every iteration it runs. Seeds
//! are derived from the base seed and the iteration index, so results do not
//! depend on which thread ran which iteration.

pub mod aggregate;
mod config;
mod runner;

pub use aggregate::{Aggregate, AggregateReport, DistributionMetrics, Summary};
pub use config::RunConfig;
pub use runner::{iteration_seed, Runner};

use combat_core::{ConfigError, SetupError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("setup failed: {0}")]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("run requested with zero iterations")]
    ZeroIterations,
    #[error("could not build worker pool: {0}")]
    ThreadPool(String),
}
