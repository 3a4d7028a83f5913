//! Prelude module for convenient imports
//!
//! ```rust
//! use combat_core::prelude::*;
//! ```

// Core types
pub use crate::sim::{EncounterConfig, Simulation};
pub use crate::types::{
    AuraId, DependencyId, Outcome, ProcMask, SpellFlags, SpellId, SpellSchool, TimerId, UnitId,
    UnitKind,
};
pub use crate::unit::UnitConfig;

// Stats
pub use crate::stats::{MultiplierKind, PseudoStats, Stat, StatRelation, StatVector};

// Spells, auras and dots
pub use crate::aura::AuraConfig;
pub use crate::dot::DotConfig;
pub use crate::spell::{OutcomeRoll, SpellConfig, SpellResult};

// Resources
pub use crate::resource::{Regen, ResourceConfig, ResourceKind};

// Driving
pub use crate::hooks::ResultEvent;
pub use crate::rotation::PriorityRotation;

// Config and errors
pub use crate::config::{ConfigError, SimConstants};
pub use crate::error::SetupError;

// Metrics
pub use crate::metrics::{IterationMetrics, SpellMetrics, UnitMetrics};

pub use std::time::Duration;
