//! Setup-time contract violations
//!
//! Everything here is raised while collaborators register units, spells and
//! auras. Runtime conditions such as "cooldown not ready" are never errors;
//! `Simulation::cast` reports them as `false`.

use crate::stats::Stat;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetupError {
    #[error("spell '{0}' has no proc classification")]
    MissingClassification(String),

    #[error("spell '{0}' combines the EMPTY classification with other bits")]
    ExclusiveEmptyClassification(String),

    #[error("spell '{label}' has invalid cost {cost}")]
    InvalidCost { label: String, cost: f64 },

    #[error("spell '{0}' declares a cost but its unit has no resource pool")]
    MissingResource(String),

    #[error("spell '{label}' has invalid missile speed {speed}")]
    InvalidMissileSpeed { label: String, speed: f64 },

    #[error("spell '{0}' has a dot with zero ticks or a zero tick period")]
    InvalidDot(String),

    #[error("aura label '{0}' is already registered on this unit")]
    DuplicateAuraLabel(String),

    #[error("aura '{label}' stacks on activation but has max_stacks {max_stacks}")]
    InvalidStacks { label: String, max_stacks: u32 },

    #[error("aura '{label}' uses multiplier factor {factor}, which cannot be undone")]
    InvalidMultiplier { label: String, factor: f64 },

    #[error("multiplicative dependency {source_stat:?} -> {derived:?} must target its own source")]
    InvalidDependency { source_stat: Stat, derived: Stat },

    #[error("dependency {source_stat:?} -> {derived:?} would create a cycle")]
    DependencyCycle { source_stat: Stat, derived: Stat },

    #[error("unknown unit index {0}")]
    UnknownUnit(usize),

    #[error("handle refers to a different unit than the one being configured")]
    ForeignHandle,

    #[error("simulation is already finalized; setup calls are no longer allowed")]
    AlreadyFinalized,

    #[error("simulation must be finalized before it can run")]
    NotFinalized,

    #[error("encounter needs at least one enemy unit")]
    NoEnemies,
}
