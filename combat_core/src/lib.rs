//! combat_core - Discrete-event combat simulation engine
//!
//! This library provides:
//! - Simulation: units, clock, RNG and the per-iteration run loop
//! - Stats: base stats, toggleable dependency edges and pseudo-stats
//! - Auras: timed, stackable buffs and debuffs with generation-token expiry
//! - Spells: cast validation, cooldowns, the damage/healing pipeline and dots
//! - Metrics: per-spell per-target totals for one iteration
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use combat_core::prelude::*;
//!
//! let mut sim = Simulation::new(SimConstants::default(), EncounterConfig::default());
//! let mage = sim.add_unit(UnitConfig::new("mage", UnitKind::Player, 80)
//!     .with_resource(ResourceConfig::mana(20_000.0)))?;
//! let boss = sim.add_unit(UnitConfig::new("boss", UnitKind::Enemy, 83))?;
//!
//! let fireball = sim.register_spell(mage, SpellConfig::new("fireball", SpellSchool::Fire, ProcMask::SPELL_DAMAGE)
//!     .with_cost(400.0)
//!     .with_cast_time(Duration::from_millis(3000))
//!     .with_flat_amount(1200.0))?;
//! PriorityRotation::new(boss).with_spell("fireball", fireball).install(&mut sim, mage)?;
//!
//! sim.finalize()?;
//! let metrics = sim.run_iteration(12345)?;
//! println!("{:.0} dps", metrics.dps(mage.index()));
//! ```

pub mod attack_table;
pub mod aura;
pub mod config;
pub mod cooldown;
pub mod dot;
pub mod error;
pub mod hooks;
pub mod metrics;
pub mod prelude;
pub mod resource;
pub mod rotation;
pub mod sim;
pub mod spell;
pub mod stats;
pub mod timer;
pub mod trace;
pub mod types;
pub mod unit;

// Core API - what most users need
pub use sim::{EncounterConfig, Simulation};
pub use spell::{OutcomeRoll, SpellConfig, SpellResult};
pub use aura::AuraConfig;
pub use unit::UnitConfig;
pub use types::{AuraId, ProcMask, SpellFlags, SpellId, SpellSchool, UnitId, UnitKind};

// Errors and configuration
pub use config::{ConfigError, SimConstants};
pub use error::SetupError;

// Results
pub use metrics::IterationMetrics;
