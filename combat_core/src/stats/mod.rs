//! Stat model
//!
//! - `Stat` / `StatVector`: the primary numeric stats of a unit
//! - `StatSheet`: base + bonus stats folded through toggleable dependency edges
//! - `PseudoStats`: named multipliers and flags outside the stat vector

mod dependency;
mod pseudo;
mod stat;

pub use dependency::{StatDependency, StatRelation, StatSheet};
pub use pseudo::{is_invertible, MultiplierKind, PseudoStats};
pub use stat::{Stat, StatVector};
