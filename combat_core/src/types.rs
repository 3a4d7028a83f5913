//! Shared identifiers, schools, classification flags and outcome tags

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{EnumCount, EnumIter, EnumString};

// ============================================================================
// Handles
// ============================================================================

/// Index of a unit inside a simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub(crate) usize);

impl UnitId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to a spell registered on a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpellId {
    pub unit: UnitId,
    pub(crate) index: usize,
}

/// Handle to an aura registered on a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuraId {
    pub unit: UnitId,
    pub(crate) index: usize,
}

/// Handle to a cooldown timer owned by a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId {
    pub unit: UnitId,
    pub(crate) index: usize,
}

/// Handle to a stat dependency edge owned by a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyId {
    pub unit: UnitId,
    pub(crate) index: usize,
}

/// Whether a unit fights for the player side or is an encounter target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    #[default]
    Player,
    Pet,
    Enemy,
}

// ============================================================================
// Schools
// ============================================================================

/// Damage school of a spell
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Default,
    EnumCount,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SpellSchool {
    #[default]
    Physical,
    Arcane,
    Fire,
    Frost,
    Holy,
    Nature,
    Shadow,
}

impl SpellSchool {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_physical(self) -> bool {
        self == SpellSchool::Physical
    }
}

impl fmt::Display for SpellSchool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpellSchool::Physical => write!(f, "Physical"),
            SpellSchool::Arcane => write!(f, "Arcane"),
            SpellSchool::Fire => write!(f, "Fire"),
            SpellSchool::Frost => write!(f, "Frost"),
            SpellSchool::Holy => write!(f, "Holy"),
            SpellSchool::Nature => write!(f, "Nature"),
            SpellSchool::Shadow => write!(f, "Shadow"),
        }
    }
}

/// One value per spell school
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchoolArray(pub [f64; SpellSchool::COUNT]);

impl SchoolArray {
    pub fn splat(value: f64) -> Self {
        SchoolArray([value; SpellSchool::COUNT])
    }

    pub fn get(&self, school: SpellSchool) -> f64 {
        self.0[school.index()]
    }

    pub fn get_mut(&mut self, school: SpellSchool) -> &mut f64 {
        &mut self.0[school.index()]
    }
}

// ============================================================================
// Classification
// ============================================================================

bitflags! {
    /// What kind of action produced an effect. Proc hooks filter on this.
    ///
    /// Every spell must declare at least one bit; `EMPTY` must stand alone.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ProcMask: u32 {
        const EMPTY = 1 << 0;
        const MELEE_MH_AUTO = 1 << 1;
        const MELEE_OH_AUTO = 1 << 2;
        const MELEE_MH_SPECIAL = 1 << 3;
        const MELEE_OH_SPECIAL = 1 << 4;
        const RANGED_AUTO = 1 << 5;
        const RANGED_SPECIAL = 1 << 6;
        const SPELL_DAMAGE = 1 << 7;
        const PERIODIC_DAMAGE = 1 << 8;
        const SPELL_HEALING = 1 << 9;
        const PERIODIC_HEALING = 1 << 10;

        const MELEE_AUTO = Self::MELEE_MH_AUTO.bits() | Self::MELEE_OH_AUTO.bits();
        const MELEE_SPECIAL = Self::MELEE_MH_SPECIAL.bits() | Self::MELEE_OH_SPECIAL.bits();
        const MELEE = Self::MELEE_AUTO.bits() | Self::MELEE_SPECIAL.bits();
        const RANGED = Self::RANGED_AUTO.bits() | Self::RANGED_SPECIAL.bits();
        const HEALING = Self::SPELL_HEALING.bits() | Self::PERIODIC_HEALING.bits();
    }
}

bitflags! {
    /// Behavioral switches on a spell
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct SpellFlags: u32 {
        /// Skip attacker-side multipliers
        const IGNORE_ATTACKER_MODIFIERS = 1 << 0;
        /// Skip defender-side multipliers and flat bonuses
        const IGNORE_TARGET_MODIFIERS = 1 << 1;
        /// Physical damage is not reduced by armor
        const IGNORE_ARMOR = 1 << 2;
        /// Neither checks nor arms the global cooldown
        const BYPASS_GCD = 1 << 3;
        /// Adds the target's flat bonus physical damage taken
        const INCLUDE_TARGET_BONUS_DAMAGE = 1 << 4;
        /// Spell resolves as healing instead of damage
        const HEALING = 1 << 5;
        /// Cast time is not divided by cast speed
        const IGNORE_HASTE = 1 << 6;
        /// Does not record per-spell metrics
        const NO_METRICS = 1 << 7;
        /// Does not fire unit or aura proc hooks
        const NO_ON_HIT_HOOKS = 1 << 8;
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Result tag of a single combat roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, EnumCount, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Not rolled yet
    #[default]
    Empty,
    Miss,
    Dodge,
    Parry,
    Glance,
    Block,
    Crit,
    Hit,
}

impl Outcome {
    /// Anything other than fully avoided
    pub fn landed(self) -> bool {
        matches!(
            self,
            Outcome::Hit | Outcome::Crit | Outcome::Block | Outcome::Glance
        )
    }

    pub fn is_crit(self) -> bool {
        self == Outcome::Crit
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Empty => write!(f, "Empty"),
            Outcome::Miss => write!(f, "Miss"),
            Outcome::Dodge => write!(f, "Dodge"),
            Outcome::Parry => write!(f, "Parry"),
            Outcome::Glance => write!(f, "Glance"),
            Outcome::Block => write!(f, "Block"),
            Outcome::Crit => write!(f, "Crit"),
            Outcome::Hit => write!(f, "Hit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landed_outcomes() {
        assert!(Outcome::Hit.landed());
        assert!(Outcome::Crit.landed());
        assert!(Outcome::Block.landed());
        assert!(Outcome::Glance.landed());
        assert!(!Outcome::Miss.landed());
        assert!(!Outcome::Dodge.landed());
        assert!(!Outcome::Parry.landed());
        assert!(!Outcome::Empty.landed());
    }

    #[test]
    fn test_proc_mask_groups() {
        assert!(ProcMask::MELEE.contains(ProcMask::MELEE_MH_SPECIAL));
        assert!(ProcMask::MELEE.contains(ProcMask::MELEE_OH_AUTO));
        assert!(!ProcMask::MELEE.intersects(ProcMask::RANGED));
    }

    #[test]
    fn test_school_array() {
        let mut arr = SchoolArray::splat(1.0);
        *arr.get_mut(SpellSchool::Fire) *= 1.1;
        assert!((arr.get(SpellSchool::Fire) - 1.1).abs() < f64::EPSILON);
        assert!((arr.get(SpellSchool::Frost) - 1.0).abs() < f64::EPSILON);
    }
}
