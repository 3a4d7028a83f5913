//! Primary stat kinds and the fixed-size vector holding them

use crate::types::SpellSchool;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Index, IndexMut};
use strum::{EnumCount, EnumIter, EnumString, IntoEnumIterator};

/// Primary numeric stats
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumCount,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stat {
    // Attributes
    Strength,
    Agility,
    Stamina,
    Intellect,
    Spirit,
    // Pools
    Health,
    Mana,
    Mp5,
    // Offense
    AttackPower,
    RangedAttackPower,
    SpellPower,
    HealingPower,
    MeleeHit,
    SpellHit,
    MeleeCrit,
    SpellCrit,
    MeleeHaste,
    SpellHaste,
    Expertise,
    ArmorPenetration,
    // Defense
    Armor,
    Defense,
    Dodge,
    Parry,
    Block,
    BlockValue,
    ArcaneResistance,
    FireResistance,
    FrostResistance,
    NatureResistance,
    ShadowResistance,
}

impl Stat {
    pub fn index(self) -> usize {
        self as usize
    }

    /// Resistance stat that mitigates a school, if any
    pub fn resistance_for(school: SpellSchool) -> Option<Stat> {
        match school {
            SpellSchool::Arcane => Some(Stat::ArcaneResistance),
            SpellSchool::Fire => Some(Stat::FireResistance),
            SpellSchool::Frost => Some(Stat::FrostResistance),
            SpellSchool::Nature => Some(Stat::NatureResistance),
            SpellSchool::Shadow => Some(Stat::ShadowResistance),
            SpellSchool::Physical | SpellSchool::Holy => None,
        }
    }
}

/// One value per `Stat`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatVector([f64; Stat::COUNT]);

impl Default for StatVector {
    fn default() -> Self {
        StatVector([0.0; Stat::COUNT])
    }
}

impl StatVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (stat, value) pairs; repeated stats are summed
    pub fn from_pairs<I: IntoIterator<Item = (Stat, f64)>>(pairs: I) -> Self {
        let mut vector = StatVector::new();
        for (stat, value) in pairs {
            vector[stat] += value;
        }
        vector
    }

    /// Iterate over non-zero entries
    pub fn iter_nonzero(&self) -> impl Iterator<Item = (Stat, f64)> + '_ {
        Stat::iter()
            .map(move |stat| (stat, self[stat]))
            .filter(|(_, value)| *value != 0.0)
    }
}

impl Index<Stat> for StatVector {
    type Output = f64;

    fn index(&self, stat: Stat) -> &f64 {
        &self.0[stat.index()]
    }
}

impl IndexMut<Stat> for StatVector {
    fn index_mut(&mut self, stat: Stat) -> &mut f64 {
        &mut self.0[stat.index()]
    }
}

impl Add for StatVector {
    type Output = StatVector;

    fn add(mut self, rhs: StatVector) -> StatVector {
        self += rhs;
        self
    }
}

impl AddAssign for StatVector {
    fn add_assign(&mut self, rhs: StatVector) {
        for (lhs, rhs) in self.0.iter_mut().zip(rhs.0.iter()) {
            *lhs += rhs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_sums_duplicates() {
        let v = StatVector::from_pairs([(Stat::Agility, 10.0), (Stat::Agility, 5.0)]);
        assert!((v[Stat::Agility] - 15.0).abs() < f64::EPSILON);
        assert_eq!(v.iter_nonzero().count(), 1);
    }

    #[test]
    fn test_add_vectors() {
        let a = StatVector::from_pairs([(Stat::Strength, 1.0)]);
        let b = StatVector::from_pairs([(Stat::Strength, 2.0), (Stat::Armor, 3.0)]);
        let sum = a + b;
        assert!((sum[Stat::Strength] - 3.0).abs() < f64::EPSILON);
        assert!((sum[Stat::Armor] - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resistance_mapping() {
        assert_eq!(Stat::resistance_for(SpellSchool::Fire), Some(Stat::FireResistance));
        assert_eq!(Stat::resistance_for(SpellSchool::Holy), None);
        assert_eq!(Stat::resistance_for(SpellSchool::Physical), None);
    }

    #[test]
    fn test_parse_snake_case_names() {
        assert_eq!("spell_power".parse::<Stat>(), Ok(Stat::SpellPower));
        assert_eq!("mp5".parse::<Stat>(), Ok(Stat::Mp5));
        assert!("spellpower".parse::<Stat>().is_err());
    }
}
