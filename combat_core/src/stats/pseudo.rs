//! Pseudo-stats - multipliers and flags that are not part of the stat vector

use crate::types::{SchoolArray, SpellSchool};
use serde::{Deserialize, Serialize};
use strum::EnumString;

/// Per-unit multipliers and flags read by the resolution pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PseudoStats {
    // Outgoing
    pub damage_dealt_multiplier: f64,
    pub school_damage_dealt_multiplier: SchoolArray,
    pub healing_dealt_multiplier: f64,
    pub threat_multiplier: f64,
    pub holy_spell_threat_multiplier: f64,
    pub cast_speed_multiplier: f64,
    pub attack_speed_multiplier: f64,
    /// Added to a spell's crit multiplier
    pub crit_damage_bonus: f64,

    // Incoming
    pub damage_taken_multiplier: f64,
    pub school_damage_taken_multiplier: SchoolArray,
    pub periodic_damage_taken_multiplier: SchoolArray,
    pub bonus_damage_taken: f64,
    pub bonus_physical_damage_taken: f64,
    pub healing_taken_multiplier: f64,
    /// Subtracted from attackers' hit chance, per school
    pub reduced_hit_taken_chance: SchoolArray,
    pub bonus_crit_rating_taken: f64,
    pub bonus_hit_rating_taken: f64,

    pub can_dodge: bool,
    pub can_parry: bool,
    pub can_block: bool,
    /// Attacker stands in front of its target (enables parry and block)
    pub in_front_of_target: bool,
}

impl Default for PseudoStats {
    fn default() -> Self {
        PseudoStats {
            damage_dealt_multiplier: 1.0,
            school_damage_dealt_multiplier: SchoolArray::splat(1.0),
            healing_dealt_multiplier: 1.0,
            threat_multiplier: 1.0,
            holy_spell_threat_multiplier: 1.0,
            cast_speed_multiplier: 1.0,
            attack_speed_multiplier: 1.0,
            crit_damage_bonus: 0.0,
            damage_taken_multiplier: 1.0,
            school_damage_taken_multiplier: SchoolArray::splat(1.0),
            periodic_damage_taken_multiplier: SchoolArray::splat(1.0),
            bonus_damage_taken: 0.0,
            bonus_physical_damage_taken: 0.0,
            healing_taken_multiplier: 1.0,
            reduced_hit_taken_chance: SchoolArray::splat(0.0),
            bonus_crit_rating_taken: 0.0,
            bonus_hit_rating_taken: 0.0,
            can_dodge: true,
            can_parry: true,
            can_block: true,
            in_front_of_target: false,
        }
    }
}

/// Multiplicative pseudo-stat slot an aura or racial can scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MultiplierKind {
    DamageDealt,
    SchoolDamageDealt(SpellSchool),
    DamageTaken,
    SchoolDamageTaken(SpellSchool),
    PeriodicDamageTaken(SpellSchool),
    HealingDealt,
    HealingTaken,
    Threat,
    CastSpeed,
    AttackSpeed,
}

impl MultiplierKind {
    /// Parse a table key: `healing_taken`, or `school_damage_taken.fire`
    /// for the per-school slots
    pub fn parse_key(key: &str) -> Result<Self, strum::ParseError> {
        let (name, school) = match key.split_once('.') {
            Some((name, school)) => (name, Some(school.parse::<SpellSchool>()?)),
            None => (key, None),
        };
        match (name.parse::<MultiplierKind>()?, school) {
            (MultiplierKind::SchoolDamageDealt(_), Some(school)) => {
                Ok(MultiplierKind::SchoolDamageDealt(school))
            }
            (MultiplierKind::SchoolDamageTaken(_), Some(school)) => {
                Ok(MultiplierKind::SchoolDamageTaken(school))
            }
            (MultiplierKind::PeriodicDamageTaken(_), Some(school)) => {
                Ok(MultiplierKind::PeriodicDamageTaken(school))
            }
            (kind, None) if !kind.is_per_school() => Ok(kind),
            _ => Err(strum::ParseError::VariantNotFound),
        }
    }

    pub fn is_per_school(self) -> bool {
        matches!(
            self,
            MultiplierKind::SchoolDamageDealt(_)
                | MultiplierKind::SchoolDamageTaken(_)
                | MultiplierKind::PeriodicDamageTaken(_)
        )
    }
}

impl PseudoStats {
    pub fn slot_mut(&mut self, kind: MultiplierKind) -> &mut f64 {
        match kind {
            MultiplierKind::DamageDealt => &mut self.damage_dealt_multiplier,
            MultiplierKind::SchoolDamageDealt(school) => {
                self.school_damage_dealt_multiplier.get_mut(school)
            }
            MultiplierKind::DamageTaken => &mut self.damage_taken_multiplier,
            MultiplierKind::SchoolDamageTaken(school) => {
                self.school_damage_taken_multiplier.get_mut(school)
            }
            MultiplierKind::PeriodicDamageTaken(school) => {
                self.periodic_damage_taken_multiplier.get_mut(school)
            }
            MultiplierKind::HealingDealt => &mut self.healing_dealt_multiplier,
            MultiplierKind::HealingTaken => &mut self.healing_taken_multiplier,
            MultiplierKind::Threat => &mut self.threat_multiplier,
            MultiplierKind::CastSpeed => &mut self.cast_speed_multiplier,
            MultiplierKind::AttackSpeed => &mut self.attack_speed_multiplier,
        }
    }

    pub fn get(&self, kind: MultiplierKind) -> f64 {
        match kind {
            MultiplierKind::DamageDealt => self.damage_dealt_multiplier,
            MultiplierKind::SchoolDamageDealt(school) => {
                self.school_damage_dealt_multiplier.get(school)
            }
            MultiplierKind::DamageTaken => self.damage_taken_multiplier,
            MultiplierKind::SchoolDamageTaken(school) => {
                self.school_damage_taken_multiplier.get(school)
            }
            MultiplierKind::PeriodicDamageTaken(school) => {
                self.periodic_damage_taken_multiplier.get(school)
            }
            MultiplierKind::HealingDealt => self.healing_dealt_multiplier,
            MultiplierKind::HealingTaken => self.healing_taken_multiplier,
            MultiplierKind::Threat => self.threat_multiplier,
            MultiplierKind::CastSpeed => self.cast_speed_multiplier,
            MultiplierKind::AttackSpeed => self.attack_speed_multiplier,
        }
    }

    /// Scale a slot up by `factor`
    pub fn apply(&mut self, kind: MultiplierKind, factor: f64) {
        *self.slot_mut(kind) *= factor;
    }

    /// Undo a previous `apply` with the same factor
    pub fn undo(&mut self, kind: MultiplierKind, factor: f64) {
        *self.slot_mut(kind) /= factor;
    }
}

/// Whether a factor can be applied and later undone exactly
pub fn is_invertible(factor: f64) -> bool {
    factor.is_finite() && factor > 0.0
}
