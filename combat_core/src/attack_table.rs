//! Static avoidance and mitigation profile for an attacker/defender pairing
//!
//! Built once at finalize from the two units' levels. Rating-dependent parts
//! (hit, expertise, crit) are read live from the units at roll time.

use crate::config::SimConstants;
use crate::types::UnitId;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttackTable {
    pub attacker: UnitId,
    pub defender: UnitId,

    // Base chances for the level difference
    pub melee_miss: f64,
    pub spell_miss: f64,
    pub dodge: f64,
    pub parry: f64,
    pub glance: f64,
    pub block: f64,
    pub crit_suppression: f64,
    pub glance_multiplier: f64,

    // Pairing multipliers
    pub damage_dealt_multiplier: f64,
    pub damage_taken_multiplier: f64,
    pub healing_dealt_multiplier: f64,
    pub periodic_shadow_multiplier: f64,

    // Mitigation inputs
    armor_constant: f64,
    armor_cap: f64,
    resistance_per_level: f64,
    resistance_cap: f64,
    attacker_level: u32,
}

impl AttackTable {
    pub fn new(
        constants: &SimConstants,
        attacker: UnitId,
        attacker_level: u32,
        defender: UnitId,
        defender_level: u32,
    ) -> Self {
        let diff = defender_level as i32 - attacker_level as i32;
        AttackTable {
            attacker,
            defender,
            melee_miss: constants.melee_miss.at(diff),
            spell_miss: constants.spell_miss.at(diff),
            dodge: constants.dodge.at(diff),
            parry: constants.parry.at(diff),
            glance: constants.glance.at(diff),
            block: constants.block.at(diff),
            crit_suppression: constants.crit_suppression.at(diff),
            glance_multiplier: constants.glance_multiplier,
            damage_dealt_multiplier: 1.0,
            damage_taken_multiplier: 1.0,
            healing_dealt_multiplier: 1.0,
            periodic_shadow_multiplier: 1.0,
            armor_constant: constants.armor_constant(attacker_level),
            armor_cap: constants.armor.max_reduction,
            resistance_per_level: constants.resistance.per_level,
            resistance_cap: constants.resistance.max_mitigation,
            attacker_level,
        }
    }

    /// Fraction of physical damage removed by `armor` after penetration
    pub fn armor_reduction(&self, armor: f64, armor_pen: f64) -> f64 {
        let effective = armor.max(0.0) * (1.0 - armor_pen.clamp(0.0, 1.0));
        if effective <= 0.0 {
            return 0.0;
        }
        (effective / (effective + self.armor_constant)).min(self.armor_cap)
    }

    /// Average fraction of magic damage resisted
    pub fn resistance_mitigation(&self, resistance: f64) -> f64 {
        let resistance = resistance.max(0.0);
        let divisor = resistance + self.resistance_per_level * self.attacker_level as f64;
        if resistance <= 0.0 || divisor <= 0.0 {
            return 0.0;
        }
        (resistance / divisor).min(self.resistance_cap)
    }
}
