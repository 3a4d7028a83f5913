//! Damage and healing resolution
//!
//! Damage passes through six stages in fixed order:
//!
//! 1. base amount
//! 2. attacker modifiers (or the dot snapshot for periodic ticks)
//! 3. target modifiers and flat bonuses
//! 4. mitigation (armor, resistance, periodic taken)
//! 5. outcome roll
//! 6. clamp at zero
//!
//! Every stage clamps at zero. Healing is shorter: caster multipliers,
//! target multipliers, outcome.

use super::outcome::{resolve_single_roll, resolve_two_stage, OutcomeEffects, RollChances};
use super::{OutcomeRoll, ResultHandle, SpellResult, StageValues};
use crate::dot::DotSnapshot;
use crate::stats::Stat;
use crate::trace::PipelineTrace;
use crate::types::{Outcome, SpellFlags, SpellId, SpellSchool, UnitId};
use crate::Simulation;
use rand::Rng;
use tracing::trace;

impl Simulation {
    // ========================================================================
    // Public entry points
    // ========================================================================

    /// Resolve a direct damage hit through the outcome roll
    pub fn calc_damage(
        &mut self,
        spell: SpellId,
        target: UnitId,
        base: f64,
        roll: OutcomeRoll,
    ) -> ResultHandle {
        let multiplier = self.attacker_multiplier(spell, target, false);
        self.resolve_damage(spell, target, base, multiplier, roll, None)
    }

    /// Resolve a direct heal through the outcome roll
    pub fn calc_healing(
        &mut self,
        spell: SpellId,
        target: UnitId,
        base: f64,
        roll: OutcomeRoll,
    ) -> ResultHandle {
        let multiplier = self.attacker_multiplier(spell, target, true);
        self.resolve_healing(spell, target, base, multiplier, roll, None, false)
    }

    /// Hit or miss only, for effects without an amount (debuffs)
    pub fn calc_outcome(&mut self, spell: SpellId, target: UnitId, roll: OutcomeRoll) -> ResultHandle {
        let mut outcome = self.roll_outcome(spell, target, roll, None);
        if outcome == Outcome::Crit {
            outcome = Outcome::Hit;
        }
        let mut result = SpellResult::new(spell, target);
        result.outcome = outcome;
        self.results.acquire(result)
    }

    pub fn calc_and_deal_damage(&mut self, spell: SpellId, target: UnitId, base: f64, roll: OutcomeRoll) {
        let handle = self.calc_damage(spell, target, base, roll);
        self.deal_damage(handle);
    }

    pub fn calc_and_deal_healing(&mut self, spell: SpellId, target: UnitId, base: f64, roll: OutcomeRoll) {
        let handle = self.calc_healing(spell, target, base, roll);
        self.deal_healing(handle);
    }

    pub fn result(&self, handle: &ResultHandle) -> &SpellResult {
        self.results.get(handle)
    }

    pub fn result_mut(&mut self, handle: &ResultHandle) -> &mut SpellResult {
        self.results.get_mut(handle)
    }

    // ========================================================================
    // Stages
    // ========================================================================

    /// Stage 2: caster-side multiplier
    pub(crate) fn attacker_multiplier(&self, spell: SpellId, target: UnitId, healing: bool) -> f64 {
        let s = self.spell(spell);
        if s.flags().contains(SpellFlags::IGNORE_ATTACKER_MODIFIERS) {
            return 1.0;
        }
        let attacker = &self.units[spell.unit.index()];
        let pseudo = &attacker.pseudo;
        if healing {
            return pseudo.healing_dealt_multiplier * s.tunables.damage_multiplier;
        }
        let table = attacker
            .attack_table(target)
            .map_or(1.0, |t| t.damage_dealt_multiplier);
        pseudo.damage_dealt_multiplier
            * pseudo.school_damage_dealt_multiplier.get(s.school())
            * table
            * s.tunables.damage_multiplier
    }

    /// Periodic tick using a dot snapshot for the caster side
    pub(crate) fn calc_periodic(
        &mut self,
        spell: SpellId,
        target: UnitId,
        snapshot: DotSnapshot,
        roll: OutcomeRoll,
    ) -> ResultHandle {
        if self.spell(spell).config().is_healing() {
            self.resolve_healing(
                spell,
                target,
                snapshot.base,
                snapshot.multiplier,
                roll,
                Some(snapshot.crit_chance),
                true,
            )
        } else {
            self.resolve_damage(
                spell,
                target,
                snapshot.base,
                snapshot.multiplier,
                roll,
                Some(snapshot),
            )
        }
    }

    fn resolve_damage(
        &mut self,
        spell: SpellId,
        target: UnitId,
        base: f64,
        attacker_multiplier: f64,
        roll: OutcomeRoll,
        periodic: Option<DotSnapshot>,
    ) -> ResultHandle {
        let s = self.spell(spell);
        let flags = s.flags();
        let school = s.school();
        let attacker = &self.units[spell.unit.index()];
        let defender = &self.units[target.index()];
        let table = attacker.attack_table(target);

        let mut stages = StageValues {
            base,
            ..Default::default()
        };

        // 2. attacker
        let mut amount = (base * attacker_multiplier).max(0.0);
        stages.after_attacker = amount;

        // 3. target
        if !flags.contains(SpellFlags::IGNORE_TARGET_MODIFIERS) {
            let pseudo = &defender.pseudo;
            amount *= pseudo.damage_taken_multiplier
                * pseudo.school_damage_taken_multiplier.get(school)
                * table.map_or(1.0, |t| t.damage_taken_multiplier);
            amount += pseudo.bonus_damage_taken;
            if school.is_physical() && flags.contains(SpellFlags::INCLUDE_TARGET_BONUS_DAMAGE) {
                amount += pseudo.bonus_physical_damage_taken;
            }
            amount = amount.max(0.0);
        }
        stages.after_target = amount;

        // 4. mitigation
        if let Some(table) = table {
            if school.is_physical() {
                if !flags.contains(SpellFlags::IGNORE_ARMOR) {
                    let pen = attacker.stat(Stat::ArmorPenetration)
                        / self.constants.ratings.armor_pen_per_percent
                        / 100.0;
                    amount *= 1.0 - table.armor_reduction(defender.stat(Stat::Armor), pen);
                }
            } else if school != SpellSchool::Holy {
                let resistance = Stat::resistance_for(school).map_or(0.0, |r| defender.stat(r));
                amount *= 1.0 - table.resistance_mitigation(resistance);
            }
            if periodic.is_some() {
                match school {
                    SpellSchool::Physical | SpellSchool::Holy => {
                        amount *= defender.pseudo.periodic_damage_taken_multiplier.get(school);
                    }
                    SpellSchool::Shadow => {
                        amount *= defender.pseudo.periodic_damage_taken_multiplier.get(school)
                            * table.periodic_shadow_multiplier;
                    }
                    _ => {}
                }
            }
        }
        amount = amount.max(0.0);
        stages.after_mitigation = amount;

        // 5. outcome
        let outcome = self.roll_outcome(spell, target, roll, periodic.map(|p| p.crit_chance));
        let effects = self.outcome_effects(spell, target);
        amount = effects.apply(outcome, amount);

        // 6. clamp
        amount = amount.max(0.0);
        stages.after_outcome = amount;

        let mut result = SpellResult::new(spell, target);
        result.outcome = outcome;
        result.amount = amount;
        result.pre_outcome_amount = stages.after_mitigation;
        result.stages = stages;
        result.periodic = periodic.is_some();
        result.threat = self.threat_for(&result);
        self.record_trace(&result);
        self.results.acquire(result)
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_healing(
        &mut self,
        spell: SpellId,
        target: UnitId,
        base: f64,
        attacker_multiplier: f64,
        roll: OutcomeRoll,
        snapshot_crit: Option<f64>,
        periodic: bool,
    ) -> ResultHandle {
        let flags = self.spell(spell).flags();
        let mut stages = StageValues {
            base,
            ..Default::default()
        };

        let mut amount = (base * attacker_multiplier).max(0.0);
        stages.after_attacker = amount;

        if !flags.contains(SpellFlags::IGNORE_TARGET_MODIFIERS) {
            let table = self.units[spell.unit.index()]
                .attack_table(target)
                .map_or(1.0, |t| t.healing_dealt_multiplier);
            amount *= self.units[target.index()].pseudo.healing_taken_multiplier * table;
            amount = amount.max(0.0);
        }
        stages.after_target = amount;
        stages.after_mitigation = amount;

        let outcome = self.roll_outcome(spell, target, roll, snapshot_crit);
        let effects = self.outcome_effects(spell, target);
        amount = effects.apply(outcome, amount).max(0.0);
        stages.after_outcome = amount;

        let mut result = SpellResult::new(spell, target);
        result.outcome = outcome;
        result.amount = amount;
        result.pre_outcome_amount = stages.after_mitigation;
        result.stages = stages;
        result.periodic = periodic;
        result.healing = true;
        result.threat = self.threat_for(&result);
        self.record_trace(&result);
        self.results.acquire(result)
    }

    fn threat_for(&self, result: &SpellResult) -> f64 {
        if !result.landed() {
            return 0.0;
        }
        let s = self.spell(result.spell);
        let pseudo = &self.units[result.spell.unit.index()].pseudo;
        let mut threat = (result.amount * s.tunables.threat_multiplier + s.tunables.flat_threat_bonus)
            * pseudo.threat_multiplier;
        if s.school() == SpellSchool::Holy {
            threat *= pseudo.holy_spell_threat_multiplier;
        }
        threat.max(0.0)
    }

    fn record_trace(&mut self, result: &SpellResult) {
        trace!(
            spell = %self.spell(result.spell).label(),
            target = result.target.index(),
            base = result.stages.base,
            attacker = result.stages.after_attacker,
            target_mod = result.stages.after_target,
            mitigated = result.stages.after_mitigation,
            outcome = %result.outcome,
            amount = result.amount,
            "resolved"
        );
        let now = self.now();
        if let Some(sink) = self.trace.as_mut() {
            sink.record(&PipelineTrace {
                time: now,
                spell: result.spell,
                target: result.target,
                periodic: result.periodic,
                healing: result.healing,
                stages: result.stages,
                outcome: result.outcome,
                threat: result.threat,
            });
        }
    }

    // ========================================================================
    // Outcome rolls
    // ========================================================================

    /// Band widths for `roll` between the spell's caster and `target`
    pub fn roll_chances(&self, spell: SpellId, target: UnitId, roll: OutcomeRoll) -> RollChances {
        let s = self.spell(spell);
        let school = s.school();
        let attacker = &self.units[spell.unit.index()];
        let defender = &self.units[target.index()];
        let Some(table) = attacker.attack_table(target) else {
            return RollChances::default();
        };
        let ratings = &self.constants.ratings;
        let taken = &defender.pseudo;

        match roll {
            OutcomeRoll::MeleeWhite | OutcomeRoll::MeleeSpecial | OutcomeRoll::Ranged => {
                let hit = (attacker.stat(Stat::MeleeHit)
                    + s.tunables.bonus_hit_rating
                    + taken.bonus_hit_rating_taken)
                    / ratings.melee_hit_per_percent
                    / 100.0;
                let expertise =
                    attacker.stat(Stat::Expertise) / ratings.expertise_per_quarter_percent * 0.0025;
                let crit = (attacker.stat(Stat::MeleeCrit)
                    + s.tunables.bonus_crit_rating
                    + taken.bonus_crit_rating_taken)
                    / ratings.crit_per_percent
                    / 100.0;
                let melee = roll != OutcomeRoll::Ranged;
                let front = attacker.pseudo.in_front_of_target;
                let defense = |stat| defender.stat(stat) / ratings.defense_per_percent / 100.0;

                RollChances {
                    miss: table.melee_miss - hit + taken.reduced_hit_taken_chance.get(school),
                    dodge: if melee && taken.can_dodge {
                        table.dodge + defense(Stat::Dodge) - expertise
                    } else {
                        0.0
                    },
                    parry: if melee && front && taken.can_parry {
                        table.parry + defense(Stat::Parry) - expertise
                    } else {
                        0.0
                    },
                    glance: if roll == OutcomeRoll::MeleeWhite {
                        table.glance
                    } else {
                        0.0
                    },
                    block: if front && taken.can_block {
                        table.block + defense(Stat::Block)
                    } else {
                        0.0
                    },
                    crit: crit - table.crit_suppression,
                }
            }
            _ => {
                let hit = (attacker.stat(Stat::SpellHit)
                    + s.tunables.bonus_hit_rating
                    + taken.bonus_hit_rating_taken)
                    / ratings.spell_hit_per_percent
                    / 100.0;
                let crit = (attacker.stat(Stat::SpellCrit)
                    + s.tunables.bonus_crit_rating
                    + taken.bonus_crit_rating_taken)
                    / ratings.crit_per_percent
                    / 100.0;
                RollChances {
                    miss: table.spell_miss - hit + taken.reduced_hit_taken_chance.get(school),
                    crit,
                    ..Default::default()
                }
            }
        }
    }

    /// Draw an outcome. The number of draws depends only on the roll kind.
    fn roll_outcome(
        &mut self,
        spell: SpellId,
        target: UnitId,
        roll: OutcomeRoll,
        snapshot_crit: Option<f64>,
    ) -> Outcome {
        match roll {
            OutcomeRoll::AlwaysHit | OutcomeRoll::Tick => Outcome::Hit,
            OutcomeRoll::MeleeWhite | OutcomeRoll::MeleeSpecial | OutcomeRoll::Ranged => {
                let chances = self.roll_chances(spell, target, roll);
                let u = self.rng.gen::<f64>();
                resolve_single_roll(&chances, u)
            }
            OutcomeRoll::MagicHitAndCrit => {
                let chances = self.roll_chances(spell, target, roll);
                let hit_roll = self.rng.gen::<f64>();
                let crit_roll = self.rng.gen::<f64>();
                resolve_two_stage(chances.miss, chances.crit, hit_roll, crit_roll)
            }
            OutcomeRoll::MagicHit => {
                let chances = self.roll_chances(spell, target, roll);
                let hit_roll = self.rng.gen::<f64>();
                resolve_two_stage(chances.miss, 0.0, hit_roll, 1.0)
            }
            OutcomeRoll::MagicCrit | OutcomeRoll::HealingCrit => {
                let chances = self.roll_chances(spell, target, roll);
                let crit_roll = self.rng.gen::<f64>();
                resolve_two_stage(0.0, chances.crit, 0.0, crit_roll)
            }
            OutcomeRoll::SnapshotCrit => {
                let crit = match snapshot_crit {
                    Some(chance) => chance,
                    None => self.roll_chances(spell, target, OutcomeRoll::MagicCrit).crit,
                };
                let crit_roll = self.rng.gen::<f64>();
                resolve_two_stage(0.0, crit, 0.0, crit_roll)
            }
        }
    }

    fn outcome_effects(&self, spell: SpellId, target: UnitId) -> OutcomeEffects {
        let s = self.spell(spell);
        let attacker = &self.units[spell.unit.index()];
        OutcomeEffects {
            crit_multiplier: s.tunables.crit_multiplier + attacker.pseudo.crit_damage_bonus,
            block_value: self.units[target.index()].stat(Stat::BlockValue),
            glance_multiplier: attacker
                .attack_table(target)
                .map_or(self.constants.glance_multiplier, |t| t.glance_multiplier),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SimConstants;
    use crate::sim::EncounterConfig;
    use crate::spell::{OutcomeRoll, SpellConfig};
    use crate::stats::{Stat, StatVector};
    use crate::types::{Outcome, ProcMask, SpellFlags, SpellId, SpellSchool, UnitId, UnitKind};
    use crate::unit::UnitConfig;
    use crate::Simulation;

    struct Fixture {
        sim: Simulation,
        player: UnitId,
        boss: UnitId,
    }

    fn setup(boss_stats: StatVector) -> Fixture {
        let mut sim = Simulation::new(SimConstants::default(), EncounterConfig::default());
        let player = sim
            .add_unit(UnitConfig::new("player", UnitKind::Player, 80))
            .unwrap();
        let boss = sim
            .add_unit(UnitConfig::new("boss", UnitKind::Enemy, 80).with_base_stats(boss_stats))
            .unwrap();
        Fixture { sim, player, boss }
    }

    fn spell(f: &mut Fixture, config: SpellConfig) -> SpellId {
        f.sim.register_spell(f.player, config).unwrap()
    }

    fn amount(f: &mut Fixture, spell: SpellId, base: f64) -> f64 {
        let handle = f.sim.calc_damage(spell, f.boss, base, OutcomeRoll::AlwaysHit);
        let amount = f.sim.result(&handle).amount;
        f.sim.deal_damage(handle);
        amount
    }

    #[test]
    fn test_armor_reduces_physical_only() {
        let mut f = setup(StatVector::from_pairs([(Stat::Armor, 10_000.0)]));
        let physical = spell(
            &mut f,
            SpellConfig::new("strike", SpellSchool::Physical, ProcMask::MELEE_MH_SPECIAL),
        );
        let ignore = spell(
            &mut f,
            SpellConfig::new("rend", SpellSchool::Physical, ProcMask::MELEE_MH_SPECIAL)
                .with_flags(SpellFlags::IGNORE_ARMOR),
        );
        let holy = spell(
            &mut f,
            SpellConfig::new("smite", SpellSchool::Holy, ProcMask::SPELL_DAMAGE),
        );
        f.sim.finalize().unwrap();

        let k = f.sim.constants().armor_constant(80);
        let expected = 1000.0 * (1.0 - 10_000.0 / (10_000.0 + k));
        assert!((amount(&mut f, physical, 1000.0) - expected).abs() < 1e-6);
        assert!((amount(&mut f, ignore, 1000.0) - 1000.0).abs() < 1e-9);
        assert!((amount(&mut f, holy, 1000.0) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_ignore_flags_skip_stages() {
        let mut f = setup(StatVector::new());
        let raw = spell(
            &mut f,
            SpellConfig::new("raw", SpellSchool::Fire, ProcMask::SPELL_DAMAGE).with_flags(
                SpellFlags::IGNORE_ATTACKER_MODIFIERS | SpellFlags::IGNORE_TARGET_MODIFIERS,
            ),
        );
        let normal = spell(
            &mut f,
            SpellConfig::new("normal", SpellSchool::Fire, ProcMask::SPELL_DAMAGE)
                .with_damage_multiplier(1.5),
        );
        f.sim.pseudo_stats_mut(f.player).damage_dealt_multiplier = 2.0;
        f.sim.pseudo_stats_mut(f.boss).damage_taken_multiplier = 0.5;
        f.sim.pseudo_stats_mut(f.boss).bonus_damage_taken = 10.0;
        f.sim.finalize().unwrap();

        assert!((amount(&mut f, raw, 100.0) - 100.0).abs() < 1e-9);
        // 100 * 2.0 * 1.5 * 0.5 + 10
        assert!((amount(&mut f, normal, 100.0) - 160.0).abs() < 1e-9);
    }

    #[test]
    fn test_stages_clamp_at_zero() {
        let mut f = setup(StatVector::new());
        let bolt = spell(
            &mut f,
            SpellConfig::new("bolt", SpellSchool::Frost, ProcMask::SPELL_DAMAGE),
        );
        f.sim.pseudo_stats_mut(f.boss).bonus_damage_taken = -500.0;
        f.sim.finalize().unwrap();

        let handle = f.sim.calc_damage(bolt, f.boss, 100.0, OutcomeRoll::AlwaysHit);
        let result = *f.sim.result(&handle);
        f.sim.deal_damage(handle);
        assert!(result.stages.after_target.abs() < f64::EPSILON);
        assert!(result.amount.abs() < f64::EPSILON);
    }

    #[test]
    fn test_healing_path() {
        let mut f = setup(StatVector::new());
        let heal = spell(
            &mut f,
            SpellConfig::new("flash heal", SpellSchool::Holy, ProcMask::SPELL_HEALING)
                .with_flags(SpellFlags::HEALING),
        );
        f.sim.pseudo_stats_mut(f.player).healing_dealt_multiplier = 1.1;
        f.sim.pseudo_stats_mut(f.player).healing_taken_multiplier = 2.0;
        f.sim.finalize().unwrap();

        let player = f.player;
        let handle = f.sim.calc_healing(heal, player, 1000.0, OutcomeRoll::AlwaysHit);
        let result = *f.sim.result(&handle);
        f.sim.deal_healing(handle);
        assert!(result.healing);
        assert!((result.amount - 2200.0).abs() < 1e-9);
        let metrics = f.sim.spell(heal).target_metrics(player).unwrap();
        assert!((metrics.healing - 2200.0).abs() < 1e-9);
        assert!(metrics.damage.abs() < f64::EPSILON);
    }

    #[test]
    fn test_calc_outcome_has_no_amount() {
        let crit = SimConstants::default().ratings.crit_per_percent * 100.0;
        let mut f = setup(StatVector::new());
        f.sim.add_bonus_stat(f.player, Stat::SpellCrit, crit).unwrap();
        let debuff = spell(
            &mut f,
            SpellConfig::new("curse", SpellSchool::Shadow, ProcMask::SPELL_DAMAGE),
        );
        f.sim.finalize().unwrap();

        let handle = f.sim.calc_outcome(debuff, f.boss, OutcomeRoll::MagicCrit);
        assert_eq!(f.sim.result(&handle).outcome, Outcome::Hit);
        assert!(f.sim.result(&handle).amount.abs() < f64::EPSILON);
        f.sim.deal_damage(handle);
    }

    #[test]
    fn test_crit_and_block_effects() {
        let constants = SimConstants::default();
        let crit = constants.ratings.crit_per_percent * 100.0;
        let block = constants.ratings.defense_per_percent * 100.0;
        let mut f = setup(StatVector::from_pairs([
            (Stat::Block, block),
            (Stat::BlockValue, 30.0),
        ]));
        f.sim.add_bonus_stat(f.player, Stat::SpellCrit, crit).unwrap();
        let blocked = spell(
            &mut f,
            SpellConfig::new("shot", SpellSchool::Physical, ProcMask::RANGED_SPECIAL)
                .with_flags(SpellFlags::IGNORE_ARMOR),
        );
        let nuke = spell(
            &mut f,
            SpellConfig::new("nuke", SpellSchool::Arcane, ProcMask::SPELL_DAMAGE),
        );
        f.sim.pseudo_stats_mut(f.player).in_front_of_target = true;
        f.sim.pseudo_stats_mut(f.player).crit_damage_bonus = 0.5;
        f.sim.finalize().unwrap();

        let boss = f.boss;
        let handle = f.sim.calc_damage(blocked, boss, 100.0, OutcomeRoll::Ranged);
        let result = *f.sim.result(&handle);
        f.sim.deal_damage(handle);
        // Miss band 5%, block band covers the rest of the first 100%
        if result.outcome == Outcome::Block {
            assert!((result.amount - 70.0).abs() < 1e-9);
        } else {
            assert_eq!(result.outcome, Outcome::Miss);
        }

        let handle = f.sim.calc_damage(nuke, boss, 100.0, OutcomeRoll::MagicCrit);
        let result = *f.sim.result(&handle);
        f.sim.deal_damage(handle);
        assert_eq!(result.outcome, Outcome::Crit);
        let expected = 100.0 * (f.sim.spell(nuke).tunables.crit_multiplier + 0.5);
        assert!((result.amount - expected).abs() < 1e-9);
    }
}
