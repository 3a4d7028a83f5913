//! Cast validation, cost, cooldowns, global cooldown and cast completion

use crate::hooks::CastHook;
use crate::types::{SpellFlags, SpellId, UnitId};
use crate::unit::Hardcast;
use crate::Simulation;
use std::time::Duration;
use tracing::debug;

impl Simulation {
    /// Whether `cast` would succeed right now
    pub fn can_cast(&self, spell: SpellId) -> bool {
        if !self.is_finalized() {
            return false;
        }
        let now = self.now();
        let unit = &self.units[spell.unit.index()];
        let s = self.spell(spell);

        if unit.is_hardcasting(now) {
            return false;
        }
        if !s.flags().contains(SpellFlags::BYPASS_GCD) && !unit.gcd.is_ready(now) {
            return false;
        }
        if let Some(timer) = s.cooldown_timer {
            if !unit.timers[timer.index].is_ready(now) {
                return false;
            }
        }
        if let Some(shared) = s.config().shared_cooldown {
            if !unit.timers[shared.timer.index].is_ready(now) {
                return false;
            }
        }
        let cost = s.tunables.cost;
        cost <= 0.0 || unit.resource.as_ref().is_some_and(|r| r.can_afford(cost))
    }

    /// Start casting `spell` at `target`
    ///
    /// Returns `false` without side effects if the unit is mid-cast, the GCD
    /// or a cooldown is running, or the cost cannot be paid.
    pub fn cast(&mut self, spell: SpellId, target: UnitId) -> bool {
        if !self.can_cast(spell) {
            return false;
        }
        let now = self.now();
        let constants = &self.constants;
        let unit = &mut self.units[spell.unit.index()];
        let cast_speed = unit.cast_speed(constants);
        let s = &unit.spells[spell.index];
        let label = s.label().to_string();
        let flags = s.flags();
        let cost = s.tunables.cost;
        let cooldown = s.cooldown_timer.zip(s.config().cooldown);
        let shared = s.config().shared_cooldown;
        let gcd = s.config().gcd.unwrap_or(constants.gcd.default);
        let hasted_gcd = !s.school().is_physical() && !flags.contains(SpellFlags::IGNORE_HASTE);
        let cast_time = s.config().cast_time;
        let gcd_min = constants.gcd.min;

        if cost > 0.0 && !unit.resource.as_mut().is_some_and(|r| r.spend(cost, &label)) {
            return false;
        }
        if let Some((timer, duration)) = cooldown {
            unit.timers[timer.index].arm(now, duration);
        }
        if let Some(shared) = shared {
            unit.timers[shared.timer.index].arm(now, shared.duration);
        }
        if !flags.contains(SpellFlags::BYPASS_GCD) && !gcd.is_zero() {
            let gcd = if hasted_gcd {
                gcd.div_f64(cast_speed).max(gcd_min.min(gcd))
            } else {
                gcd
            };
            unit.gcd.arm(now, gcd);
        }
        unit.spells[spell.index].casts += 1;

        let cast_time = if flags.contains(SpellFlags::IGNORE_HASTE) {
            cast_time
        } else {
            cast_time.div_f64(cast_speed)
        };
        debug!(
            unit = %unit.label(),
            spell = %label,
            target = target.index(),
            cast_time = ?cast_time,
            "cast"
        );

        if cast_time.is_zero() {
            self.complete_cast(spell, target);
        } else {
            let ends_at = now + cast_time;
            self.units[spell.unit.index()].hardcast = Some(Hardcast { spell, ends_at });
            self.scheduler.schedule(
                ends_at,
                Box::new(move |sim: &mut Simulation| sim.complete_cast(spell, target)),
            );
        }
        true
    }

    fn complete_cast(&mut self, spell: SpellId, target: UnitId) {
        let unit = spell.unit;
        if self.units[unit.index()]
            .hardcast
            .is_some_and(|h| h.spell == spell)
        {
            self.units[unit.index()].hardcast = None;
        }

        let hooks: Vec<CastHook> = self.units[unit.index()].hooks.cast_complete.clone();
        for hook in hooks {
            hook(self, spell);
        }
        self.fire_aura_cast_hooks(spell);

        self.apply_spell_effects(spell, target);
        let now = self.now();
        self.request_decision(unit, now);
    }

    /// The spell's effect callback, its dot, or a direct hit from its base
    /// amount formula
    fn apply_spell_effects(&mut self, spell: SpellId, target: UnitId) {
        let config = self.spell(spell).config();
        if let Some(effects) = config.apply_effects.clone() {
            effects(self, spell, target);
            return;
        }
        if config.dot.is_some() {
            self.apply_dot(spell, target);
            return;
        }
        let Some(formula) = config.base_amount.clone() else {
            return;
        };
        let roll = config.outcome;
        let healing = config.is_healing();
        let base = formula(self, spell, target);
        if healing {
            self.calc_and_deal_healing(spell, target, base, roll);
        } else {
            self.calc_and_deal_damage(spell, target, base, roll);
        }
    }

    /// Remaining cooldown of a spell's own timer
    pub fn cooldown_remaining(&self, spell: SpellId) -> Duration {
        let s = self.spell(spell);
        s.cooldown_timer.map_or(Duration::ZERO, |t| {
            self.units[spell.unit.index()].timers[t.index].remaining(self.now())
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SimConstants;
    use crate::resource::ResourceConfig;
    use crate::sim::EncounterConfig;
    use crate::spell::{OutcomeRoll, SpellConfig};
    use crate::stats::{Stat, StatVector};
    use crate::types::{ProcMask, SpellFlags, SpellSchool, UnitId, UnitKind};
    use crate::unit::{UnitConfig, MIN_CAST_SPEED};
    use crate::Simulation;
    use std::time::Duration;

    fn setup(haste_percent: f64) -> (Simulation, UnitId, UnitId) {
        let constants = SimConstants::default();
        let haste = constants.ratings.haste_per_percent * haste_percent;
        let mut sim = Simulation::new(
            constants,
            EncounterConfig {
                duration: Duration::from_secs(60),
                ..Default::default()
            },
        );
        let player = sim
            .add_unit(
                UnitConfig::new("player", UnitKind::Player, 80)
                    .with_base_stats(StatVector::from_pairs([(Stat::SpellHaste, haste)]))
                    .with_resource(ResourceConfig::mana(1000.0)),
            )
            .unwrap();
        let boss = sim
            .add_unit(UnitConfig::new("boss", UnitKind::Enemy, 80))
            .unwrap();
        (sim, player, boss)
    }

    fn nuke(cost: f64) -> SpellConfig {
        SpellConfig::new("nuke", SpellSchool::Arcane, ProcMask::SPELL_DAMAGE)
            .with_cost(cost)
            .with_flat_amount(100.0)
            .with_outcome(OutcomeRoll::AlwaysHit)
    }

    #[test]
    fn test_cast_spends_and_arms_gcd() {
        let (mut sim, player, boss) = setup(0.0);
        let spell = sim.register_spell(player, nuke(200.0)).unwrap();
        sim.finalize().unwrap();

        assert!(sim.cast(spell, boss));
        assert!((sim.current_resource(player) - 800.0).abs() < f64::EPSILON);
        assert_eq!(sim.unit(player).gcd_ready_at(), Duration::from_millis(1500));
        assert!(!sim.cast(spell, boss));
        assert_eq!(sim.spell(spell).casts(), 1);
    }

    #[test]
    fn test_insufficient_cost_has_no_side_effects() {
        let (mut sim, player, boss) = setup(0.0);
        let spell = sim.register_spell(player, nuke(5000.0)).unwrap();
        sim.finalize().unwrap();

        assert!(!sim.cast(spell, boss));
        assert!((sim.current_resource(player) - 1000.0).abs() < f64::EPSILON);
        assert_eq!(sim.unit(player).gcd_ready_at(), Duration::ZERO);
        assert_eq!(sim.spell(spell).casts(), 0);
    }

    #[test]
    fn test_haste_shortens_gcd_down_to_floor() {
        let (mut sim, player, boss) = setup(100.0);
        let spell = sim.register_spell(player, nuke(0.0)).unwrap();
        sim.finalize().unwrap();

        assert!(sim.cast(spell, boss));
        // 1.5 s / 2.0 = 0.75 s, floored at 1 s
        assert_eq!(sim.unit(player).gcd_ready_at(), Duration::from_secs(1));
    }

    #[test]
    fn test_cooldown_blocks_recast() {
        let (mut sim, player, boss) = setup(0.0);
        let spell = sim
            .register_spell(
                player,
                nuke(0.0)
                    .with_cooldown(Duration::from_secs(10))
                    .with_flags(SpellFlags::BYPASS_GCD),
            )
            .unwrap();
        sim.finalize().unwrap();

        assert!(sim.cast(spell, boss));
        assert!(!sim.cast(spell, boss));
        assert_eq!(sim.cooldown_remaining(spell), Duration::from_secs(10));
    }

    #[test]
    fn test_shared_cooldown() {
        let (mut sim, player, boss) = setup(0.0);
        let timer = sim.new_timer(player).unwrap();
        let a = sim
            .register_spell(
                player,
                SpellConfig::new("a", SpellSchool::Physical, ProcMask::EMPTY)
                    .with_flags(SpellFlags::BYPASS_GCD)
                    .with_shared_cooldown(timer, Duration::from_secs(20)),
            )
            .unwrap();
        let b = sim
            .register_spell(
                player,
                SpellConfig::new("b", SpellSchool::Physical, ProcMask::EMPTY)
                    .with_flags(SpellFlags::BYPASS_GCD)
                    .with_shared_cooldown(timer, Duration::from_secs(20)),
            )
            .unwrap();
        sim.finalize().unwrap();

        assert!(sim.cast(a, player));
        assert!(!sim.can_cast(b));
        assert!(!sim.is_timer_ready(timer));
    }

    #[test]
    fn test_cast_speed_floor_keeps_cast_times_finite() {
        let (mut sim, player, boss) = setup(-150.0);
        let spell = sim
            .register_spell(player, nuke(0.0).with_cast_time(Duration::from_secs(2)))
            .unwrap();
        sim.finalize().unwrap();

        let constants = SimConstants::default();
        assert_eq!(sim.unit(player).cast_speed(&constants), MIN_CAST_SPEED);
        assert!(sim.cast(spell, boss));
        let ends_at = sim.unit(player).hardcast().unwrap().ends_at;
        assert!((ends_at.as_secs_f64() - 2.0 / MIN_CAST_SPEED).abs() < 1e-6);

        sim.pseudo_stats_mut(player).cast_speed_multiplier = 0.0;
        assert_eq!(sim.unit(player).cast_speed(&constants), MIN_CAST_SPEED);
    }

    #[test]
    fn test_hardcast_completes_after_hasted_cast_time() {
        let (mut sim, player, boss) = setup(25.0);
        let spell = sim
            .register_spell(player, nuke(0.0).with_cast_time(Duration::from_millis(2500)))
            .unwrap();
        sim.finalize().unwrap();

        assert!(sim.cast(spell, boss));
        assert!(sim.unit(player).is_hardcasting(sim.now()));
        assert!(!sim.cast(spell, boss));

        crate::sim::advance(&mut sim);
        assert_eq!(sim.now(), Duration::from_secs(2));
        assert!(!sim.unit(player).is_hardcasting(sim.now()));
        let metrics = sim.spell(spell).target_metrics(boss).unwrap();
        assert_eq!(metrics.events, 1);
    }
}
