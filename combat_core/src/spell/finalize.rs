//! Landing results: metrics, health, encounter tracking and proc hooks

use super::ResultHandle;
use crate::hooks::{ResultEvent, SpellResultHook};
use crate::types::{SpellFlags, UnitKind};
use crate::Simulation;
use std::rc::Rc;
use std::time::Duration;
use tracing::{trace, warn};

impl Simulation {
    /// Land a damage result now, or after missile travel time
    pub fn deal_damage(&mut self, handle: ResultHandle) {
        self.deal(handle);
    }

    /// Land a healing result now, or after missile travel time
    pub fn deal_healing(&mut self, handle: ResultHandle) {
        self.deal(handle);
    }

    fn deal(&mut self, handle: ResultHandle) {
        let result = *self.results.get(&handle);
        let speed = self.spell(result.spell).config().missile_speed.unwrap_or(0.0);
        let distance = self.units[result.spell.unit.index()].distance_from_target;
        if speed > 0.0 && distance > 0.0 {
            let now = self.now();
            let lands_at = Duration::try_from_secs_f64(distance / speed)
                .ok()
                .and_then(|delay| now.checked_add(delay));
            let Some(lands_at) = lands_at else {
                warn!(spell = %self.spell(result.spell).label(), distance, "missile can never land");
                self.results.release(handle);
                return;
            };
            // The outcome is already rolled; only landing waits
            let copy = self.results.duplicate(&handle);
            self.results.release(handle);
            trace!(spell = %self.spell(result.spell).label(), delay = ?(lands_at - now), "missile launched");
            self.scheduler
                .schedule(lands_at, Box::new(move |sim: &mut Simulation| sim.land_result(copy)));
            return;
        }
        self.land_result(handle);
    }

    /// Apply a resolved result and release its slot
    pub(crate) fn land_result(&mut self, handle: ResultHandle) {
        let result = *self.results.get(&handle);
        let spell = result.spell;
        let caster = spell.unit;
        let target = result.target;
        let flags = self.spell(spell).flags();

        if !flags.contains(SpellFlags::NO_METRICS) {
            if let Some(metrics) = self.spell_mut(spell).targets.get_mut(target.index()) {
                metrics.record(&result);
            }
        }

        let defender = &mut self.units[target.index()];
        if let Some(health) = defender.health.as_mut() {
            if result.healing {
                health.heal(result.amount);
            } else {
                health.damage(result.amount);
            }
        }
        if !result.healing && defender.kind() == UnitKind::Enemy {
            self.encounter.record_damage(result.amount);
        }

        if !flags.contains(SpellFlags::NO_ON_HIT_HOOKS) {
            let (dealt, taken) = ResultEvent::for_result(&result);
            let hooks: Vec<SpellResultHook> = self.units[caster.index()]
                .hooks
                .result_hooks(dealt)
                .iter()
                .chain(self.units[target.index()].hooks.result_hooks(taken))
                .map(Rc::clone)
                .collect();
            for hook in hooks {
                hook(self, &result);
            }
            self.fire_aura_result_hooks(caster, dealt, &result);
            self.fire_aura_result_hooks(target, taken, &result);
        }

        self.results.release(handle);
    }
}
