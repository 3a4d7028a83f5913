//! Aura engine: timed, stackable buffs and debuffs
//!
//! An aura is either inactive or active with a stack count in
//! `0..=max_stacks`. Every activation or refresh bumps the aura's generation
//! and schedules an expiry tagged with it; an expiry whose tag no longer
//! matches is stale and does nothing. That is the only cancellation
//! mechanism.
//!
//! Pseudo-stat modifiers and dependency edges listed on the config are
//! managed by the engine: applied on gain, undone on expire. Edges are held
//! rather than toggled, so an edge shared by two auras stays on until both
//! have expired.
//!
//! Expiry runs at the start of the instant it falls on, before any other
//! action due then, so `is_aura_active` and the applied effects never
//! disagree.

use crate::error::SetupError;
use crate::hooks::{AuraCallback, AuraCastHook, AuraResultHook, ResultEvent, StackCallback};
use crate::spell::SpellResult;
use crate::stats::{is_invertible, MultiplierKind};
use crate::types::{AuraId, DependencyId, SpellId, UnitId};
use crate::Simulation;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, warn};

/// Immutable aura definition
#[derive(Clone)]
pub struct AuraConfig {
    pub label: String,
    /// `None` for auras that last until expired explicitly
    pub duration: Option<Duration>,
    /// Zero for auras without stacks
    pub max_stacks: u32,
    /// Every activation adds a stack
    pub stack_on_activate: bool,
    /// Activated at the start of every iteration
    pub active_at_start: bool,
    pub on_gain: Option<AuraCallback>,
    pub on_expire: Option<AuraCallback>,
    pub on_stacks_change: Option<StackCallback>,
    pub modifiers: Vec<(MultiplierKind, f64)>,
    pub dependencies: Vec<DependencyId>,
    pub on_cast_complete: Option<AuraCastHook>,
    pub procs: Vec<(ResultEvent, AuraResultHook)>,
}

impl fmt::Debug for AuraConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuraConfig")
            .field("label", &self.label)
            .field("duration", &self.duration)
            .field("max_stacks", &self.max_stacks)
            .field("stack_on_activate", &self.stack_on_activate)
            .field("active_at_start", &self.active_at_start)
            .field("modifiers", &self.modifiers)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

impl AuraConfig {
    pub fn new(label: impl Into<String>, duration: Duration) -> Self {
        Self::build(label.into(), Some(duration))
    }

    /// An aura without a duration
    pub fn permanent(label: impl Into<String>) -> Self {
        Self::build(label.into(), None)
    }

    fn build(label: String, duration: Option<Duration>) -> Self {
        AuraConfig {
            label,
            duration,
            max_stacks: 0,
            stack_on_activate: false,
            active_at_start: false,
            on_gain: None,
            on_expire: None,
            on_stacks_change: None,
            modifiers: Vec::new(),
            dependencies: Vec::new(),
            on_cast_complete: None,
            procs: Vec::new(),
        }
    }

    pub fn with_max_stacks(mut self, max_stacks: u32) -> Self {
        self.max_stacks = max_stacks;
        self
    }

    pub fn stacking_on_activate(mut self) -> Self {
        self.stack_on_activate = true;
        self
    }

    pub fn active_at_start(mut self) -> Self {
        self.active_at_start = true;
        self
    }

    pub fn with_modifier(mut self, kind: MultiplierKind, factor: f64) -> Self {
        self.modifiers.push((kind, factor));
        self
    }

    pub fn with_dependency(mut self, dependency: DependencyId) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn on_gain<F: Fn(&mut Simulation, AuraId) + 'static>(mut self, f: F) -> Self {
        self.on_gain = Some(Rc::new(f));
        self
    }

    pub fn on_expire<F: Fn(&mut Simulation, AuraId) + 'static>(mut self, f: F) -> Self {
        self.on_expire = Some(Rc::new(f));
        self
    }

    pub fn on_stacks_change<F: Fn(&mut Simulation, AuraId, u32, u32) + 'static>(
        mut self,
        f: F,
    ) -> Self {
        self.on_stacks_change = Some(Rc::new(f));
        self
    }

    pub fn on_cast_complete<F: Fn(&mut Simulation, AuraId, SpellId) + 'static>(
        mut self,
        f: F,
    ) -> Self {
        self.on_cast_complete = Some(Rc::new(f));
        self
    }

    pub fn with_proc<F: Fn(&mut Simulation, AuraId, &SpellResult) + 'static>(
        mut self,
        event: ResultEvent,
        f: F,
    ) -> Self {
        self.procs.push((event, Rc::new(f)));
        self
    }

    fn validate(&self, unit: UnitId) -> Result<(), SetupError> {
        if self.stack_on_activate && self.max_stacks == 0 {
            return Err(SetupError::InvalidStacks {
                label: self.label.clone(),
                max_stacks: self.max_stacks,
            });
        }
        if let Some((_, factor)) = self.modifiers.iter().find(|(_, f)| !is_invertible(*f)) {
            return Err(SetupError::InvalidMultiplier {
                label: self.label.clone(),
                factor: *factor,
            });
        }
        if self.dependencies.iter().any(|d| d.unit != unit) {
            return Err(SetupError::ForeignHandle);
        }
        Ok(())
    }
}

/// Mutable aura state for one iteration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AuraState {
    pub active: bool,
    pub stacks: u32,
    pub generation: u64,
    pub started_at: Duration,
    pub expires_at: Option<Duration>,
    pub uptime: Duration,
    pub activations: u32,
    pub refreshes: u32,
    expiring: bool,
}

/// A registered aura
pub struct Aura {
    id: AuraId,
    config: AuraConfig,
    state: AuraState,
}

impl Aura {
    pub fn id(&self) -> AuraId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.config.label
    }

    pub fn config(&self) -> &AuraConfig {
        &self.config
    }

    pub fn state(&self) -> &AuraState {
        &self.state
    }

    pub fn is_active_at(&self, now: Duration) -> bool {
        self.state.active && self.state.expires_at.map_or(true, |end| now < end)
    }

    /// Uptime including the currently running activation, cut at `now`
    pub fn uptime_at(&self, now: Duration) -> Duration {
        if !self.state.active {
            return self.state.uptime;
        }
        let end = self.state.expires_at.map_or(now, |e| e.min(now));
        self.state.uptime + end.saturating_sub(self.state.started_at)
    }

    pub(crate) fn reset(&mut self) {
        self.state = AuraState::default();
    }
}

impl Simulation {
    // ========================================================================
    // Setup
    // ========================================================================

    /// Register an aura on `unit`. Labels are unique per unit.
    pub fn register_aura(&mut self, unit: UnitId, config: AuraConfig) -> Result<AuraId, SetupError> {
        self.check_setup(unit)?;
        config.validate(unit)?;
        let owner = &mut self.units[unit.index()];
        if owner.aura_labels.contains_key(&config.label) {
            return Err(SetupError::DuplicateAuraLabel(config.label));
        }
        for dep in &config.dependencies {
            if owner.stats.dependency(dep.index).is_none() {
                return Err(SetupError::ForeignHandle);
            }
        }

        let id = AuraId {
            unit,
            index: owner.auras.len(),
        };
        owner.aura_labels.insert(config.label.clone(), id.index);
        owner.auras.push(Aura {
            id,
            config,
            state: AuraState::default(),
        });
        Ok(id)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn aura(&self, id: AuraId) -> &Aura {
        &self.units[id.unit.index()].auras[id.index]
    }

    pub fn aura_by_label(&self, unit: UnitId, label: &str) -> Option<AuraId> {
        let index = *self.units.get(unit.index())?.aura_labels.get(label)?;
        Some(AuraId { unit, index })
    }

    /// Active exactly on `[start, start + duration)`
    pub fn is_aura_active(&self, id: AuraId) -> bool {
        self.aura(id).is_active_at(self.now())
    }

    pub fn aura_stacks(&self, id: AuraId) -> u32 {
        let aura = self.aura(id);
        if aura.is_active_at(self.now()) {
            aura.state.stacks
        } else {
            0
        }
    }

    /// Time left before expiry; `None` if inactive or permanent
    pub fn aura_remaining(&self, id: AuraId) -> Option<Duration> {
        let aura = self.aura(id);
        if !aura.is_active_at(self.now()) {
            return None;
        }
        aura.state.expires_at.map(|end| end.saturating_sub(self.now()))
    }

    fn aura_mut(&mut self, id: AuraId) -> &mut Aura {
        &mut self.units[id.unit.index()].auras[id.index]
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Activate, or refresh if already active. Gain is only invoked on the
    /// inactive to active transition.
    pub fn activate_aura(&mut self, id: AuraId) {
        let now = self.now();
        let (was_active, duration, stack_on_activate) = {
            let aura = self.aura(id);
            (
                aura.is_active_at(now),
                aura.config.duration,
                aura.config.stack_on_activate,
            )
        };

        if was_active {
            let aura = self.aura_mut(id);
            aura.state.generation += 1;
            aura.state.refreshes += 1;
            aura.state.expires_at = duration.map(|d| now + d);
            let generation = aura.state.generation;
            debug!(aura = %aura.config.label, at = ?now, "aura refreshed");
            self.schedule_aura_expiry(id, generation, duration);
        } else {
            // An aura still flagged active past its expiry has not had its
            // expiry action run yet; close it out first.
            if self.aura(id).state.active {
                self.expire_aura(id);
            }
            let aura = self.aura_mut(id);
            aura.state.active = true;
            aura.state.stacks = 0;
            aura.state.generation += 1;
            aura.state.activations += 1;
            aura.state.started_at = now;
            aura.state.expires_at = duration.map(|d| now + d);
            let generation = aura.state.generation;
            debug!(aura = %aura.config.label, at = ?now, "aura gained");

            self.schedule_aura_expiry(id, generation, duration);
            self.apply_aura_effects(id, true);
            if let Some(on_gain) = self.aura(id).config.on_gain.clone() {
                on_gain(self, id);
            }
        }

        if stack_on_activate {
            self.add_aura_stack(id, 1);
        }
    }

    fn schedule_aura_expiry(&mut self, id: AuraId, generation: u64, duration: Option<Duration>) {
        let Some(duration) = duration else {
            return;
        };
        self.scheduler.schedule_in(
            duration,
            Box::new(move |sim: &mut Simulation| {
                let state = sim.aura(id).state;
                if state.active && state.generation == generation {
                    sim.expire_aura(id);
                }
            }),
        );
    }

    /// Expire an active aura: stacks drop to zero, the expire callback runs,
    /// managed effects are undone, and uptime is recorded
    pub fn expire_aura(&mut self, id: AuraId) {
        let state = self.aura(id).state;
        if !state.active || state.expiring {
            return;
        }
        self.aura_mut(id).state.expiring = true;

        let old_stacks = self.aura(id).state.stacks;
        if old_stacks > 0 {
            self.aura_mut(id).state.stacks = 0;
            if let Some(cb) = self.aura(id).config.on_stacks_change.clone() {
                cb(self, id, old_stacks, 0);
            }
        }
        if let Some(on_expire) = self.aura(id).config.on_expire.clone() {
            on_expire(self, id);
        }
        self.apply_aura_effects(id, false);

        let now = self.now();
        let aura = self.aura_mut(id);
        let end = aura.state.expires_at.map_or(now, |e| e.min(now));
        aura.state.uptime += end.saturating_sub(aura.state.started_at);
        aura.state.active = false;
        aura.state.stacks = 0;
        aura.state.expires_at = None;
        aura.state.generation += 1;
        aura.state.expiring = false;
        debug!(aura = %aura.config.label, at = ?now, "aura expired");
    }

    pub fn add_aura_stack(&mut self, id: AuraId, count: u32) {
        let stacks = self.aura(id).state.stacks.saturating_add(count);
        self.set_aura_stacks(id, stacks);
    }

    pub fn remove_aura_stack(&mut self, id: AuraId, count: u32) {
        let stacks = self.aura(id).state.stacks.saturating_sub(count);
        self.set_aura_stacks(id, stacks);
    }

    /// Set the stack count, clamped to `max_stacks`
    pub fn set_aura_stacks(&mut self, id: AuraId, stacks: u32) {
        let now = self.now();
        let aura = self.aura(id);
        if aura.config.max_stacks == 0 {
            warn!(aura = %aura.config.label, "stack change on an aura without stacks ignored");
            return;
        }
        if !aura.is_active_at(now) {
            warn!(aura = %aura.config.label, "stack change on an inactive aura ignored");
            return;
        }
        let old = aura.state.stacks;
        let new = stacks.min(aura.config.max_stacks);
        if old == new {
            return;
        }
        self.aura_mut(id).state.stacks = new;
        if let Some(cb) = self.aura(id).config.on_stacks_change.clone() {
            cb(self, id, old, new);
        }
    }

    fn apply_aura_effects(&mut self, id: AuraId, gain: bool) {
        let unit = &mut self.units[id.unit.index()];
        let aura = &unit.auras[id.index];
        for &(kind, factor) in &aura.config.modifiers {
            if gain {
                unit.pseudo.apply(kind, factor);
            } else {
                unit.pseudo.undo(kind, factor);
            }
        }
        for dep in &aura.config.dependencies {
            if gain {
                unit.stats.hold(dep.index);
            } else {
                unit.stats.release(dep.index);
            }
        }
    }

    /// Expire every aura whose end time has been reached
    pub(crate) fn expire_overdue_auras(&mut self) {
        let now = self.now();
        let overdue: Vec<AuraId> = self
            .units
            .iter()
            .flat_map(|u| u.auras.iter())
            .filter(|a| a.state.active && a.state.expires_at.is_some_and(|end| end <= now))
            .map(|a| a.id)
            .collect();
        for id in overdue {
            self.expire_aura(id);
        }
    }

    /// Activate every `active_at_start` aura
    pub(crate) fn activate_start_auras(&mut self) {
        let ids: Vec<AuraId> = self
            .units
            .iter()
            .flat_map(|u| u.auras.iter())
            .filter(|a| a.config.active_at_start)
            .map(|a| a.id)
            .collect();
        for id in ids {
            self.activate_aura(id);
        }
    }

    // ========================================================================
    // Aura-scoped hooks
    // ========================================================================

    pub(crate) fn fire_aura_result_hooks(
        &mut self,
        unit: UnitId,
        event: ResultEvent,
        result: &SpellResult,
    ) {
        let now = self.now();
        let mut hooks: Vec<(AuraId, AuraResultHook)> = Vec::new();
        for aura in &self.units[unit.index()].auras {
            if !aura.is_active_at(now) {
                continue;
            }
            for (e, hook) in &aura.config.procs {
                if *e == event {
                    hooks.push((aura.id, Rc::clone(hook)));
                }
            }
        }
        for (id, hook) in hooks {
            if self.is_aura_active(id) {
                hook(self, id, result);
            }
        }
    }

    pub(crate) fn fire_aura_cast_hooks(&mut self, spell: SpellId) {
        let now = self.now();
        let hooks: Vec<(AuraId, AuraCastHook)> = self.units[spell.unit.index()]
            .auras
            .iter()
            .filter(|a| a.is_active_at(now))
            .filter_map(|a| a.config.on_cast_complete.clone().map(|h| (a.id, h)))
            .collect();
        for (id, hook) in hooks {
            if self.is_aura_active(id) {
                hook(self, id, spell);
            }
        }
    }
}
