//! Spell results and the pooled arena that holds them in flight

use crate::types::{Outcome, SpellId, UnitId};
use serde::Serialize;

/// Amount after each resolution stage
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct StageValues {
    pub base: f64,
    pub after_attacker: f64,
    pub after_target: f64,
    pub after_mitigation: f64,
    pub after_outcome: f64,
}

/// Outcome of resolving one spell against one target
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpellResult {
    pub spell: SpellId,
    pub target: UnitId,
    pub outcome: Outcome,
    pub amount: f64,
    pub threat: f64,
    /// Amount going into the outcome roll
    pub pre_outcome_amount: f64,
    pub stages: StageValues,
    pub periodic: bool,
    pub healing: bool,
}

impl SpellResult {
    pub fn new(spell: SpellId, target: UnitId) -> Self {
        SpellResult {
            spell,
            target,
            outcome: Outcome::Empty,
            amount: 0.0,
            threat: 0.0,
            pre_outcome_amount: 0.0,
            stages: StageValues::default(),
            periodic: false,
            healing: false,
        }
    }

    pub fn landed(&self) -> bool {
        self.outcome.landed()
    }
}

/// Owning handle to an arena slot
///
/// Not `Clone`: a handle is released exactly once, which consumes it. A
/// handle dropped without being dealt or released leaks its slot until the
/// arena is cleared on reset.
#[must_use = "a result handle must be dealt or released, or its slot leaks until reset"]
#[derive(Debug, PartialEq, Eq)]
pub struct ResultHandle(usize);

/// Pool of result slots reused across computations
#[derive(Debug, Default)]
pub struct ResultArena {
    slots: Vec<SpellResult>,
    free: Vec<usize>,
}

impl ResultArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `result` in a free slot. The slot stays in use until the
    /// handle is released or the arena is cleared.
    pub fn acquire(&mut self, result: SpellResult) -> ResultHandle {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = result;
                ResultHandle(index)
            }
            None => {
                self.slots.push(result);
                ResultHandle(self.slots.len() - 1)
            }
        }
    }

    pub fn get(&self, handle: &ResultHandle) -> &SpellResult {
        &self.slots[handle.0]
    }

    pub fn get_mut(&mut self, handle: &ResultHandle) -> &mut SpellResult {
        &mut self.slots[handle.0]
    }

    /// Copy a result into a fresh slot
    pub fn duplicate(&mut self, handle: &ResultHandle) -> ResultHandle {
        let copy = *self.get(handle);
        self.acquire(copy)
    }

    /// Return the slot to the pool, yielding its final contents
    pub fn release(&mut self, handle: ResultHandle) -> SpellResult {
        let result = self.slots[handle.0];
        self.free.push(handle.0);
        result
    }

    /// Slots currently handed out
    pub fn in_use(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Forget every slot. Outstanding handles must not be used afterwards.
    pub fn clear(&mut self) {
        self.free.clear();
        self.free.extend((0..self.slots.len()).rev());
    }
}
