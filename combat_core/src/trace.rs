//! Diagnostic sink for resolution stage values
//!
//! Recording never feeds back into the simulation.

use crate::spell::StageValues;
use crate::types::{Outcome, SpellId, UnitId};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// One resolved damage or healing computation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PipelineTrace {
    pub time: Duration,
    pub spell: SpellId,
    pub target: UnitId,
    pub periodic: bool,
    pub healing: bool,
    pub stages: StageValues,
    pub outcome: Outcome,
    pub threat: f64,
}

pub trait TraceSink {
    fn record(&mut self, trace: &PipelineTrace);
}

/// Collects traces into a shared vector
#[derive(Debug, Clone, Default)]
pub struct VecTraceSink {
    records: Rc<RefCell<Vec<PipelineTrace>>>,
}

impl VecTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of everything recorded so far
    pub fn records(&self) -> Rc<RefCell<Vec<PipelineTrace>>> {
        Rc::clone(&self.records)
    }
}

impl TraceSink for VecTraceSink {
    fn record(&mut self, trace: &PipelineTrace) {
        self.records.borrow_mut().push(*trace);
    }
}
