//! Time-ordered pending-action queue
//!
//! Actions are closures over the owning context. The queue is a min-heap on
//! `(fire_time, seq)`, so two actions due at the same instant run in the order
//! they were scheduled. The scheduler knows nothing about termination; the
//! owner decides when to stop calling [`advance`].

use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;
use std::time::Duration;
use tracing::trace;

/// A one-shot action over the context `C`
pub type Action<C> = Box<dyn FnOnce(&mut C)>;

/// Anything that owns a scheduler of actions over itself
pub trait ScheduleContext: Sized {
    fn scheduler(&self) -> &Scheduler<Self>;
    fn scheduler_mut(&mut self) -> &mut Scheduler<Self>;

    /// Called once the clock reaches a new instant, before any action due
    /// then runs
    fn on_advance(&mut self) {}
}

struct Pending<C> {
    at: Duration,
    seq: u64,
    action: Action<C>,
}

impl<C> PartialEq for Pending<C> {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl<C> Eq for Pending<C> {}

impl<C> PartialOrd for Pending<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C> Ord for Pending<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; earliest (time, seq) must compare greatest
        other
            .at
            .cmp(&self.at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Simulation clock plus the pending-action queue
pub struct Scheduler<C> {
    now: Duration,
    next_seq: u64,
    queue: BinaryHeap<Pending<C>>,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Scheduler {
            now: Duration::ZERO,
            next_seq: 0,
            queue: BinaryHeap::new(),
        }
    }
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Enqueue an action. Times in the past run at the current instant.
    pub fn schedule(&mut self, at: Duration, action: Action<C>) {
        let at = at.max(self.now);
        let seq = self.next_seq;
        self.next_seq += 1;
        trace!(now = ?self.now, at = ?at, seq, "schedule");
        self.queue.push(Pending { at, seq, action });
    }

    /// Enqueue an action `delay` after now
    pub fn schedule_in(&mut self, delay: Duration, action: Action<C>) {
        self.schedule(self.now + delay, action);
    }

    /// Fire time of the earliest pending action
    pub fn next_time(&self) -> Option<Duration> {
        self.queue.peek().map(|p| p.at)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop every pending action and rewind the clock
    pub fn clear(&mut self) {
        self.queue.clear();
        self.now = Duration::ZERO;
        self.next_seq = 0;
    }

    fn pop_due(&mut self, at: Duration) -> Option<Action<C>> {
        if self.queue.peek()?.at != at {
            return None;
        }
        self.queue.pop().map(|p| p.action)
    }
}

/// Run every action due at the earliest pending time, including ones those
/// actions schedule for the same instant. Returns the time advanced to.
pub fn advance<C: ScheduleContext>(ctx: &mut C) -> Option<Duration> {
    let at = ctx.scheduler().next_time()?;
    ctx.scheduler_mut().now = at;
    ctx.on_advance();
    while let Some(action) = ctx.scheduler_mut().pop_due(at) {
        action(ctx);
    }
    Some(at)
}

/// Cancellation handle for a periodic action
#[derive(Debug, Clone, Default)]
pub struct PeriodicHandle(Rc<Cell<bool>>);

impl PeriodicHandle {
    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Repeat `on_tick` every `period`
///
/// The tick callback receives the 1-based tick number. With `num_ticks` set
/// the action stops after that many ticks; `tick_immediately` fires tick 1 at
/// the current instant instead of one period from now.
pub fn schedule_periodic<C: ScheduleContext + 'static>(
    ctx: &mut C,
    period: Duration,
    num_ticks: Option<u32>,
    tick_immediately: bool,
    on_tick: Rc<dyn Fn(&mut C, u32)>,
) -> PeriodicHandle {
    let handle = PeriodicHandle::default();
    let first = if tick_immediately {
        ctx.scheduler().now()
    } else {
        ctx.scheduler().now() + period
    };
    schedule_tick(ctx, first, 1, period, num_ticks, on_tick, handle.clone());
    handle
}

fn schedule_tick<C: ScheduleContext + 'static>(
    ctx: &mut C,
    at: Duration,
    tick: u32,
    period: Duration,
    num_ticks: Option<u32>,
    on_tick: Rc<dyn Fn(&mut C, u32)>,
    handle: PeriodicHandle,
) {
    if num_ticks.is_some_and(|n| tick > n) || period.is_zero() && tick > 1 {
        return;
    }
    ctx.scheduler_mut().schedule(
        at,
        Box::new(move |ctx: &mut C| {
            if handle.is_cancelled() {
                return;
            }
            on_tick(ctx, tick);
            let next = ctx.scheduler().now() + period;
            schedule_tick(ctx, next, tick + 1, period, num_ticks, on_tick, handle);
        }),
    );
}
