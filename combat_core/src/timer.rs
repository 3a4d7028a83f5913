//! Cooldown timers

use std::time::Duration;

/// A point in time after which something is ready again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timer {
    ready_at: Duration,
}

impl Timer {
    pub fn is_ready(&self, now: Duration) -> bool {
        self.ready_at <= now
    }

    pub fn ready_at(&self) -> Duration {
        self.ready_at
    }

    /// Time left until ready (zero if ready)
    pub fn remaining(&self, now: Duration) -> Duration {
        self.ready_at.saturating_sub(now)
    }

    /// Arm the timer for `duration` starting at `now`
    pub fn arm(&mut self, now: Duration, duration: Duration) {
        self.ready_at = now + duration;
    }

    pub fn reset(&mut self) {
        self.ready_at = Duration::ZERO;
    }
}
