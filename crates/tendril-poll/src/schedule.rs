//! Cycle timing: drift compensation and discovery throttling
//!
//! Kept free of actual sleeping so the computations are unit-testable.

use std::time::Duration;

/// Time left to sleep after a cycle, or `None` when processing overran the
/// period and the next cycle should start immediately. Overruns are never
/// carried forward as backlog.
pub fn remaining(period: Duration, elapsed: Duration) -> Option<Duration> {
    period.checked_sub(elapsed).filter(|d| !d.is_zero())
}

/// Limits discovery emission to once every `every` polling cycles
///
/// The counter starts saturated so the first cycle always emits.
#[derive(Debug, Clone)]
pub struct DiscoveryThrottle {
    every: u32,
    counter: u32,
}

impl DiscoveryThrottle {
    pub fn new(every: u32) -> Self {
        Self {
            every,
            counter: every,
        }
    }

    /// Whether discovery should be emitted this cycle; resets the counter
    /// when it fires
    pub fn should_emit(&mut self) -> bool {
        if self.counter >= self.every {
            self.counter = 0;
            true
        } else {
            false
        }
    }

    /// Advance the counter at the end of a cycle
    pub fn advance(&mut self) {
        self.counter = self.counter.saturating_add(1);
    }
}
