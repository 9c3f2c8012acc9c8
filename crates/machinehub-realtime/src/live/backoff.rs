//! Jittered exponential backoff for reconnect loops.

use std::time::Duration;

use rand::RngExt;

/// Reconnect delay policy: exponential growth with up to 25% jitter,
/// reset after a successful connection.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// First delay after a failure.
    initial: Duration,
    /// Upper bound for the delay.
    max: Duration,
    /// Delay to use on the next failure.
    current: Duration,
}

impl ReconnectPolicy {
    /// Create a policy from millisecond bounds.
    pub fn new(initial_ms: u64, max_ms: u64) -> Self {
        let initial = Duration::from_millis(initial_ms.max(1));
        let max = Duration::from_millis(max_ms.max(initial_ms.max(1)));
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// Delay to sleep before the next attempt. Doubles the base delay,
    /// capped at the maximum, and adds jitter so reconnect storms from
    /// many agents spread out.
    pub fn next_delay(&mut self) -> Duration {
        let base = self.current;
        self.current = (self.current * 2).min(self.max);

        let jitter_cap = (base.as_millis() as u64 / 4).max(1);
        let jitter = rand::rng().random_range(0..jitter_cap);
        base + Duration::from_millis(jitter)
    }

    /// Reset after a successful connection.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}
