//! Poll pacing and the consecutive-error budget.
//!
//! The delay grows multiplicatively (`current × 1.2`, capped) only after a
//! successful query that is still non-terminal, so long-running pipelines are
//! polled less aggressively over time. A failed query never changes the
//! delay; it only counts against the error budget, and retries are scheduled
//! at the same delay until the budget is exhausted.

use std::time::Duration;

const GROWTH_FACTOR: f64 = 1.2;
const DELAY_CAP_MS: u64 = 30_000;

/// Per-flow polling constants. The two flows in the hosting product drifted
/// apart; they are kept as named presets rather than silently unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub base_delay_ms: u64,
    pub cap_ms: u64,
    pub error_budget: u32,
}

impl PollConfig {
    /// The deployment flow: tighter base, more patience with a flaky source.
    pub fn deployment() -> Self {
        Self {
            base_delay_ms: 4_000,
            cap_ms: DELAY_CAP_MS,
            error_budget: 5,
        }
    }

    /// The resource-listing flow.
    pub fn listing() -> Self {
        Self {
            base_delay_ms: 5_000,
            cap_ms: DELAY_CAP_MS,
            error_budget: 3,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::deployment()
    }
}

/// Mutable pacing state for one polling session.
#[derive(Debug)]
pub struct Backoff {
    current_ms: u64,
    cap_ms: u64,
    consecutive_errors: u32,
    error_budget: u32,
}

impl Backoff {
    pub fn new(config: PollConfig) -> Self {
        Self {
            current_ms: config.base_delay_ms,
            cap_ms: config.cap_ms,
            consecutive_errors: 0,
            error_budget: config.error_budget,
        }
    }

    pub fn current_delay(&self) -> Duration {
        Duration::from_millis(self.current_ms)
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    /// Called after a successful non-terminal query: reset the error counter
    /// and grow the delay for the next tick. Returns the new delay.
    pub fn on_success(&mut self) -> Duration {
        self.consecutive_errors = 0;
        let grown = (self.current_ms as f64 * GROWTH_FACTOR).round() as u64;
        self.current_ms = grown.min(self.cap_ms);
        self.current_delay()
    }

    /// Called after a failed query. The delay is untouched; returns `true`
    /// once the error budget is exhausted and the session must stop.
    pub fn on_failure(&mut self) -> bool {
        self.consecutive_errors = self.consecutive_errors.saturating_add(1);
        self.consecutive_errors >= self.error_budget
    }
}
