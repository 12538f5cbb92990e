//! Wait and retry options, and the deadline shared by polling loops.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for element waits (5 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (500ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Default number of predicate lookup attempts
pub const DEFAULT_RETRIES: u32 = 3;

/// Default delay between predicate lookup attempts (500ms)
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for element waits.
///
/// A `timeout_ms` of zero means no deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Also wait until the element stops moving
    pub wait_for_stability: bool,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            wait_for_stability: false,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Enable or disable the stability wait
    #[must_use]
    pub const fn with_stability(mut self, wait_for_stability: bool) -> Self {
        self.wait_for_stability = wait_for_stability;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// RETRY OPTIONS
// =============================================================================

/// Options for predicate lookups that re-read the whole tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryOptions {
    /// Number of attempts
    pub retries: u32,
    /// Delay between failed attempts, in milliseconds
    pub delay_ms: u64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl RetryOptions {
    /// Create new retry options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of attempts
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set delay between attempts in milliseconds
    #[must_use]
    pub const fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Get delay as Duration
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

// =============================================================================
// DEADLINE
// =============================================================================

/// Point in time after which a wait gives up, or none at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// Deadline `timeout_ms` from now; zero means unbounded
    #[must_use]
    pub fn after(timeout_ms: u64) -> Self {
        let at = (timeout_ms > 0).then(|| Instant::now() + Duration::from_millis(timeout_ms));
        Self { at }
    }

    /// A deadline that never passes
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { at: None }
    }

    /// Whether the deadline is in the past
    #[must_use]
    pub fn has_passed(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// Time left, `None` when unbounded
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Sleep for `interval`, waking early at the deadline
    pub async fn sleep(&self, interval: Duration) {
        let nap = self
            .remaining()
            .map_or(interval, |remaining| interval.min(remaining));
        tokio::time::sleep(nap).await;
    }
}
