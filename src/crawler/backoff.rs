//! Retry caps and backoff delays

use rand::Rng;
use std::time::Duration;

/// When to retry a failed item and how long to back off first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Processing attempts allowed for a URL that keeps failing transiently
    pub max_retries: u32,
    /// Base delay for rate-limit backoff
    pub base_backoff: Duration,
    /// Processing attempts allowed for a URL that keeps being rate limited;
    /// `None` retries indefinitely
    pub max_rate_limit_retries: Option<u32>,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_backoff: Duration) -> Self {
        Self {
            max_retries,
            base_backoff,
            max_rate_limit_retries: None,
        }
    }

    pub fn with_rate_limit_cap(mut self, cap: Option<u32>) -> Self {
        self.max_rate_limit_retries = cap;
        self
    }

    /// Returns true if an item that failed transiently on attempt number
    /// `attempts` should go back in the frontier
    pub fn allows_retry(&self, attempts: u32) -> bool {
        attempts < self.max_retries
    }

    /// Returns true if a rate-limited item on attempt number `attempts`
    /// should go back in the frontier
    pub fn allows_rate_limit_retry(&self, attempts: u32) -> bool {
        self.max_rate_limit_retries
            .map_or(true, |cap| attempts < cap)
    }

    /// Backoff before re-enqueueing a rate-limited item
    ///
    /// `(base + uniform(0, base)) * attempts`, so the expected delay grows
    /// linearly with the number of attempts.
    pub fn rate_limit_delay(&self, attempts: u32) -> Duration {
        let spread: f64 = rand::thread_rng().gen_range(0.0..1.0);
        scaled_backoff(self.base_backoff, attempts, spread)
    }
}

fn scaled_backoff(base: Duration, attempts: u32, spread: f64) -> Duration {
    base.mul_f64((1.0 + spread) * f64::from(attempts))
}

/// Uniform random delay in `[0, max)`
///
/// Added to every politeness sleep so workers do not fire in lockstep.
pub fn jitter(max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    max.mul_f64(rand::thread_rng().gen_range(0.0..1.0))
}
