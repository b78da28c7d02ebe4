//! Bounded exponential backoff configuration.
//!
//! Transient inference failures are retried at the point of use with a
//! capped exponential delay plus jitter. The jitter keeps a batch of
//! workers that failed together from retrying together.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Retry policy for transient failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the initial attempt. 0 disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay (pre-jitter).
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based), with jitter.
    ///
    /// Doubles per attempt, clamps at `max_delay`, then applies ±25%
    /// jitter. Attempt 0 returns zero (no delay before the first try).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exp = attempt.saturating_sub(1).min(16);
        let raw = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(exp))
            .min(self.max_delay);
        jitter(raw)
    }
}

/// Apply ±25% uniform jitter to a delay.
fn jitter(d: Duration) -> Duration {
    if d.is_zero() {
        return d;
    }
    let factor = rand::rng().random_range(0.75..=1.25);
    d.mul_f64(factor)
}
