//! Transport retry schedule.
//!
//! Only transient failures are retried: rate limits, timeouts, dropped
//! connections and 5xx responses. An expired session is not transient and
//! is handled a layer up, by refreshing the token.

use rand::Rng;
use std::time::Duration;

/// How often and how long [`SfHttpClient`](crate::SfHttpClient) waits
/// before giving up on a transient failure.
///
/// Delays double from `initial_delay` with up to 100% random jitter and
/// never exceed `max_delay`. A `Retry-After` sent with a 429 replaces the
/// computed delay, capped at `max_retry_after`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_retry_after: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_retry_after: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }
}

/// Retry state of one request.
#[derive(Debug)]
pub(crate) struct RetryPolicy {
    config: RetryConfig,
    attempt: u32,
}

impl RetryPolicy {
    pub(crate) fn new(config: RetryConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Retries taken so far.
    pub(crate) fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Count a retry and return how long to wait before it, or `None` once
    /// every retry has been used.
    pub(crate) fn next_delay(&mut self, retry_after: Option<Duration>) -> Option<Duration> {
        if self.attempt >= self.config.max_attempts {
            return None;
        }

        let delay = match retry_after {
            Some(retry_after) => retry_after.min(self.config.max_retry_after),
            None => self.backoff(),
        };

        self.attempt += 1;
        Some(delay)
    }

    fn backoff(&self) -> Duration {
        let max = self.config.max_delay.as_secs_f64();
        let exponent = i32::try_from(self.attempt).unwrap_or(i32::MAX);
        let base = (self.config.initial_delay.as_secs_f64() * 2f64.powi(exponent)).min(max);
        let jitter = rand::rng().random::<f64>() * base;
        Duration::from_secs_f64((base + jitter).min(max))
    }
}
