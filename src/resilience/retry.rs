//! Exponential-backoff retry.
//!
//! Hand-rolled on top of `std::time::Duration` and `rand`, with an
//! additive jitter term capped at 10% of the base delay rather than
//! scaling with the full backoff, so retries stay clustered near the
//! intended delay instead of spreading across the whole window.

use crate::error::{Error, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry policy parameters.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before attempt `attempt` (1-indexed: the delay *after*
    /// attempt `attempt` failed):
    /// `min(baseDelay * multiplier^n, maxDelay) + jitter`, jitter uniform
    /// up to 10% of `base_delay`.
    pub(crate) fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.backoff_multiplier.powi(attempt as i32 - 1);
        let raw_ms = (self.base_delay.as_millis() as f64) * exp;
        let capped_ms = raw_ms.min(self.max_delay.as_millis() as f64);
        let jitter_max_ms = (self.base_delay.as_millis() as f64) * 0.10;
        let jitter_ms = if jitter_max_ms > 0.0 {
            rand::rng().random_range(0.0..=jitter_max_ms)
        } else {
            0.0
        };
        Duration::from_millis((capped_ms + jitter_ms) as u64)
    }
}

/// Default classification of retryable errors: network/timeout/
/// connection-reset error shapes.
pub fn default_retry_condition(err: &Error) -> bool {
    err.is_retryable()
}

/// Retry `operation` per `config`, short-circuiting on a non-retryable
/// error and surfacing the last error after `max_attempts` failures.
pub async fn retry<F, Fut, T>(config: &RetryConfig, retry_condition: impl Fn(&Error) -> bool, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= config.max_attempts || !retry_condition(&err) {
                    return Err(err);
                }
                let delay = config.delay_for(attempt);
                warn!(attempt, max_attempts = config.max_attempts, ?delay, error = %err, "retrying after failure");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Convenience wrapper using the default retry condition.
pub async fn retry_default<F, Fut, T>(config: &RetryConfig, operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry(config, default_retry_condition, operation).await
}
