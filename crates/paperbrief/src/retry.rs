//! Explicit retry loop with exponential backoff.
//!
//! Transient failures (connection errors, timeouts, retryable HTTP statuses)
//! are retried up to a fixed attempt count with a `base * multiplier^attempt`
//! delay between attempts. The schedule is part of the client's observable
//! contract — with the defaults it is 1s, 2s, 4s, … — so there is no jitter
//! and no cap. Authorization failures are never retried.

use std::time::Duration;
use tracing::warn;

/// Whether an error is worth retrying. Implemented by the client's error
/// type; everything non-transient fails the loop immediately.
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, first try included (1 = no retries).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Backoff multiplier (typically 2.0 for exponential backoff).
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a config with the given total attempt count. Uses default
    /// delays.
    pub fn with_attempts(attempts: u32) -> Self {
        Self {
            max_attempts: attempts,
            ..Default::default()
        }
    }

    /// Calculate the delay after a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        Duration::from_secs_f64(secs)
    }
}

/// Drive `call` to completion, retrying transient errors with backoff.
///
/// Runs at most `config.max_attempts` invocations. Non-transient errors and
/// the final transient error are returned to the caller unchanged.
pub async fn retry_call<T, E, F, Fut>(config: &RetryConfig, mut call: F) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                if e.is_transient() && attempt + 1 < config.max_attempts {
                    let delay = config.delay_for_attempt(attempt);
                    warn!(
                        "transient API error (attempt {}/{}): {e}; retrying in {delay:?}",
                        attempt + 1,
                        config.max_attempts,
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                } else {
                    return Err(e);
                }
            }
        }
    }
}
