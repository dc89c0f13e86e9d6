//! Exponential backoff retry policy for completion calls.

use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::warn;

/// Default: 3 total attempts, base 1s, max 30s.
pub const MAX_ATTEMPTS: u32 = 3;
const INITIAL_INTERVAL_SECS: u64 = 1;
const MAX_INTERVAL_SECS: u64 = 30;

/// Bounded-attempt retry with an exponentially growing delay between attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            initial_interval: Duration::from_secs(INITIAL_INTERVAL_SECS),
            max_interval: Duration::from_secs(MAX_INTERVAL_SECS),
        }
    }
}

impl RetryPolicy {
    fn schedule(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_interval,
            max_interval: self.max_interval,
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    /// Run `attempt` until it succeeds or `max_attempts` is reached.
    ///
    /// On each failure the error is stashed and the task sleeps for the next
    /// backoff interval. `wrap_exhausted` converts the last error and the
    /// attempt count into the caller's exhausted variant.
    pub async fn run<T, E, Fut, F, W>(&self, mut attempt: F, wrap_exhausted: W) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        W: FnOnce(E, u32) -> E,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut backoff = self.schedule();
        let mut attempts = 0;

        loop {
            attempts += 1;

            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if attempts >= max_attempts => return Err(wrap_exhausted(e, attempts)),
                Err(e) => {
                    warn!("Attempt {}/{} failed: {}", attempts, max_attempts, e);
                    if let Some(wait_duration) = backoff.next_backoff() {
                        tokio::time::sleep(wait_duration).await;
                    }
                }
            }
        }
    }
}
