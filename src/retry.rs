//! Retry with exponential backoff around a fallible async operation.
//!
//! Model provider calls fail transiently (HTTP 429/5xx, connection resets,
//! timeouts). [`RetryPolicy::run`] re-invokes the operation until it succeeds
//! or the attempt budget is spent, sleeping between attempts:
//!
//! ```text
//! attempt 1 ── fail ── sleep 4s ── attempt 2 ── fail ── sleep 8s ── attempt 3
//! ```
//!
//! The delay starts at `initial_backoff`, doubles after every failure and is
//! capped at `max_backoff`. The policy knows nothing about what it wraps, so
//! it is tested on its own with a paused Tokio clock.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Always ≥ 1.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(4),
            max_backoff: Duration::from_secs(10),
        }
    }
}

/// The operation failed on every attempt.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl RetryPolicy {
    /// A policy that never waits. Handy for tests and local tooling.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay to apply after the `failed_attempt`-th attempt (1-based) failed.
    pub fn backoff_after(&self, failed_attempt: u32) -> Duration {
        let doublings = failed_attempt.saturating_sub(1).min(31);
        self.initial_backoff
            .saturating_mul(1u32 << doublings)
            .min(self.max_backoff)
    }

    /// Run `op` until it succeeds or `max_attempts` is reached.
    ///
    /// `op` receives the 1-based attempt number. `label` only appears in logs.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= max_attempts => {
                    warn!("{label}: attempt {attempt}/{max_attempts} failed: {e}; giving up");
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }
                Err(e) => {
                    let backoff = self.backoff_after(attempt);
                    warn!(
                        "{label}: attempt {attempt}/{max_attempts} failed: {e}; retrying in {}ms",
                        backoff.as_millis()
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}
