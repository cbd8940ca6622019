#![forbid(unsafe_code)]

//! Retry-with-backoff around fallible async operations.

use anyhow::{Error, Result};
use log::warn;
use std::future::Future;
use std::time::Duration;

const DEFAULT_MULTIPLIER: u32 = 2;
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// How many times an operation is attempted and how long to wait in between.
///
/// The delay before attempt `n + 1` is `initial_delay * multiplier^(n - 1)`,
/// capped at `max_delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: u32,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn exponential(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            multiplier: DEFAULT_MULTIPLIER,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::exponential(max_attempts, Duration::ZERO)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = self.multiplier.max(1).saturating_pow(exponent);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(5, Duration::from_secs(1))
    }
}

/// Reported to the notifier after every failed attempt.
#[derive(Debug)]
pub struct RetryEvent<'a> {
    pub attempt: u32,
    pub remaining: u32,
    pub delay: Duration,
    pub error: &'a Error,
}

/// Runs `op` until it succeeds or the policy runs out of attempts, calling
/// `notify` once per failure. Resolves to the last error on exhaustion.
pub async fn retry_notify<T, F, Fut, N>(policy: &RetryPolicy, mut op: F, mut notify: N) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    N: FnMut(&RetryEvent<'_>),
{
    let max_attempts = policy.attempts();
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let remaining = max_attempts - attempt;
                let delay = if remaining > 0 {
                    policy.delay_after(attempt)
                } else {
                    Duration::ZERO
                };
                notify(&RetryEvent {
                    attempt,
                    remaining,
                    delay,
                    error: &err,
                });
                if remaining == 0 {
                    return Err(err);
                }
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// [`retry_notify`] that logs each failure under `label`.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, label: &str, op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_notify(policy, op, |event| {
        warn!(
            "{label}: attempt {} failed ({} retries left): {:#}",
            event.attempt, event.remaining, event.error
        );
    })
    .await
    .map_err(|err| err.context(format!("{label} failed after {} attempts", policy.attempts())))
}
