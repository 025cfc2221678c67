//! Retry with exponential backoff for fallible async operations.
//!
//! [`with_retry`] re-runs the whole operation on every failure, so the
//! caller must only wrap operations that are safe to repeat (reads, and
//! idempotent deletes). HTTP error statuses are not special-cased there:
//! anything the operation returns as `Err` triggers another attempt.
//! [`with_retry_if`] takes a predicate and hands back the first error it
//! rejects without sleeping, e.g. `MediaApiError::is_transient`.
//!
//! The delay before attempt `k + 1` is `initial_delay * 2^(k - 1)`:
//! 1000ms, 2000ms, 4000ms with the defaults. No jitter is applied.

use std::future::Future;
use std::time::Duration;

/// Default number of attempts, including the first one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the second attempt.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

/// Attempt budget and backoff schedule for [`with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total invocations allowed. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after every failure.
    pub initial_delay: Duration,
    /// Optional ceiling on any single delay.
    pub max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: None,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay: None,
        }
    }

    /// Cap every delay at `max_delay`. The doubling law holds until the cap.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Delay slept after failed attempt `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let delay = self.initial_delay.saturating_mul(factor);
        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Run `operation` until it succeeds or the attempt budget is spent.
///
/// On exhaustion the error from the final attempt is returned as-is,
/// unwrapped, so callers can match on it.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    with_retry_if(policy, |_| true, operation).await
}

/// Like [`with_retry`], but only errors accepted by `retryable` are retried.
/// Any other error ends the loop immediately.
pub async fn with_retry_if<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    retryable: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let max_attempts = policy.attempts();
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if !retryable(&e) => {
                tracing::debug!(attempt, "operation failed, not retryable: {e}");
                return Err(e);
            }
            Err(e) if attempt >= max_attempts => {
                tracing::error!(max_attempts, "operation failed, retries exhausted: {e}");
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_for_attempt(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    "operation failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
