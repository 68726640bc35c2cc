//! Capped exponential backoff for completion calls.

use std::future::Future;
use std::time::Duration;

use crate::error::LlmError;

/// Default base delay: one backoff unit.
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default cap on a single backoff sleep.
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(8);

/// Retry budget and backoff schedule for one call.
///
/// Attempt `n` (0-based) that fails while attempts remain is followed by a
/// sleep of `min(base_delay * 2^n, max_delay)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero behaves like one.
    pub max_retries: u32,
    /// Delay unit for the first backoff.
    pub base_delay: Duration,
    /// Upper bound on any single backoff.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Policy with the default schedule and the given attempt budget.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Set the delay unit.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Number of attempts actually made.
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Backoff after the given 0-based failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        // 2^4 already exceeds the default cap; clamp the shift to stay in range
        let factor = 1u32 << attempt.min(16);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Run `operation` until it succeeds or the budget is spent.
    ///
    /// Every error is retried; the last one is returned once attempts are
    /// exhausted.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, LlmError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let attempts = self.attempts();
        let mut attempt = 0;

        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt + 1 < attempts => {
                    let delay = self.delay_for(attempt);
                    if err.is_transient() {
                        tracing::warn!(
                            attempt = attempt + 1,
                            max_retries = attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Completion call failed, will retry"
                        );
                    } else {
                        tracing::warn!(
                            attempt = attempt + 1,
                            max_retries = attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Completion call failed with non-transient error, retrying anyway"
                        );
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(
                        attempts = attempts,
                        error = %err,
                        "Completion call failed after exhausting retries"
                    );
                    return Err(err);
                }
            }
        }
    }
}
