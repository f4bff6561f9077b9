//! Retry engine: bounded attempts with exponential backoff and jitter.
//!
//! Wraps one progress submission. The policy never touches timer state; it
//! only reports whether the submission eventually went through.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use coursepace_core::{PacerError, SchedulerConfig, SubmissionError, SubmissionOutcome};

use crate::wait::sleep_or_cancel;

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay after the first failed attempt, in milliseconds.
    pub base_delay_ms: u64,
    /// Multiplier for each subsequent wait (exponential factor).
    pub backoff_factor: f64,
    /// Maximum delay cap in milliseconds.
    pub max_delay_ms: u64,
    /// Add random jitter (±25% of computed delay) so concurrently failing
    /// timers do not retry in lockstep.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            backoff_factor: 2.0,
            max_delay_ms: 30_000,
            jitter: true,
        }
    }
}

/// What a retried submission came to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    Success { payload: String, attempts: u32 },
    Failure { error: SubmissionError, attempts: u32 },
}

impl RetryOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Success { attempts, .. } | RetryOutcome::Failure { attempts, .. } => {
                *attempts
            }
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            max_retries: config.retry_attempts,
            base_delay_ms: config.backoff_base_ms,
            backoff_factor: 2.0,
            max_delay_ms: config.backoff_max_ms,
            jitter: config.backoff_jitter,
        }
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait after the attempt with zero-based `attempt_index` failed:
    /// `base * factor^attempt_index`, capped at `max_delay_ms`.
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let exponent = attempt_index.min(i32::MAX as u32) as i32;
        let delay_ms = self.base_delay_ms as f64 * self.backoff_factor.powi(exponent);
        let delay_ms = delay_ms.min(self.max_delay_ms as f64) as u64;

        let delay_ms = if self.jitter {
            let jitter = (delay_ms / 4) as i64;
            let offset = if jitter > 0 {
                rand::thread_rng().gen_range(-jitter..=jitter)
            } else {
                0
            };
            ((delay_ms as i64 + offset).max(0) as u64).min(self.max_delay_ms)
        } else {
            delay_ms
        };

        Duration::from_millis(delay_ms)
    }

    /// Whether another attempt is allowed after `attempts_made` calls.
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.total_attempts()
    }

    /// Run `submit` until it succeeds, fails fatally, or the retry budget is
    /// spent. `submit` receives the zero-based attempt index.
    ///
    /// Cancellation is observed while a call is in flight and during every
    /// backoff sleep; a cancelled run returns [`PacerError::Cancelled`].
    pub async fn execute<F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut submit: F,
    ) -> Result<RetryOutcome, PacerError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = SubmissionOutcome>,
    {
        let mut attempts = 0u32;
        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PacerError::Cancelled),
                outcome = submit(attempts) => outcome,
            };
            attempts += 1;

            match outcome.into_result() {
                Ok(payload) => return Ok(RetryOutcome::Success { payload, attempts }),
                Err(error @ SubmissionError::Fatal(_)) => {
                    warn!(attempt = attempts, error = %error, "Submission rejected, not retrying");
                    return Ok(RetryOutcome::Failure { error, attempts });
                }
                Err(error) => {
                    if !self.should_retry(attempts) {
                        warn!(attempt = attempts, error = %error, "Submission retry policy exhausted");
                        return Ok(RetryOutcome::Failure { error, attempts });
                    }
                    let delay = self.delay_for(attempts - 1);
                    debug!(
                        attempt = attempts,
                        max = self.total_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Submission failed, will retry"
                    );
                    if !sleep_or_cancel(delay, cancel).await {
                        return Err(PacerError::Cancelled);
                    }
                }
            }
        }
    }
}
