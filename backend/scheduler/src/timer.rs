//! Per-course playback timer.
//!
//! A `CourseTimer` owns the forward progress of exactly one course: how many
//! seconds have been credited, how many ticks failed in a row, and where it
//! sits in the `Pending → Running → {Completed | FailedTerminal}` lifecycle.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use coursepace_core::{
    CourseTask, PacerError, SchedulerConfig, SubmissionClient, SubmissionError, TimerStatus,
};

use crate::report::CourseSummary;
use crate::retry::{RetryOutcome, RetryPolicy};

/// Result of a single tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The submission went through; `remaining` seconds are still required.
    Progressed { submitted: u64, remaining: u64 },
    /// The submission went through and the course is done.
    Completed { submitted: u64 },
    /// Nothing was credited; the timer keeps running.
    TransientFailure(SubmissionError),
    /// The failure ceiling was reached; the timer is finished.
    Failed(SubmissionError),
}

impl TickOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TickOutcome::Completed { .. } | TickOutcome::Failed(_))
    }
}

#[derive(Debug)]
pub struct CourseTimer {
    task: CourseTask,
    tick_interval_seconds: u64,
    failure_ceiling: u32,
    status: TimerStatus,
    cumulative_submitted_seconds: u64,
    consecutive_failures: u32,
    ticks: u32,
    /// Watch time up to this instant has been credited or forfeited.
    credited_until: Option<Instant>,
    last_error: Option<SubmissionError>,
}

impl CourseTimer {
    pub fn new(task: CourseTask, config: &SchedulerConfig) -> Self {
        Self {
            task,
            tick_interval_seconds: config.tick_interval_seconds,
            failure_ceiling: config.failure_ceiling,
            status: TimerStatus::Pending,
            cumulative_submitted_seconds: 0,
            consecutive_failures: 0,
            ticks: 0,
            credited_until: None,
            last_error: None,
        }
    }

    pub fn course_id(&self) -> &str {
        &self.task.course_id
    }

    pub fn task(&self) -> &CourseTask {
        &self.task
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn cumulative_submitted_seconds(&self) -> u64 {
        self.cumulative_submitted_seconds
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Seconds still owed against the task's remaining time at admission.
    pub fn remaining_seconds(&self) -> u64 {
        self.task
            .remaining_seconds
            .saturating_sub(self.cumulative_submitted_seconds)
    }

    /// Whole seconds not yet credited or forfeited at `now`. Before the first
    /// tick the timer credits one nominal interval.
    pub fn uncredited_seconds(&self, now: Instant) -> u64 {
        match self.credited_until {
            Some(at) => now.saturating_duration_since(at).as_secs(),
            None => self.tick_interval_seconds,
        }
    }

    /// Seconds the next submission would report at `now`, clamped so the
    /// course never overshoots its remaining time.
    pub fn next_submission_seconds(&self, now: Instant) -> u64 {
        self.uncredited_seconds(now)
            .max(1)
            .min(self.remaining_seconds())
    }

    /// Send the platform's throwaway first update of a viewing session.
    ///
    /// Nothing is credited. On success the credit anchor moves to `now` so
    /// the first real tick reports the time actually waited since.
    /// Returns whether the platform accepted it.
    pub async fn warm_up(
        &mut self,
        now: Instant,
        seconds: u64,
        client: &dyn SubmissionClient,
        cancel: &CancellationToken,
    ) -> Result<bool, PacerError> {
        self.ensure_live()?;
        self.status = TimerStatus::Running;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PacerError::Cancelled),
            outcome = client.submit_progress(&self.task.course_id, &self.task.record_id, seconds) => outcome,
        };

        match outcome.into_result() {
            Ok(_) => {
                debug!(course_id = %self.task.course_id, seconds, "Warm-up submission accepted");
                self.credited_until = Some(now);
                Ok(true)
            }
            Err(error) => {
                warn!(course_id = %self.task.course_id, error = %error, "Warm-up submission failed");
                Ok(false)
            }
        }
    }

    /// Submit the time elapsed since the last success and advance the state
    /// machine.
    ///
    /// On cancellation the timer is left exactly as it was (still `Running`)
    /// and [`PacerError::Cancelled`] is returned.
    pub async fn tick(
        &mut self,
        now: Instant,
        client: &dyn SubmissionClient,
        retry: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<TickOutcome, PacerError> {
        self.ensure_live()?;
        self.status = TimerStatus::Running;

        let seconds = self.next_submission_seconds(now);
        let course_id = self.task.course_id.as_str();
        let record_id = self.task.record_id.as_str();
        let outcome = retry
            .execute(cancel, |_| client.submit_progress(course_id, record_id, seconds))
            .await?;

        self.ticks += 1;
        match outcome {
            RetryOutcome::Success { .. } => {
                let credited = seconds.min(self.remaining_seconds());
                self.cumulative_submitted_seconds += credited;
                self.consecutive_failures = 0;
                // Advance by whole credited seconds so sub-second remainders
                // carry into the next tick.
                self.credited_until = Some(match self.credited_until {
                    Some(at) => at + Duration::from_secs(seconds),
                    None => now,
                });
                self.last_error = None;

                let remaining = self.remaining_seconds();
                if remaining == 0 {
                    self.status = TimerStatus::Completed;
                    info!(
                        course_id = %self.task.course_id,
                        ticks = self.ticks,
                        cumulative = self.cumulative_submitted_seconds,
                        "Course completed"
                    );
                    Ok(TickOutcome::Completed { submitted: credited })
                } else {
                    debug!(
                        course_id = %self.task.course_id,
                        submitted = credited,
                        remaining,
                        "Progress submitted"
                    );
                    Ok(TickOutcome::Progressed { submitted: credited, remaining })
                }
            }
            RetryOutcome::Failure { error, attempts } => {
                self.consecutive_failures += 1;
                self.last_error = Some(error.clone());
                // The failed interval is forfeited, not carried into the next success.
                self.credited_until = Some(now);

                if self.consecutive_failures >= self.failure_ceiling {
                    self.status = TimerStatus::FailedTerminal;
                    warn!(
                        course_id = %self.task.course_id,
                        failures = self.consecutive_failures,
                        error = %error,
                        "Course abandoned after repeated failures"
                    );
                    Ok(TickOutcome::Failed(error))
                } else {
                    warn!(
                        course_id = %self.task.course_id,
                        attempts,
                        failures = self.consecutive_failures,
                        ceiling = self.failure_ceiling,
                        error = %error,
                        "Tick failed, will try again next interval"
                    );
                    Ok(TickOutcome::TransientFailure(error))
                }
            }
        }
    }

    /// Promoted timers count as `Running` even before their first tick, since
    /// they already hold a concurrency slot. A report entry that is `Running`
    /// with zero `ticks` was promoted but never submitted.
    pub(crate) fn mark_running(&mut self) {
        if !self.status.is_terminal() {
            self.status = TimerStatus::Running;
        }
    }

    pub fn summary(&self) -> CourseSummary {
        CourseSummary {
            course_id: self.task.course_id.clone(),
            title: self.task.title.clone(),
            status: self.status,
            cumulative_submitted_seconds: self.cumulative_submitted_seconds,
            required_seconds: self.task.remaining_seconds,
            ticks: self.ticks,
            consecutive_failures: self.consecutive_failures,
            last_error: self.last_error.as_ref().map(ToString::to_string),
        }
    }

    fn ensure_live(&self) -> Result<(), PacerError> {
        if self.status.is_terminal() {
            return Err(PacerError::TimerFinished {
                course_id: self.task.course_id.clone(),
                status: self.status.to_string(),
            });
        }
        Ok(())
    }
}
