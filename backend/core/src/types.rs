use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PacerError;

/// One course whose watch-time still has to be reported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseTask {
    pub course_id: String,
    /// Server-side record token sent with every submission.
    pub record_id: String,
    /// Watch-time still required when the task was discovered.
    pub remaining_seconds: u64,
    /// Threshold the platform considers "complete".
    pub pass_line_seconds: u64,
    #[serde(default)]
    pub title: Option<String>,
}

impl CourseTask {
    pub fn new(
        course_id: impl Into<String>,
        record_id: impl Into<String>,
        remaining_seconds: u64,
    ) -> Self {
        Self {
            course_id: course_id.into(),
            record_id: record_id.into(),
            remaining_seconds,
            pass_line_seconds: remaining_seconds,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_pass_line(mut self, pass_line_seconds: u64) -> Self {
        self.pass_line_seconds = pass_line_seconds;
        self
    }

    /// A task with nothing left to watch is already done.
    pub fn is_complete(&self) -> bool {
        self.remaining_seconds == 0
    }

    /// Name used in log lines: the title when known, the id otherwise.
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.course_id)
    }
}

/// Lifecycle of a single course timer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    #[default]
    Pending,
    Running,
    Completed,
    FailedTerminal,
}

impl TimerStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TimerStatus::Completed | TimerStatus::FailedTerminal)
    }
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimerStatus::Pending => "pending",
            TimerStatus::Running => "running",
            TimerStatus::Completed => "completed",
            TimerStatus::FailedTerminal => "failed_terminal",
        };
        f.write_str(s)
    }
}

/// Tuning for one scheduling session. Immutable once the scheduler runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Cap on simultaneously running timers.
    pub max_concurrent: usize,
    /// Heartbeat period in seconds.
    pub tick_interval_seconds: u64,
    /// Retries per tick; each tick makes at most `retry_attempts + 1` calls.
    pub retry_attempts: u32,
    /// Offset between first ticks of timers promoted together.
    pub stagger_seconds: u64,
    /// Consecutive failed ticks after which a course is abandoned.
    pub failure_ceiling: u32,
    /// First backoff delay in milliseconds.
    pub backoff_base_ms: u64,
    /// Upper bound on any single backoff delay in milliseconds.
    pub backoff_max_ms: u64,
    /// Add ±25% jitter to backoff delays.
    pub backoff_jitter: bool,
    /// Uncredited first submission; 0 disables it.
    pub warmup_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 30,
            tick_interval_seconds: 61,
            retry_attempts: 3,
            stagger_seconds: 1,
            failure_ceiling: 10,
            backoff_base_ms: 1_000,
            backoff_max_ms: 30_000,
            backoff_jitter: true,
            warmup_seconds: 0,
        }
    }
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_seconds)
    }

    /// Reject settings the scheduler cannot run with.
    pub fn validate(&self) -> Result<(), PacerError> {
        if self.max_concurrent == 0 {
            return Err(PacerError::Config("max_concurrent must be at least 1".into()));
        }
        if self.tick_interval_seconds == 0 {
            return Err(PacerError::Config(
                "tick_interval_seconds must be at least 1".into(),
            ));
        }
        if self.failure_ceiling == 0 {
            return Err(PacerError::Config("failure_ceiling must be at least 1".into()));
        }
        if self.backoff_base_ms > self.backoff_max_ms {
            return Err(PacerError::Config(format!(
                "backoff_base_ms ({}) exceeds backoff_max_ms ({})",
                self.backoff_base_ms, self.backoff_max_ms
            )));
        }
        Ok(())
    }
}
