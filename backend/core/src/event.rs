use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A progress event emitted by the scheduler for its reporter.
/// Every tick of every course produces exactly one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub id: Uuid,
    pub run_id: Uuid,
    pub course_id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    /// Seconds credited to the course so far.
    pub cumulative_seconds: u64,
    /// Seconds still required after this event.
    pub remaining_seconds: u64,
    /// Seconds sent in this submission, when one was made.
    pub submitted_seconds: Option<u64>,
    pub detail: Option<String>,
}

/// Categories of events a run can produce.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A course id appeared more than once in one admission batch
    DuplicateCourse,
    /// A timer was promoted and is about to fire its first tick
    TimerStarted,
    /// The uncredited warm-up submission was sent
    WarmupSent,
    /// A tick succeeded and the course still needs time
    Progressed,
    /// A tick failed but the course keeps running
    TransientFailure,
    /// The course reached its required watch-time
    Completed,
    /// The course hit its failure ceiling
    Failed,
}

impl EventKind {
    pub fn is_terminal(self) -> bool {
        matches!(self, EventKind::Completed | EventKind::Failed)
    }
}

impl ProgressEvent {
    pub fn new(
        run_id: Uuid,
        course_id: impl Into<String>,
        kind: EventKind,
        cumulative_seconds: u64,
        remaining_seconds: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            course_id: course_id.into(),
            timestamp: Utc::now(),
            kind,
            cumulative_seconds,
            remaining_seconds,
            submitted_seconds: None,
            detail: None,
        }
    }

    pub fn with_submitted(mut self, seconds: u64) -> Self {
        self.submitted_seconds = Some(seconds);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| format!("{:?}", self));
        write!(f, "{}", s)
    }
}
