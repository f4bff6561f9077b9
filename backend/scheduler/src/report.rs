//! Aggregate result of one scheduling run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use coursepace_core::TimerStatus;

/// Final (or, after cancellation, partial) state of one course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseSummary {
    pub course_id: String,
    pub title: Option<String>,
    pub status: TimerStatus,
    pub cumulative_submitted_seconds: u64,
    /// Remaining seconds the task was admitted with.
    pub required_seconds: u64,
    pub ticks: u32,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

/// Result of [`Scheduler::run_until_complete`](crate::Scheduler::run_until_complete).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    /// True when the run stopped early on a cancellation signal.
    pub cancelled: bool,
    pub courses: BTreeMap<String, CourseSummary>,
}

impl RunReport {
    pub fn new(run_id: Uuid) -> Self {
        Self { run_id, cancelled: false, courses: BTreeMap::new() }
    }

    pub fn record(&mut self, summary: CourseSummary) {
        self.courses.insert(summary.course_id.clone(), summary);
    }

    pub fn status(&self, course_id: &str) -> Option<TimerStatus> {
        self.courses.get(course_id).map(|c| c.status)
    }

    pub fn statuses(&self) -> BTreeMap<String, TimerStatus> {
        self.courses
            .iter()
            .map(|(id, c)| (id.clone(), c.status))
            .collect()
    }

    /// Every admitted course reached a terminal status and the run was not
    /// cut short.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.courses.values().all(|c| c.status.is_terminal())
    }

    pub fn completed_count(&self) -> usize {
        self.count(TimerStatus::Completed)
    }

    pub fn failed_count(&self) -> usize {
        self.count(TimerStatus::FailedTerminal)
    }

    /// Courses left `Pending` or `Running`.
    pub fn unfinished_count(&self) -> usize {
        self.courses.values().filter(|c| !c.status.is_terminal()).count()
    }

    pub fn total_submitted_seconds(&self) -> u64 {
        self.courses.values().map(|c| c.cumulative_submitted_seconds).sum()
    }

    fn count(&self, status: TimerStatus) -> usize {
        self.courses.values().filter(|c| c.status == status).count()
    }
}
