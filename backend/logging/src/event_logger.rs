//! Progress Event Logger
//!
//! Drains a scheduler's event channel into `tracing` (target `progress`) and
//! keeps a per-course tally for the final summary.

use std::collections::BTreeMap;

use coursepace_core::{EventKind, ProgressEvent};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

/// What the reporter has seen of one course.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseTally {
    pub successful_ticks: u32,
    pub failed_ticks: u32,
    pub cumulative_seconds: u64,
    pub remaining_seconds: u64,
    pub last_kind: Option<EventKind>,
}

#[derive(Debug, Default)]
pub struct ProgressLogger {
    tallies: BTreeMap<String, CourseTally>,
    events_seen: u64,
}

impl ProgressLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a task that logs every event until all senders are dropped,
    /// then hands back the logger with its tallies.
    pub fn spawn(rx: UnboundedReceiver<ProgressEvent>) -> JoinHandle<ProgressLogger> {
        tokio::spawn(Self::new().drain(rx))
    }

    pub async fn drain(mut self, mut rx: UnboundedReceiver<ProgressEvent>) -> Self {
        while let Some(event) = rx.recv().await {
            self.record(&event);
        }
        self
    }

    /// Log one event and fold it into the course's tally.
    pub fn record(&mut self, event: &ProgressEvent) {
        self.events_seen += 1;
        let detail = event
            .detail
            .as_deref()
            .map(redact_sensitive_data)
            .unwrap_or_default();

        match event.kind {
            EventKind::TransientFailure | EventKind::Failed | EventKind::DuplicateCourse => {
                warn!(
                    target: "progress",
                    course_id = %event.course_id,
                    kind = %event.kind,
                    cumulative = event.cumulative_seconds,
                    remaining = event.remaining_seconds,
                    detail = %detail,
                    "Course event"
                );
            }
            _ => {
                info!(
                    target: "progress",
                    course_id = %event.course_id,
                    kind = %event.kind,
                    submitted = event.submitted_seconds,
                    cumulative = event.cumulative_seconds,
                    remaining = event.remaining_seconds,
                    "Course event"
                );
            }
        }

        let tally = self.tallies.entry(event.course_id.clone()).or_default();
        match event.kind {
            EventKind::Progressed | EventKind::Completed => tally.successful_ticks += 1,
            EventKind::TransientFailure | EventKind::Failed => tally.failed_ticks += 1,
            _ => {}
        }
        tally.cumulative_seconds = tally.cumulative_seconds.max(event.cumulative_seconds);
        tally.remaining_seconds = event.remaining_seconds;
        tally.last_kind = Some(event.kind);
    }

    pub fn tally(&self, course_id: &str) -> Option<&CourseTally> {
        self.tallies.get(course_id)
    }

    pub fn tallies(&self) -> &BTreeMap<String, CourseTally> {
        &self.tallies
    }

    pub fn events_seen(&self) -> u64 {
        self.events_seen
    }
}
