//! Drives the public scheduler API against an in-memory platform.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use coursepace_core::{
    CourseTask, EventKind, SchedulerConfig, SubmissionClient, SubmissionOutcome, TimerStatus,
};
use coursepace_scheduler::Scheduler;

/// Fake platform that accumulates watched seconds per record and fails the
/// first `flaky_calls` requests of every course.
#[derive(Default)]
struct FakePlatform {
    flaky_calls: usize,
    rejected_records: Vec<String>,
    watched: Mutex<HashMap<String, u64>>,
    calls: Mutex<HashMap<String, usize>>,
}

#[async_trait]
impl SubmissionClient for FakePlatform {
    async fn submit_progress(
        &self,
        course_id: &str,
        record_id: &str,
        elapsed_seconds: u64,
    ) -> SubmissionOutcome {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let n = calls.entry(course_id.to_string()).or_default();
            *n += 1;
            *n
        };
        if self.rejected_records.iter().any(|r| r == record_id) {
            return SubmissionOutcome::FatalFailure("session expired".into());
        }
        if call <= self.flaky_calls {
            return SubmissionOutcome::RetryableFailure("502 Bad Gateway".into());
        }
        *self
            .watched
            .lock()
            .unwrap()
            .entry(record_id.to_string())
            .or_default() += elapsed_seconds;
        SubmissionOutcome::Success("{\"ok\":true}".into())
    }
}

fn config() -> SchedulerConfig {
    SchedulerConfig {
        max_concurrent: 3,
        tick_interval_seconds: 61,
        retry_attempts: 1,
        stagger_seconds: 1,
        failure_ceiling: 4,
        backoff_base_ms: 500,
        backoff_max_ms: 5_000,
        backoff_jitter: true,
        warmup_seconds: 0,
    }
}

#[tokio::test(start_paused = true)]
async fn mixed_batch_reaches_expected_terminal_states() {
    let platform = Arc::new(FakePlatform {
        flaky_calls: 3,
        rejected_records: vec!["r-expired".into()],
        ..Default::default()
    });
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut scheduler = Scheduler::new(config(), platform.clone()).with_events(tx);

    let admission = scheduler
        .submit(vec![
            CourseTask::new("c-1", "r-1", 300).with_title("Fire Safety"),
            CourseTask::new("c-2", "r-2", 45),
            CourseTask::new("c-3", "r-expired", 600),
            CourseTask::new("c-4", "r-4", 0),
            CourseTask::new("c-5", "r-5", 180),
            CourseTask::new("c-2", "r-2b", 90),
        ])
        .unwrap();
    assert_eq!(admission.admitted, 4);
    assert_eq!(admission.duplicates, vec!["c-2".to_string()]);
    assert_eq!(admission.already_complete, vec!["c-4".to_string()]);

    let report = scheduler.run_until_complete().await;

    assert!(report.is_complete());
    assert_eq!(report.status("c-1"), Some(TimerStatus::Completed));
    assert_eq!(report.status("c-2"), Some(TimerStatus::Completed));
    assert_eq!(report.status("c-3"), Some(TimerStatus::FailedTerminal));
    assert_eq!(report.status("c-5"), Some(TimerStatus::Completed));
    assert!(report.status("c-4").is_none());

    let watched = platform.watched.lock().unwrap();
    assert_eq!(watched.get("r-1"), Some(&300));
    assert_eq!(watched.get("r-2b"), Some(&90));
    assert_eq!(watched.get("r-5"), Some(&180));
    assert!(watched.get("r-expired").is_none());
    drop(watched);

    let mut per_course: HashMap<String, Vec<u64>> = HashMap::new();
    while let Ok(event) = rx.try_recv() {
        per_course
            .entry(event.course_id.clone())
            .or_default()
            .push(event.cumulative_seconds);
        if event.kind.is_terminal() {
            let summary = &report.courses[&event.course_id];
            assert_eq!(event.cumulative_seconds, summary.cumulative_submitted_seconds);
        }
    }
    for (course, cumulative) in per_course {
        assert!(
            cumulative.windows(2).all(|w| w[0] <= w[1]),
            "cumulative seconds decreased for {course}: {cumulative:?}"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn cancel_from_another_task_returns_partial_report() {
    let platform = Arc::new(FakePlatform::default());
    let mut scheduler = Scheduler::new(config(), platform.clone());
    scheduler
        .submit((0..6).map(|i| CourseTask::new(format!("c-{i}"), format!("r-{i}"), 3_600)))
        .unwrap();
    let token = scheduler.cancellation_token();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(200)).await;
        token.cancel();
    });
    let report = scheduler.run_until_complete().await;
    canceller.await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.courses.len(), 6);
    let running = report.statuses().values().filter(|s| **s == TimerStatus::Running).count();
    let pending = report.statuses().values().filter(|s| **s == TimerStatus::Pending).count();
    assert_eq!(running, 3);
    assert_eq!(pending, 3);
    for summary in report.courses.values() {
        assert!(summary.cumulative_submitted_seconds < 3_600);
    }
    assert!(report.total_submitted_seconds() > 0);
}

#[tokio::test(start_paused = true)]
async fn event_stream_reports_one_event_per_tick() {
    let platform = Arc::new(FakePlatform::default());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut scheduler = Scheduler::new(config(), platform).with_events(tx);
    scheduler.submit(vec![CourseTask::new("c-1", "r-1", 150)]).unwrap();

    let report = scheduler.run_until_complete().await;

    let mut tick_events = 0;
    while let Ok(event) = rx.try_recv() {
        if matches!(
            event.kind,
            EventKind::Progressed | EventKind::Completed | EventKind::TransientFailure | EventKind::Failed
        ) {
            tick_events += 1;
        }
    }
    assert_eq!(tick_events, report.courses["c-1"].ticks);
    assert_eq!(tick_events, 3);
}
