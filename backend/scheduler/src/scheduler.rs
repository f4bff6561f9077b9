use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use coursepace_core::{
    CourseTask, EventKind, PacerError, ProgressEvent, SchedulerConfig, SubmissionClient,
    TimerStatus,
};

use crate::heartbeat::{run_heartbeat_loop, HeartbeatContext};
use crate::report::{CourseSummary, RunReport};
use crate::retry::RetryPolicy;
use crate::stagger::StaggerPolicy;
use crate::timer::CourseTimer;

/// What `submit` did with a batch of tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Admission {
    /// Timers newly queued or replaced by this batch.
    pub admitted: usize,
    /// Course ids skipped because nothing was left to watch.
    pub already_complete: Vec<String>,
    /// Course ids that appeared more than once; the last occurrence won.
    pub duplicates: Vec<String>,
}

/// The Scheduler admits course tasks and drives their timers concurrently.
///
/// At most `max_concurrent` timers run at once; the rest wait `Pending` and
/// are promoted as running timers reach a terminal status.
pub struct Scheduler {
    config: SchedulerConfig,
    stagger: StaggerPolicy,
    retry: RetryPolicy,
    client: Arc<dyn SubmissionClient>,
    pending: Vec<CourseTimer>,
    cancel: CancellationToken,
    events: Option<mpsc::UnboundedSender<ProgressEvent>>,
    run_id: Uuid,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, client: Arc<dyn SubmissionClient>) -> Self {
        Self {
            stagger: StaggerPolicy::from_seconds(config.stagger_seconds),
            retry: RetryPolicy::from_config(&config),
            config,
            client,
            pending: Vec::new(),
            cancel: CancellationToken::new(),
            events: None,
            run_id: Uuid::new_v4(),
        }
    }

    /// Replace the stagger derived from `stagger_seconds`.
    pub fn with_stagger(mut self, stagger: StaggerPolicy) -> Self {
        self.stagger = stagger;
        self
    }

    /// Send one event per tick per course to `tx`.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Timers waiting for the next run, in admission order.
    pub fn pending(&self) -> impl Iterator<Item = &CourseTimer> {
        self.pending.iter()
    }

    /// Token that cancels this scheduler; clone it to cancel from elsewhere
    /// while `run_until_complete` is in progress.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Ask running timers to stop at their next suspension point.
    /// Cancellation is permanent for this scheduler.
    pub fn cancel(&self) {
        info!(run_id = %self.run_id, "Cancellation requested");
        self.cancel.cancel();
    }

    /// Admit a batch of tasks.
    ///
    /// Tasks with nothing left to watch are skipped. A repeated `course_id`
    /// keeps its last occurrence, both within the batch and against tasks
    /// admitted earlier; each repeat is logged, emitted as a
    /// `DuplicateCourse` event and listed in the returned [`Admission`].
    pub fn submit(
        &mut self,
        tasks: impl IntoIterator<Item = CourseTask>,
    ) -> Result<Admission, PacerError> {
        self.config.validate()?;
        let tasks: Vec<CourseTask> = tasks.into_iter().collect();
        if let Some(task) = tasks.iter().find(|t| t.course_id.trim().is_empty()) {
            return Err(PacerError::Config(format!(
                "course with record_id '{}' has an empty course_id",
                task.record_id
            )));
        }

        let mut admission = Admission::default();
        let mut index: HashMap<String, usize> = self
            .pending
            .iter()
            .enumerate()
            .map(|(i, t)| (t.course_id().to_string(), i))
            .collect();
        let mut batch: HashSet<String> = HashSet::new();

        for task in tasks {
            batch.insert(task.course_id.clone());
            if let Some(&slot) = index.get(&task.course_id) {
                warn!(course_id = %task.course_id, "Duplicate course id, keeping the last one");
                self.emit(ProgressEvent::new(
                    self.run_id,
                    &task.course_id,
                    EventKind::DuplicateCourse,
                    0,
                    task.remaining_seconds,
                ));
                admission.duplicates.push(task.course_id.clone());
                self.pending[slot] = CourseTimer::new(task, &self.config);
            } else {
                index.insert(task.course_id.clone(), self.pending.len());
                self.pending.push(CourseTimer::new(task, &self.config));
            }
        }

        // Drop completed tasks only after de-duplication so a later zero
        // entry can retire an earlier one.
        self.pending.retain(|timer| {
            if timer.task().is_complete() {
                debug!(course_id = %timer.course_id(), "Course already complete, not scheduling");
                admission.already_complete.push(timer.course_id().to_string());
                false
            } else {
                true
            }
        });
        admission.admitted = self
            .pending
            .iter()
            .filter(|t| batch.contains(t.course_id()))
            .count();

        info!(
            admitted = self.pending.len(),
            duplicates = admission.duplicates.len(),
            already_complete = admission.already_complete.len(),
            "Course tasks admitted"
        );
        Ok(admission)
    }

    /// Drive every admitted timer until it is terminal, or until cancelled.
    ///
    /// Never fails as a whole: individual courses may end `FailedTerminal`.
    /// After cancellation the report has `cancelled = true` and holds the
    /// partial state of every course, unstarted ones as `Pending`.
    pub async fn run_until_complete(&mut self) -> RunReport {
        let mut report = RunReport::new(self.run_id);
        let mut queue: VecDeque<CourseTimer> = std::mem::take(&mut self.pending).into();
        let ctx = Arc::new(HeartbeatContext {
            run_id: self.run_id,
            client: Arc::clone(&self.client),
            retry: self.retry.clone(),
            tick_interval: self.config.tick_interval(),
            warmup_seconds: self.config.warmup_seconds,
            cancel: self.cancel.clone(),
            events: self.events.clone(),
        });
        // Never more permits than timers, which also keeps huge caps below
        // the semaphore's permit limit.
        let slots = Arc::new(Semaphore::new(self.config.max_concurrent.min(queue.len()).max(1)));
        let mut running: JoinSet<CourseTimer> = JoinSet::new();
        let mut in_flight: HashMap<tokio::task::Id, CourseSummary> = HashMap::new();

        info!(
            run_id = %self.run_id,
            courses = queue.len(),
            max_concurrent = self.config.max_concurrent,
            "Scheduler run started"
        );

        let mut cancelled = false;
        loop {
            if running.is_empty() && queue.is_empty() {
                break;
            }
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            self.promote(&mut queue, &slots, &mut running, &mut in_flight, &ctx);

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                joined = running.join_next_with_id() => match joined {
                    Some(joined) => Self::collect(joined, &mut in_flight, &mut report),
                    None => break,
                },
            }
        }

        if cancelled {
            report.cancelled = true;
            // Timers observe the token at their next suspension point.
            while let Some(joined) = running.join_next_with_id().await {
                Self::collect(joined, &mut in_flight, &mut report);
            }
        }
        for timer in queue {
            report.record(timer.summary());
        }

        info!(
            run_id = %self.run_id,
            completed = report.completed_count(),
            failed = report.failed_count(),
            unfinished = report.unfinished_count(),
            submitted_secs = report.total_submitted_seconds(),
            cancelled = report.cancelled,
            "Scheduler run finished"
        );
        report
    }

    /// Start as many queued timers as there are free slots. Timers started in
    /// the same pass are staggered by their position in it.
    fn promote(
        &self,
        queue: &mut VecDeque<CourseTimer>,
        slots: &Arc<Semaphore>,
        running: &mut JoinSet<CourseTimer>,
        in_flight: &mut HashMap<tokio::task::Id, CourseSummary>,
        ctx: &Arc<HeartbeatContext>,
    ) {
        let mut position = 0usize;
        while !queue.is_empty() {
            let Ok(permit) = Arc::clone(slots).try_acquire_owned() else {
                break;
            };
            let Some(mut timer) = queue.pop_front() else {
                break;
            };
            timer.mark_running();
            let delay = self.stagger.offset(position);
            position += 1;

            let summary = timer.summary();
            let handle = running.spawn(run_heartbeat_loop(timer, delay, Arc::clone(ctx), permit));
            in_flight.insert(handle.id(), summary);
        }
        if position > 0 {
            debug!(promoted = position, waiting = queue.len(), "Promoted pending timers");
        }
    }

    fn collect(
        joined: Result<(tokio::task::Id, CourseTimer), JoinError>,
        in_flight: &mut HashMap<tokio::task::Id, CourseSummary>,
        report: &mut RunReport,
    ) {
        match joined {
            Ok((id, timer)) => {
                in_flight.remove(&id);
                report.record(timer.summary());
            }
            Err(e) => {
                let Some(mut summary) = in_flight.remove(&e.id()) else {
                    error!(error = %e, "Unknown course timer task failed");
                    return;
                };
                error!(course_id = %summary.course_id, error = %e, "Course timer task crashed");
                summary.status = TimerStatus::FailedTerminal;
                summary.last_error = Some(e.to_string());
                report.record(summary);
            }
        }
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}
