//! Heartbeat loop: drives one course timer until it is terminal.
//!
//! Each promoted timer runs this loop in its own task. Ticks are spaced by
//! the tick interval measured from the end of the previous tick, so a tick
//! that spent time in retry backoff pushes the next one back rather than
//! bunching them up.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, OwnedSemaphorePermit};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use coursepace_core::{EventKind, ProgressEvent, SubmissionClient};

use crate::retry::RetryPolicy;
use crate::timer::{CourseTimer, TickOutcome};
use crate::wait::sleep_or_cancel;

/// Everything a heartbeat loop shares with its siblings.
pub(crate) struct HeartbeatContext {
    pub run_id: Uuid,
    pub client: Arc<dyn SubmissionClient>,
    pub retry: RetryPolicy,
    pub tick_interval: Duration,
    pub warmup_seconds: u64,
    pub cancel: CancellationToken,
    pub events: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl HeartbeatContext {
    pub fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.events {
            // A dropped reporter must not stall the run.
            let _ = tx.send(event);
        }
    }

    fn event(&self, timer: &CourseTimer, kind: EventKind) -> ProgressEvent {
        ProgressEvent::new(
            self.run_id,
            timer.course_id(),
            kind,
            timer.cumulative_submitted_seconds(),
            timer.remaining_seconds(),
        )
    }
}

/// Run `timer` until it completes, fails terminally, or the run is cancelled.
/// The admission permit is held for the whole loop and released on return.
pub(crate) async fn run_heartbeat_loop(
    mut timer: CourseTimer,
    first_tick_delay: Duration,
    ctx: Arc<HeartbeatContext>,
    _permit: OwnedSemaphorePermit,
) -> CourseTimer {
    ctx.emit(
        ctx.event(&timer, EventKind::TimerStarted)
            .with_detail(format!("first tick in {}ms", first_tick_delay.as_millis())),
    );
    info!(
        course_id = %timer.course_id(),
        course = %timer.task().display_name(),
        required = timer.remaining_seconds(),
        delay_ms = first_tick_delay.as_millis() as u64,
        "Starting course timer"
    );

    if !sleep_or_cancel(first_tick_delay, &ctx.cancel).await {
        return timer;
    }

    if ctx.warmup_seconds > 0 {
        match timer
            .warm_up(Instant::now(), ctx.warmup_seconds, ctx.client.as_ref(), &ctx.cancel)
            .await
        {
            Ok(accepted) => {
                let event = ctx
                    .event(&timer, EventKind::WarmupSent)
                    .with_submitted(ctx.warmup_seconds)
                    .with_detail(if accepted { "accepted" } else { "rejected" });
                ctx.emit(event);
            }
            Err(_) => return timer,
        }
        if !sleep_or_cancel(ctx.tick_interval, &ctx.cancel).await {
            return timer;
        }
    }

    loop {
        let outcome = match timer
            .tick(Instant::now(), ctx.client.as_ref(), &ctx.retry, &ctx.cancel)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(course_id = %timer.course_id(), error = %e, "Heartbeat loop stopped");
                return timer;
            }
        };

        let event = match &outcome {
            TickOutcome::Progressed { submitted, .. } => {
                ctx.event(&timer, EventKind::Progressed).with_submitted(*submitted)
            }
            TickOutcome::Completed { submitted } => {
                ctx.event(&timer, EventKind::Completed).with_submitted(*submitted)
            }
            TickOutcome::TransientFailure(error) => ctx
                .event(&timer, EventKind::TransientFailure)
                .with_detail(error.to_string()),
            TickOutcome::Failed(error) => {
                ctx.event(&timer, EventKind::Failed).with_detail(error.to_string())
            }
        };
        ctx.emit(event);

        if outcome.is_terminal() {
            return timer;
        }
        if !sleep_or_cancel(ctx.tick_interval, &ctx.cancel).await {
            return timer;
        }
    }
}
