//! Concurrent progress-submission scheduler.
//!
//! A [`Scheduler`] admits [`CourseTask`](coursepace_core::CourseTask)s, runs one
//! [`CourseTimer`] per course under a concurrency cap, and reports each
//! course's terminal status in a [`RunReport`].

mod heartbeat;
pub mod report;
pub mod retry;
pub mod scheduler;
pub mod stagger;
pub mod timer;
pub mod wait;

#[cfg(test)]
pub(crate) mod test_support;

pub use report::{CourseSummary, RunReport};
pub use retry::{RetryOutcome, RetryPolicy};
pub use scheduler::{Admission, Scheduler};
pub use stagger::StaggerPolicy;
pub use timer::{CourseTimer, TickOutcome};
