pub mod error;
pub mod event;
pub mod traits;
pub mod types;

pub use error::{PacerError, SubmissionError};
pub use event::{EventKind, ProgressEvent};
pub use traits::{SubmissionClient, SubmissionOutcome};
pub use types::{CourseTask, SchedulerConfig, TimerStatus};
