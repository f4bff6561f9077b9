//! Telemetry and structured logging components for CoursePace.
//!
//! Handles log redaction, console and rolling NDJSON output, and the
//! progress-event reporter that drains a scheduler's event stream.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{CourseTally, ProgressLogger};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
