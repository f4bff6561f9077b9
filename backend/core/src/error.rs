use thiserror::Error;

/// Why a single progress submission did not succeed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionError {
    /// Network or server-side trouble; another attempt may succeed.
    #[error("retryable submission failure: {0}")]
    Retryable(String),

    /// Rejected credentials or malformed parameters; retrying cannot help.
    #[error("fatal submission failure: {0}")]
    Fatal(String),
}

impl SubmissionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmissionError::Retryable(_))
    }

    pub fn reason(&self) -> &str {
        match self {
            SubmissionError::Retryable(r) | SubmissionError::Fatal(r) => r,
        }
    }
}

/// Top-level error type for the CoursePace scheduling engine.
#[derive(Debug, Error)]
pub enum PacerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("cancelled")]
    Cancelled,

    #[error("course {course_id} is already {status}")]
    TimerFinished { course_id: String, status: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PacerError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PacerError::Cancelled)
    }
}
