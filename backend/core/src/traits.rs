use async_trait::async_trait;

use crate::error::SubmissionError;

/// Result of one progress-update call as classified by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The platform accepted the update; carries the response body.
    Success(String),
    /// Transport error, timeout or 5xx. Eligible for retry.
    RetryableFailure(String),
    /// Authentication rejected or parameters malformed. Never retried.
    FatalFailure(String),
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success(_))
    }

    pub fn into_result(self) -> Result<String, SubmissionError> {
        match self {
            SubmissionOutcome::Success(payload) => Ok(payload),
            SubmissionOutcome::RetryableFailure(reason) => Err(SubmissionError::Retryable(reason)),
            SubmissionOutcome::FatalFailure(reason) => Err(SubmissionError::Fatal(reason)),
        }
    }
}

/// Performs a single progress submission against the learning platform.
///
/// Implementations must not retry internally; retries belong to the scheduler's
/// retry policy so that backoff stays observable and cancellable.
#[async_trait]
pub trait SubmissionClient: Send + Sync {
    /// Report `elapsed_seconds` of additional watch-time for `course_id`.
    async fn submit_progress(
        &self,
        course_id: &str,
        record_id: &str,
        elapsed_seconds: u64,
    ) -> SubmissionOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_maps_onto_error_kinds() {
        assert_eq!(
            SubmissionOutcome::Success("ok".into()).into_result(),
            Ok("ok".to_string())
        );
        let err = SubmissionOutcome::RetryableFailure("502".into())
            .into_result()
            .unwrap_err();
        assert!(err.is_retryable());
        let err = SubmissionOutcome::FatalFailure("401".into())
            .into_result()
            .unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(err.reason(), "401");
    }
}
