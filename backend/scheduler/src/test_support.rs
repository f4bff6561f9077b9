//! In-memory submission client for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;

use coursepace_core::{SubmissionClient, SubmissionOutcome};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub course_id: String,
    pub seconds: u64,
    pub at: Instant,
}

/// Replays a per-course script of outcomes, then falls back to a default.
pub struct ScriptedClient {
    fallback: SubmissionOutcome,
    scripts: Mutex<HashMap<String, VecDeque<SubmissionOutcome>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedClient {
    pub fn always_ok() -> Self {
        Self::with_fallback(SubmissionOutcome::Success("ok".into()))
    }

    pub fn always_failing() -> Self {
        Self::with_fallback(SubmissionOutcome::RetryableFailure("503 Service Unavailable".into()))
    }

    fn with_fallback(fallback: SubmissionOutcome) -> Self {
        Self {
            fallback,
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_script(self, course_id: &str, outcomes: Vec<SubmissionOutcome>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(course_id.to_string(), outcomes.into());
        self
    }

    pub fn calls(&self, course_id: &str) -> usize {
        self.history(course_id).len()
    }

    pub fn submitted_seconds(&self, course_id: &str) -> Vec<u64> {
        self.history(course_id).iter().map(|c| c.seconds).collect()
    }

    pub fn history(&self, course_id: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.course_id == course_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SubmissionClient for ScriptedClient {
    async fn submit_progress(
        &self,
        course_id: &str,
        _record_id: &str,
        elapsed_seconds: u64,
    ) -> SubmissionOutcome {
        self.calls.lock().unwrap().push(RecordedCall {
            course_id: course_id.to_string(),
            seconds: elapsed_seconds,
            at: Instant::now(),
        });
        self.scripts
            .lock()
            .unwrap()
            .get_mut(course_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| self.fallback.clone())
    }
}
