use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use tracing::debug;

use coursepace_core::{SubmissionClient, SubmissionOutcome};
use coursepace_logging::redact_sensitive_data;

use crate::classify::{classify_response, classify_transport_error};
use crate::params::StudyParams;

const UPDATE_PATH: &str = "/Study/updateTime.ashx";
const STUDY_PAGE_PATH: &str = "/Study/LibraryStudy.aspx";
const DEFAULT_PLAN_ID: &str = "32";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Progress submissions over HTTP, one GET per call.
pub struct HttpSubmissionClient {
    client: Client,
    base_url: String,
    plan_id: String,
    courses: HashMap<String, StudyParams>,
}

impl HttpSubmissionClient {
    /// Build a client for `base_url`, sending `cookie` (a full `Cookie`
    /// header value) with every request.
    pub fn new(
        base_url: impl Into<String>,
        cookie: Option<&str>,
        user_agent: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
        );
        if let Some(cookie) = cookie.filter(|c| !c.trim().is_empty()) {
            let value = HeaderValue::from_str(cookie).context("Cookie header contains invalid characters")?;
            headers.insert(header::COOKIE, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            plan_id: DEFAULT_PLAN_ID.to_string(),
            courses: HashMap::new(),
        })
    }

    pub fn with_plan_id(mut self, plan_id: impl Into<String>) -> Self {
        self.plan_id = plan_id.into();
        self
    }

    /// Attach the study parameters a course's submissions must carry.
    pub fn register(&mut self, course_id: impl Into<String>, params: StudyParams) {
        self.courses.insert(course_id.into(), params);
    }

    pub fn registered(&self) -> usize {
        self.courses.len()
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, UPDATE_PATH)
    }

    pub fn referer(&self, params: &StudyParams) -> String {
        format!(
            "{}{}?Id={}&PlanId={}",
            self.base_url, STUDY_PAGE_PATH, params.ref_id, self.plan_id
        )
    }
}

#[async_trait]
impl SubmissionClient for HttpSubmissionClient {
    async fn submit_progress(
        &self,
        course_id: &str,
        record_id: &str,
        elapsed_seconds: u64,
    ) -> SubmissionOutcome {
        let Some(params) = self.courses.get(course_id) else {
            return SubmissionOutcome::FatalFailure(format!(
                "no study parameters registered for course {course_id}"
            ));
        };

        let seconds = elapsed_seconds.to_string();
        let mut query: Vec<(&str, &str)> = vec![("Id", record_id), ("pTime", seconds.as_str())];
        query.extend(params.query_pairs());

        debug!(course_id, record_id, seconds = elapsed_seconds, "Submitting progress");
        let response = self
            .client
            .get(self.endpoint())
            .query(&query)
            .header(header::REFERER, self.referer(params))
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => return classify_transport_error(&e),
        };
        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return classify_transport_error(&e),
        };

        let outcome = classify_response(status, &body);
        if !outcome.is_success() {
            debug!(
                course_id,
                status,
                body = %redact_sensitive_data(&body.chars().take(200).collect::<String>()),
                "Progress endpoint returned an error"
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> StudyParams {
        StudyParams {
            ref_id: "4411".into(),
            student_id: "s-9".into(),
            pass_line: "45".into(),
            study_time: "0".into(),
            session_id: "abc".into(),
        }
    }

    fn client(base: &str) -> HttpSubmissionClient {
        HttpSubmissionClient::new(base, Some("ASP.NET_SessionId=xyz"), None, Duration::from_secs(2))
            .unwrap()
    }

    #[test]
    fn builds_endpoint_and_referer() {
        let client = client("http://www.example.com/").with_plan_id("7");
        assert_eq!(client.endpoint(), "http://www.example.com/Study/updateTime.ashx");
        assert_eq!(
            client.referer(&params()),
            "http://www.example.com/Study/LibraryStudy.aspx?Id=4411&PlanId=7"
        );
    }

    #[test]
    fn rejects_unprintable_cookie() {
        let result = HttpSubmissionClient::new(
            "http://www.example.com",
            Some("bad\nvalue"),
            None,
            Duration::from_secs(2),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn unregistered_course_is_fatal() {
        let client = client("http://www.example.com");
        let outcome = client.submit_progress("unknown", "r-1", 61).await;
        assert!(matches!(outcome, SubmissionOutcome::FatalFailure(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_retryable() {
        let mut client = client("http://127.0.0.1:9");
        client.register("c-1", params());
        assert_eq!(client.registered(), 1);
        let outcome = client.submit_progress("c-1", "r-1", 61).await;
        assert!(matches!(outcome, SubmissionOutcome::RetryableFailure(_)));
    }
}
