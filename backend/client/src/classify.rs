//! Maps raw HTTP results onto the scheduler's tri-state submission outcome.
//!
//! The endpoint answers a successful update with a short plain-text body.
//! An expired session redirects to the login page, which arrives as a 200
//! with HTML; a server fault arrives as an ASP.NET error page.

use coursepace_core::SubmissionOutcome;

/// Longest body excerpt carried in a failure reason.
const REASON_EXCERPT: usize = 120;

/// Classify a completed HTTP exchange.
pub fn classify_response(status: u16, body: &str) -> SubmissionOutcome {
    match status {
        200..=299 => classify_success_body(status, body),
        401 | 403 => SubmissionOutcome::FatalFailure(format!("HTTP {status}: authentication rejected")),
        408 | 429 => SubmissionOutcome::RetryableFailure(format!("HTTP {status}: {}", excerpt(body))),
        400..=499 => SubmissionOutcome::FatalFailure(format!("HTTP {status}: {}", excerpt(body))),
        _ => SubmissionOutcome::RetryableFailure(format!("HTTP {status}: {}", excerpt(body))),
    }
}

/// Classify a request that never produced a response.
pub fn classify_transport_error(err: &reqwest::Error) -> SubmissionOutcome {
    if err.is_builder() {
        // The URL or headers are malformed; the same request will fail again.
        return SubmissionOutcome::FatalFailure(format!("invalid request: {err}"));
    }
    SubmissionOutcome::RetryableFailure(format!("transport error: {err}"))
}

fn classify_success_body(status: u16, body: &str) -> SubmissionOutcome {
    let lower = body.to_ascii_lowercase();
    if !lower.contains("<html") {
        return SubmissionOutcome::Success(body.trim().to_string());
    }
    if looks_like_login_page(&lower) {
        return SubmissionOutcome::FatalFailure(format!(
            "HTTP {status}: session expired, login page returned"
        ));
    }
    SubmissionOutcome::RetryableFailure(format!("HTTP {status}: HTML error page returned"))
}

fn looks_like_login_page(lower: &str) -> bool {
    lower.contains("login.aspx") || lower.contains("txtpassword") || lower.contains("type=\"password\"")
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(REASON_EXCERPT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_body_is_success() {
        assert_eq!(
            classify_response(200, "success\r\n"),
            SubmissionOutcome::Success("success".into())
        );
        assert!(classify_response(200, "").is_success());
    }

    #[test]
    fn login_page_means_expired_session() {
        let body = r#"<html><form action="/Login.aspx"><input type="password" name="txtPassword"/></form></html>"#;
        assert!(matches!(classify_response(200, body), SubmissionOutcome::FatalFailure(_)));
    }

    #[test]
    fn html_error_page_is_retryable() {
        let body = "<HTML><head><title>Runtime Error</title></head><body>Server Error in '/' Application.</body></HTML>";
        assert!(matches!(classify_response(200, body), SubmissionOutcome::RetryableFailure(_)));
    }

    #[test]
    fn server_errors_are_retryable() {
        for status in [500, 502, 503, 504, 429, 408] {
            assert!(
                matches!(classify_response(status, "busy"), SubmissionOutcome::RetryableFailure(_)),
                "status {status}"
            );
        }
    }

    #[test]
    fn client_errors_are_fatal() {
        for status in [400, 401, 403, 404] {
            assert!(
                matches!(classify_response(status, ""), SubmissionOutcome::FatalFailure(_)),
                "status {status}"
            );
        }
    }

    #[test]
    fn long_bodies_are_truncated_in_reasons() {
        let body = "x".repeat(1_000);
        let SubmissionOutcome::RetryableFailure(reason) = classify_response(500, &body) else {
            panic!("expected retryable failure");
        };
        assert!(reason.len() < 200);
        assert!(reason.ends_with("..."));
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        let body = "错".repeat(REASON_EXCERPT + 5);
        let cut = excerpt(&body);
        assert_eq!(cut.chars().count(), REASON_EXCERPT + 3);
    }
}
