//! Log Redaction Layer
//!
//! Scrubs cookie headers, session ids, and bearer tokens from strings prior
//! to logging. Response bodies from the platform may echo any of these.

use regex::Regex;
use std::sync::LazyLock;

static COOKIE_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)((?:set-)?cookie:\s*)[^\r\n]+").unwrap());
static SESSION_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)((?:ASP\.NET_)?SessionId=)[^;&\s"']+"#).unwrap());
static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bearer\s+[a-zA-Z0-9\-\._~+/]+=*").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    // Whole cookie headers first; the session pattern would only catch part of them.
    let redacted = COOKIE_HEADER_RE.replace_all(input, "${1}[REDACTED_COOKIE]");
    let redacted = SESSION_ID_RE.replace_all(&redacted, "${1}[REDACTED]");
    BEARER_RE
        .replace_all(&redacted, "[REDACTED_TOKEN]")
        .into_owned()
}
