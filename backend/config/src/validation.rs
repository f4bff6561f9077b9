//! Config validation: collects every problem in one pass.

use crate::schema::PacerConfig;
use thiserror::Error;

/// Concurrency above this risks the platform flagging the account.
pub const RECOMMENDED_MAX_CONCURRENT: usize = 30;

/// The platform credits at most one minute per update.
pub const RECOMMENDED_MIN_INTERVAL_SECS: u64 = 60;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &PacerConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_scheduler(config, &mut report);
    validate_client(config, &mut report);
    report
}

fn validate_scheduler(config: &PacerConfig, report: &mut ValidationReport) {
    let scheduler = config.scheduler();

    if scheduler.max_concurrent == 0 {
        report.error("scheduler.max_concurrent", "Must be at least 1");
    } else if scheduler.max_concurrent > RECOMMENDED_MAX_CONCURRENT {
        report.warn(
            "scheduler.max_concurrent",
            format!(
                "{} concurrent courses exceeds the recommended {RECOMMENDED_MAX_CONCURRENT}",
                scheduler.max_concurrent
            ),
        );
    }

    if scheduler.tick_interval_seconds == 0 {
        report.error("scheduler.tick_interval_seconds", "Must be at least 1");
    } else if scheduler.tick_interval_seconds < RECOMMENDED_MIN_INTERVAL_SECS {
        report.warn(
            "scheduler.tick_interval_seconds",
            format!(
                "Intervals below {RECOMMENDED_MIN_INTERVAL_SECS}s may be rejected by the platform"
            ),
        );
    }

    if scheduler.failure_ceiling == 0 {
        report.error("scheduler.failure_ceiling", "Must be at least 1");
    }

    if scheduler.backoff_base_ms > scheduler.backoff_max_ms {
        report.error(
            "scheduler.backoff_base_ms",
            format!(
                "Base delay {}ms exceeds maximum delay {}ms",
                scheduler.backoff_base_ms, scheduler.backoff_max_ms
            ),
        );
    }
}

fn validate_client(config: &PacerConfig, report: &mut ValidationReport) {
    let client = config.client();

    if let Some(base_url) = &client.base_url {
        match url::Url::parse(base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {}
            Ok(url) => report.error(
                "client.base_url",
                format!("Unsupported URL '{url}'. Use an http(s) address"),
            ),
            Err(e) => report.error("client.base_url", format!("Malformed URL '{base_url}': {e}")),
        }
    }

    if client.request_timeout_secs == Some(0) {
        report.error("client.request_timeout_secs", "Must be at least 1");
    }

    if client.cookie_header().is_none() {
        report.warn(
            "client.cookies",
            "No session cookie configured; the platform will reject submissions",
        );
    }
}
