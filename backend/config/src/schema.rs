//! CoursePace runtime configuration schema.
//!
//! Sections are optional on disk; `apply_all_defaults` fills them in.

use std::collections::BTreeMap;

use coursepace_core::SchedulerConfig;
use serde::{Deserialize, Serialize};

/// Root configuration for a CoursePace run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PacerConfig {
    /// Pacing, concurrency and retry behaviour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<SchedulerConfig>,

    /// Platform endpoint and session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

/// How to reach the learning platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Session cookies by name, as exported from a logged-in browser.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cookies: BTreeMap<String, String>,

    /// A raw `Cookie` header; takes precedence over `cookies`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl ClientConfig {
    /// The `Cookie` header to send, if any session material is configured.
    pub fn cookie_header(&self) -> Option<String> {
        if let Some(raw) = self.cookie.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            return Some(raw.to_string());
        }
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `coursepace_scheduler=debug`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Directory for the rolling NDJSON log
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl PacerConfig {
    /// Scheduler settings, falling back to the built-in defaults.
    pub fn scheduler(&self) -> SchedulerConfig {
        self.scheduler.clone().unwrap_or_default()
    }

    pub fn client(&self) -> ClientConfig {
        self.client.clone().unwrap_or_default()
    }

    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }
}
