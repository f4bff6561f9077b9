//! Config defaults: fills every optional section so downstream code can
//! read concrete values.

use crate::schema::{ClientConfig, LoggingConfig, PacerConfig};

/// Platform the original deployment targets.
pub const DEFAULT_BASE_URL: &str = "http://www.gaoxiaokaoshi.com";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Study plan id sent in the Referer.
pub const DEFAULT_PLAN_ID: &str = "32";

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_LOG_DIR: &str = "logs";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: PacerConfig) -> PacerConfig {
    let config = apply_scheduler_defaults(config);
    let config = apply_client_defaults(config);
    apply_logging_defaults(config)
}

fn apply_scheduler_defaults(mut config: PacerConfig) -> PacerConfig {
    config.scheduler.get_or_insert_with(Default::default);
    config
}

fn apply_client_defaults(mut config: PacerConfig) -> PacerConfig {
    let client = config.client.get_or_insert_with(ClientConfig::default);
    if client.base_url.is_none() {
        client.base_url = Some(DEFAULT_BASE_URL.to_string());
    }
    if client.request_timeout_secs.is_none() {
        client.request_timeout_secs = Some(DEFAULT_REQUEST_TIMEOUT_SECS);
    }
    if client.plan_id.is_none() {
        client.plan_id = Some(DEFAULT_PLAN_ID.to_string());
    }
    config
}

fn apply_logging_defaults(mut config: PacerConfig) -> PacerConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    if logging.dir.is_none() {
        logging.dir = Some(DEFAULT_LOG_DIR.to_string());
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_every_section() {
        let cfg = apply_all_defaults(PacerConfig::default());
        assert!(cfg.scheduler.is_some());
        let client = cfg.client.unwrap();
        assert_eq!(client.base_url.as_deref(), Some(DEFAULT_BASE_URL));
        assert_eq!(client.request_timeout_secs, Some(DEFAULT_REQUEST_TIMEOUT_SECS));
        assert_eq!(client.plan_id.as_deref(), Some("32"));
        assert_eq!(cfg.logging.unwrap().level.as_deref(), Some("info"));
    }

    #[test]
    fn does_not_override_user_values() {
        let mut cfg = PacerConfig::default();
        cfg.client = Some(ClientConfig {
            base_url: Some("https://mirror.example.com".into()),
            ..Default::default()
        });
        cfg.logging = Some(LoggingConfig {
            level: Some("warn".into()),
            dir: None,
        });
        let cfg = apply_all_defaults(cfg);
        assert_eq!(cfg.client().base_url.as_deref(), Some("https://mirror.example.com"));
        assert_eq!(cfg.logging().level.as_deref(), Some("warn"));
        assert_eq!(cfg.logging().dir.as_deref(), Some(DEFAULT_LOG_DIR));
    }
}
