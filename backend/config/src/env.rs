//! Environment overrides for config values.
//!
//! Each `COURSEPACE_*` variable replaces one field after the file is loaded.
//! Empty values are ignored.

use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::debug;

use crate::schema::{ClientConfig, LoggingConfig, PacerConfig};

pub const ENV_MAX_CONCURRENT: &str = "COURSEPACE_MAX_CONCURRENT";
pub const ENV_TICK_INTERVAL: &str = "COURSEPACE_TICK_INTERVAL";
pub const ENV_RETRY_ATTEMPTS: &str = "COURSEPACE_RETRY_ATTEMPTS";
pub const ENV_BASE_URL: &str = "COURSEPACE_BASE_URL";
pub const ENV_COOKIE: &str = "COURSEPACE_COOKIE";
pub const ENV_LOG_LEVEL: &str = "COURSEPACE_LOG_LEVEL";

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: PacerConfig) -> Result<PacerConfig> {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply overrides from a provided map (useful for testing).
pub fn apply_env_overrides_with(
    mut config: PacerConfig,
    env: &HashMap<String, String>,
) -> Result<PacerConfig> {
    let lookup = |name: &str| {
        env.get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let mut scheduler = config.scheduler();
    let mut touched_scheduler = false;
    if let Some(raw) = lookup(ENV_MAX_CONCURRENT) {
        scheduler.max_concurrent = parse(ENV_MAX_CONCURRENT, &raw)?;
        touched_scheduler = true;
    }
    if let Some(raw) = lookup(ENV_TICK_INTERVAL) {
        scheduler.tick_interval_seconds = parse(ENV_TICK_INTERVAL, &raw)?;
        touched_scheduler = true;
    }
    if let Some(raw) = lookup(ENV_RETRY_ATTEMPTS) {
        scheduler.retry_attempts = parse(ENV_RETRY_ATTEMPTS, &raw)?;
        touched_scheduler = true;
    }
    if touched_scheduler {
        config.scheduler = Some(scheduler);
    }

    if let Some(url) = lookup(ENV_BASE_URL) {
        debug!(var = ENV_BASE_URL, "Overriding base URL from environment");
        config.client.get_or_insert_with(ClientConfig::default).base_url = Some(url);
    }
    if let Some(cookie) = lookup(ENV_COOKIE) {
        debug!(var = ENV_COOKIE, "Overriding cookie from environment");
        config.client.get_or_insert_with(ClientConfig::default).cookie = Some(cookie);
    }
    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.logging.get_or_insert_with(LoggingConfig::default).level = Some(level);
    }

    Ok(config)
}

fn parse<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("Environment variable {name} has invalid value \"{raw}\""))
}
