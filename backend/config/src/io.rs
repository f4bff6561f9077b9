//! Config file reading.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info};

use crate::migration::migrate;
use crate::schema::PacerConfig;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "coursepace.yaml";

/// Read a config document as an untyped value. YAML and JSON are both
/// accepted since JSON is valid YAML.
///
/// Returns an empty mapping if the file doesn't exist (first run).
pub async fn load_config_value(path: &Path) -> Result<Value> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(Value::Object(Default::default()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }

    let value: Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config at: {}", path.display()))?;
    Ok(value)
}

/// Load, migrate and type-check the config at `path`.
pub async fn load_config(path: &Path) -> Result<PacerConfig> {
    let value = load_config_value(path).await?;
    let (value, migrated) = migrate(value)?;
    let config: PacerConfig = serde_json::from_value(value)
        .with_context(|| format!("Invalid config at: {}", path.display()))?;

    info!(path = %path.display(), migrated, "Loaded config");
    Ok(config)
}
