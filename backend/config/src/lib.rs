//! `coursepace-config`: runtime configuration for CoursePace.
//!
//! Provides:
//! - Typed config schema (scheduler, client, logging)
//! - YAML/JSON loading with legacy flat-layout migration
//! - `COURSEPACE_*` environment overrides
//! - Default value application
//! - Validation with errors and warnings
//! - Redaction for safe display

pub mod defaults;
pub mod env;
pub mod io;
pub mod migration;
pub mod redact;
pub mod schema;
pub mod validation;

// Re-export most-used types at crate root.
pub use defaults::apply_all_defaults;
pub use env::{apply_env_overrides, apply_env_overrides_with};
pub use io::{load_config, load_config_value, CONFIG_FILE_NAME};
pub use migration::migrate;
pub use redact::redact;
pub use schema::{ClientConfig, LoggingConfig, PacerConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::Result;
use std::path::Path;

/// Load, apply env overrides and defaults, and validate a config file.
///
/// This is the main entry point for loading a config at runtime. Problems are
/// logged and returned in the report; the caller decides whether errors are fatal.
pub async fn load_and_prepare(path: &Path) -> Result<(PacerConfig, ValidationReport)> {
    let config = load_config(path).await?;
    let config = apply_env_overrides(config)?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }

    Ok((config, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn prepared_config_has_every_section() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "client:\n  cookie: ASP.NET_SessionId=abc").unwrap();
        let (config, report) = load_and_prepare(file.path()).await.unwrap();
        assert!(config.scheduler.is_some());
        assert!(config.logging.is_some());
        assert_eq!(config.client().plan_id.as_deref(), Some("32"));
        assert!(report.is_valid());
    }
}
