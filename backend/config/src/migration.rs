//! Legacy config migration.
//!
//! Early deployments used a flat `config.json`:
//! `{ cookies, base_url, update_interval_seconds, max_concurrent_videos, retry_attempts }`.
//! These keys are folded into the sectioned layout. Keys already present in
//! a section win over their flat counterparts.

use anyhow::{bail, Result};
use serde_json::{Map, Value};
use tracing::info;

/// Flat key → (section, key) moves.
const LEGACY_KEYS: &[(&str, &str, &str)] = &[
    ("cookies", "client", "cookies"),
    ("base_url", "client", "base_url"),
    ("update_interval_seconds", "scheduler", "tick_interval_seconds"),
    ("max_concurrent_videos", "scheduler", "max_concurrent"),
    ("retry_attempts", "scheduler", "retry_attempts"),
];

/// Fold legacy flat keys into sections. Returns the new value and whether
/// anything moved.
pub fn migrate(value: Value) -> Result<(Value, bool)> {
    let mut root = match value {
        Value::Object(map) => map,
        Value::Null => return Ok((Value::Object(Map::new()), false)),
        other => bail!("Config root must be a mapping, found {}", kind_of(&other)),
    };

    let mut mutated = false;
    for (flat, section, key) in LEGACY_KEYS {
        let Some(moved) = root.remove(*flat) else { continue };
        mutated = true;

        let target = root
            .entry(section.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if target.is_null() {
            *target = Value::Object(Map::new());
        }
        let Value::Object(section_map) = target else {
            bail!("Config section '{section}' must be a mapping");
        };
        section_map.entry(key.to_string()).or_insert(moved);
    }

    if mutated {
        info!("Migrated legacy flat config keys into sections");
    }
    Ok((Value::Object(root), mutated))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn folds_flat_layout() {
        let legacy = json!({
            "cookies": { "ASP.NET_SessionId": "abc" },
            "base_url": "http://www.gaoxiaokaoshi.com",
            "update_interval_seconds": 60,
            "max_concurrent_videos": 30,
            "retry_attempts": 3
        });
        let (value, mutated) = migrate(legacy).unwrap();
        assert!(mutated);
        assert_eq!(value["client"]["cookies"]["ASP.NET_SessionId"], "abc");
        assert_eq!(value["client"]["base_url"], "http://www.gaoxiaokaoshi.com");
        assert_eq!(value["scheduler"]["tick_interval_seconds"], 60);
        assert_eq!(value["scheduler"]["max_concurrent"], 30);
        assert!(value.get("cookies").is_none());
    }

    #[test]
    fn sectioned_keys_win() {
        let mixed = json!({
            "max_concurrent_videos": 30,
            "scheduler": { "max_concurrent": 5 }
        });
        let (value, _) = migrate(mixed).unwrap();
        assert_eq!(value["scheduler"]["max_concurrent"], 5);
    }

    #[test]
    fn current_layout_is_untouched() {
        let current = json!({ "scheduler": { "max_concurrent": 5 } });
        let (value, mutated) = migrate(current.clone()).unwrap();
        assert!(!mutated);
        assert_eq!(value, current);
    }

    #[test]
    fn empty_document_is_empty_mapping() {
        let (value, mutated) = migrate(Value::Null).unwrap();
        assert!(!mutated);
        assert_eq!(value, json!({}));
    }

    #[test]
    fn scalar_root_is_rejected() {
        assert!(migrate(json!("oops")).is_err());
    }
}
