//! Configuration module for Lattice.
//!
//! The configuration file supports JSONC format (JSON with comments).
//! Both single-line (`//`) and multi-line (`/* */`) comments are allowed.
//! A missing or broken file never stops the compositor: the binary logs the
//! problem and continues with defaults.

mod types;

use std::path::{Path, PathBuf};

pub use types::{
    BorderConfig, ConfigError, DebugConfig, FocusFollowsMouse, GapsConfig, LatticeConfig,
    OutputConfig, config_paths, load_config, load_config_from_path,
};

/// Loads the configuration, falling back to defaults on any failure.
///
/// A custom path (from `--config`) replaces the search paths. Returns the
/// configuration and the file it came from, if any.
#[must_use]
pub fn load_or_default(custom_path: Option<&Path>) -> (LatticeConfig, Option<PathBuf>) {
    let result = custom_path.map_or_else(load_config, |path| {
        load_config_from_path(path).map(|config| (config, path.to_path_buf()))
    });

    match result {
        Ok((config, path)) => {
            tracing::debug!(path = %path.display(), "loaded configuration");
            (config, Some(path))
        }
        Err(ConfigError::NotFound) => {
            if let Some(path) = custom_path {
                tracing::warn!(path = %path.display(), "configuration file not found, using defaults");
            } else {
                tracing::debug!("no configuration file found, using defaults");
            }
            (LatticeConfig::default(), None)
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to load configuration, using defaults");
            (LatticeConfig::default(), None)
        }
    }
}

/// Generates a JSON Schema for the Lattice configuration.
#[must_use]
pub fn generate_schema() -> schemars::Schema {
    let mut schema = schemars::schema_for!(LatticeConfig);

    if let Some(obj) = schema.as_object_mut() {
        obj.insert("$id".to_string(), serde_json::json!("lattice.schema.json"));
    }

    schema
}

/// Generates a pretty-printed JSON Schema string for the configuration.
#[must_use]
pub fn generate_schema_json() -> String {
    serde_json::to_string_pretty(&generate_schema()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_generate_schema_produces_valid_json() {
        let schema_json = generate_schema_json();
        let parsed: serde_json::Value = serde_json::from_str(&schema_json).unwrap();

        assert_eq!(parsed["$id"], "lattice.schema.json");
        assert_eq!(parsed["title"], "LatticeConfig");
        assert!(parsed["properties"]["txnTimeoutMs"].is_object());
        assert!(parsed["properties"]["focusFollowsMouse"].is_object());
        assert!(parsed["properties"]["debug"].is_object());
    }

    #[test]
    fn test_load_or_default_with_custom_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "txnTimeoutMs": 20 }}"#).unwrap();

        let (config, path) = load_or_default(Some(file.path()));
        assert_eq!(config.txn_timeout_ms, 20);
        assert_eq!(path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_load_or_default_falls_back_on_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let (config, path) = load_or_default(Some(file.path()));
        assert_eq!(config, LatticeConfig::default());
        assert!(path.is_none());
    }
}
