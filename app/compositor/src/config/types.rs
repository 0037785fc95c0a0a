//! Configuration types for Lattice.
//!
//! All structs deserialize from JSONC with every field defaulted, so an
//! empty object is a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{sizes, timing};
use crate::tree::{BorderStyle, SplitLayout};

// ============================================================================
// Sections
// ============================================================================

/// Whether hovering a window moves keyboard focus to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FocusFollowsMouse {
    /// Hovering never changes focus.
    No,
    /// Focus follows when the hovered node changes.
    #[default]
    Yes,
    /// Focus follows on every motion event.
    Always,
}

/// Window decoration configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct BorderConfig {
    /// Border style for new windows.
    pub style: BorderStyle,

    /// Border thickness in logical pixels.
    pub thickness: f64,

    /// Height of the titlebar drawn by the `normal` style.
    pub titlebar_height: f64,
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            style: BorderStyle::Normal,
            thickness: sizes::DEFAULT_BORDER_THICKNESS,
            titlebar_height: sizes::DEFAULT_TITLEBAR_HEIGHT,
        }
    }
}

/// Gaps between tiled windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct GapsConfig {
    /// Gap between adjacent windows on the same output.
    pub inner: f64,
}

/// Per-output settings, matched by output name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputConfig {
    /// Connector name (e.g., "DP-1").
    pub name: String,

    /// Horizontal position in the global layout. Auto-placed when omitted.
    pub x: Option<f64>,

    /// Vertical position in the global layout. Auto-placed when omitted.
    pub y: Option<f64>,

    /// Output scale factor.
    pub scale: f64,

    /// Set to false to ignore the output when it is connected.
    pub enabled: bool,

    /// Split layout for this output. Defaults to `defaultLayout`.
    pub layout: Option<SplitLayout>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { name: String::new(), x: None, y: None, scale: 1.0, enabled: true, layout: None }
    }
}

/// Debug switches for the transaction engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct DebugConfig {
    /// Apply transactions without waiting for clients.
    pub noatomic: bool,

    /// Make every transaction wait for its timeout.
    pub txn_wait: bool,

    /// Log how long each transaction waited.
    pub txn_timings: bool,
}

// ============================================================================
// Root
// ============================================================================

/// Root configuration structure for Lattice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct LatticeConfig {
    /// How long a transaction waits for clients, in milliseconds.
    pub txn_timeout_ms: u64,

    /// Focus-follows-mouse behaviour.
    pub focus_follows_mouse: FocusFollowsMouse,

    /// Window decorations.
    pub border: BorderConfig,

    /// Gaps between windows.
    pub gaps: GapsConfig,

    /// Split layout of outputs without an explicit layout.
    pub default_layout: SplitLayout,

    /// Per-output settings.
    pub outputs: Vec<OutputConfig>,

    /// Transaction debugging switches.
    pub debug: DebugConfig,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            txn_timeout_ms: timing::DEFAULT_TXN_TIMEOUT_MS,
            focus_follows_mouse: FocusFollowsMouse::default(),
            border: BorderConfig::default(),
            gaps: GapsConfig::default(),
            default_layout: SplitLayout::default(),
            outputs: Vec::new(),
            debug: DebugConfig::default(),
        }
    }
}

impl LatticeConfig {
    /// Settings for the output with the given name.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&OutputConfig> {
        self.outputs.iter().find(|output| output.name == name)
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Errors that can occur when loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration file was found in any of the expected locations.
    #[error(
        "No configuration file found. Expected at $XDG_CONFIG_HOME/lattice/config.jsonc \
         or ~/.config/lattice/config.jsonc"
    )]
    NotFound,
    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration file contains invalid JSON.
    #[error("Failed to parse configuration file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration file names to search for (in priority order).
const CONFIG_FILE_NAMES: &[&str] = &["config.jsonc", "config.json"];

/// Returns the possible configuration file paths in priority order.
///
/// If `$XDG_CONFIG_HOME` is set it is searched first, then `~/.config/lattice/`,
/// then the platform configuration directory.
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut dirs_to_search = Vec::new();

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        dirs_to_search.push(PathBuf::from(xdg_config).join("lattice"));
    }
    if let Some(home) = dirs::home_dir() {
        dirs_to_search.push(home.join(".config").join("lattice"));
    }
    if let Some(config_dir) = dirs::config_dir() {
        dirs_to_search.push(config_dir.join("lattice"));
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    for dir in dirs_to_search {
        for filename in CONFIG_FILE_NAMES {
            let path = dir.join(filename);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    paths
}

/// Loads the configuration from the first available config file.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if no configuration file exists,
/// `ConfigError::Io` if it could not be read, and `ConfigError::Parse` if it
/// is not valid JSONC.
pub fn load_config() -> Result<(LatticeConfig, PathBuf), ConfigError> {
    let path = config_paths().into_iter().find(|path| path.exists()).ok_or(ConfigError::NotFound)?;
    let config = load_config_from_path(&path)?;
    Ok((config, path))
}

/// Loads the configuration from a specific file.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if the file does not exist, and the I/O
/// or parse error otherwise.
pub fn load_config_from_path(path: &Path) -> Result<LatticeConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound);
    }
    let file = fs::File::open(path)?;
    let reader = json_comments::StripComments::new(file);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use std::io::Write;

    use super::*;

    mod default_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = LatticeConfig::default();
            assert_eq!(config.txn_timeout_ms, 200);
            assert_eq!(config.focus_follows_mouse, FocusFollowsMouse::Yes);
            assert_eq!(config.border.style, BorderStyle::Normal);
            assert_eq!(config.border.thickness, 2.0);
            assert_eq!(config.border.titlebar_height, 20.0);
            assert_eq!(config.gaps.inner, 0.0);
            assert_eq!(config.default_layout, SplitLayout::Horizontal);
            assert!(!config.debug.noatomic);
        }

        #[test]
        fn test_empty_object_is_default() {
            let config: LatticeConfig = serde_json::from_str("{}").unwrap();
            assert_eq!(config, LatticeConfig::default());
        }
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_parse_camel_case_fields() {
            let json = r#"{
                "txnTimeoutMs": 50,
                "focusFollowsMouse": "always",
                "border": { "style": "pixel", "titlebarHeight": 24 },
                "gaps": { "inner": 8 },
                "defaultLayout": "vertical",
                "outputs": [{ "name": "DP-1", "x": 1920, "layout": "horizontal" }],
                "debug": { "txnWait": true }
            }"#;
            let config: LatticeConfig = serde_json::from_str(json).unwrap();

            assert_eq!(config.txn_timeout_ms, 50);
            assert_eq!(config.focus_follows_mouse, FocusFollowsMouse::Always);
            assert_eq!(config.border.style, BorderStyle::Pixel);
            assert_eq!(config.border.thickness, 2.0);
            assert_eq!(config.border.titlebar_height, 24.0);
            assert_eq!(config.gaps.inner, 8.0);
            assert_eq!(config.default_layout, SplitLayout::Vertical);
            assert!(config.debug.txn_wait);

            let output = config.output("DP-1").unwrap();
            assert_eq!(output.x, Some(1920.0));
            assert_eq!(output.y, None);
            assert_eq!(output.scale, 1.0);
            assert!(output.enabled);
            assert_eq!(output.layout, Some(SplitLayout::Horizontal));
            assert!(config.output("HDMI-A-1").is_none());
        }

        #[test]
        fn test_load_from_path_strips_comments() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(
                file,
                "{{\n  // shorter timeout\n  \"txnTimeoutMs\": 75, /* block */\n  \"gaps\": {{ \"inner\": 4 }}\n}}"
            )
            .unwrap();

            let config = load_config_from_path(file.path()).unwrap();
            assert_eq!(config.txn_timeout_ms, 75);
            assert_eq!(config.gaps.inner, 4.0);
        }

        #[test]
        fn test_load_from_missing_path_is_not_found() {
            let dir = tempfile::tempdir().unwrap();
            let result = load_config_from_path(&dir.path().join("missing.jsonc"));
            assert!(matches!(result, Err(ConfigError::NotFound)));
        }

        #[test]
        fn test_load_invalid_json_is_parse_error() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            write!(file, "{{ \"txnTimeoutMs\": }}").unwrap();

            let result = load_config_from_path(file.path());
            assert!(matches!(result, Err(ConfigError::Parse(_))));
        }
    }

    mod path_tests {
        use super::*;

        #[test]
        fn test_config_paths_prefer_jsonc() {
            let paths = config_paths();
            if let Some(first) = paths.first() {
                assert!(first.ends_with("config.jsonc"));
            }
            for path in &paths {
                assert!(path.to_string_lossy().contains("lattice"));
            }
        }
    }
}
