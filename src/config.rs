//! Application configuration.
//!
//! Loaded from `$XDG_CONFIG_HOME/zonetile/config.json`.  Every section is
//! optional; a minimal `{}` file is valid and missing values fall back to
//! their compiled-in defaults.
//!
//! # Example
//!
//! ```json
//! {
//!   "animation": {
//!     "enabled": true,
//!     "duration_ms": 300,
//!     "stagger_ms": 30,
//!     "easing": "out-cubic"
//!   },
//!   "grid": { "rows": 4, "standard_columns": 6, "ultrawide_columns": 12 },
//!   "socket_path": "/run/user/1000/zonetile.sock"
//! }
//! ```

use crate::easing::Easing;
use crate::geometry::GridDefaults;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Window transition settings.
    #[serde(default)]
    pub animation: AnimationConfig,

    /// Grid shape synthesized for monitors without a saved layer.
    #[serde(default)]
    pub grid: GridDefaults,

    /// Command socket; defaults to `$XDG_RUNTIME_DIR/zonetile.sock`.
    #[serde(default)]
    pub socket_path: Option<String>,
}

/// Window transition settings.  Durations are in **milliseconds**.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// When `false`, windows jump straight to their targets.
    pub enabled: bool,
    /// Length of one transition.  Clamped to 50..=1000.
    pub duration_ms: u64,
    /// Delay between consecutive windows when a whole layer is applied.
    /// At most 1000.
    pub stagger_ms: u64,
    pub easing: Easing,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_ms: 300,
            stagger_ms: 30,
            easing: Easing::OutCubic,
        }
    }
}

impl AnimationConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    fn tmp_path() -> std::path::PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!("zonetile-config-{}-{}.json", std::process::id(), id))
    }

    #[test]
    fn deserialize_full_config() {
        let json = r#"{
            "animation": {
                "enabled": false,
                "duration_ms": 150,
                "stagger_ms": 0,
                "easing": "linear"
            },
            "grid": { "rows": 3, "standard_columns": 4, "ultrawide_columns": 8 },
            "socket_path": "/tmp/zt.sock"
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert!(!cfg.animation.enabled);
        assert_eq!(cfg.animation.duration(), Duration::from_millis(150));
        assert_eq!(cfg.animation.stagger(), Duration::ZERO);
        assert_eq!(cfg.animation.easing, Easing::Linear);
        assert_eq!(cfg.grid.rows, 3);
        assert_eq!(cfg.grid.ultrawide_columns, 8);
        assert_eq!(cfg.socket_path.as_deref(), Some("/tmp/zt.sock"));
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        let ad = AnimationConfig::default();
        assert_eq!(cfg.animation.enabled, ad.enabled);
        assert_eq!(cfg.animation.duration_ms, 300);
        assert_eq!(cfg.animation.stagger_ms, 30);
        assert_eq!(cfg.animation.easing, Easing::OutCubic);
        assert_eq!(cfg.grid, GridDefaults::default());
        assert!(cfg.socket_path.is_none());
    }

    #[test]
    fn deserialize_partial_sections() {
        let json = r#"{ "animation": { "duration_ms": 500 }, "grid": { "rows": 2 } }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.animation.duration_ms, 500);
        assert!(cfg.animation.enabled);
        assert_eq!(cfg.grid.rows, 2);
        assert_eq!(cfg.grid.standard_columns, 6);
    }

    #[test]
    fn unknown_top_level_keys_ignored() {
        let json = r#"{ "animation": {}, "future_section": { "key": 42 } }"#;
        let _cfg: Config = serde_json::from_str(json).unwrap();
    }

    #[test]
    fn load_reports_missing_and_malformed_files() {
        let path = tmp_path();
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("failed to read"));

        std::fs::write(&path, "{ nope").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));

        std::fs::write(&path, r#"{ "animation": { "easing": "ease" } }"#).unwrap();
        assert_eq!(Config::load(&path).unwrap().animation.easing, Easing::Ease);
        let _ = std::fs::remove_file(&path);
    }
}
