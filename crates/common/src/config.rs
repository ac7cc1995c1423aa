//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Editing defaults.
    pub editor: EditorDefaults,

    /// Collaboration channel settings.
    pub sync: SyncConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Editing defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorDefaults {
    /// Maximum number of undo snapshots retained.
    pub history_capacity: usize,

    /// Snap distance in screen pixels.
    pub snap_threshold_px: f64,
}

/// Collaboration channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Endpoint of the project room (e.g. `wss://host/ws/42`).
    pub url: String,

    /// Interval between keep-alive heartbeats while the channel is open.
    pub heartbeat_interval_ms: u64,

    /// Base delay for exponential reconnect backoff.
    pub reconnect_base_delay_ms: u64,

    /// Reconnect attempts before giving up.
    pub max_reconnect_attempts: u32,

    /// Minimum spacing between playhead presence messages.
    pub cursor_throttle_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "splice_sync=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            editor: EditorDefaults::default(),
            sync: SyncConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EditorDefaults {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            snap_threshold_px: 8.0,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8000/ws".to_string(),
            heartbeat_interval_ms: 5_000,
            reconnect_base_delay_ms: 1_000,
            max_reconnect_attempts: 10,
            cursor_throttle_ms: 200,
        }
    }
}

impl SyncConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn reconnect_base_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_base_delay_ms)
    }

    pub fn cursor_throttle(&self) -> Duration {
        Duration::from_millis(self.cursor_throttle_ms)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("splice").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_constants() {
        let config = AppConfig::default();
        assert_eq!(config.editor.history_capacity, 100);
        assert_eq!(config.sync.heartbeat_interval(), Duration::from_secs(5));
        assert_eq!(config.sync.reconnect_base_delay(), Duration::from_secs(1));
        assert_eq!(config.sync.max_reconnect_attempts, 10);
        assert_eq!(config.sync.cursor_throttle(), Duration::from_millis(200));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let raw = r#"{ "sync": { "url": "wss://example.test/ws/7" } }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.sync.url, "wss://example.test/ws/7");
        assert_eq!(config.sync.heartbeat_interval_ms, 5_000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_missing_path_uses_defaults() {
        let path = std::env::temp_dir().join("splice_missing_config.json");
        let _ = std::fs::remove_file(&path);
        let config = AppConfig::load_from(&path);
        assert_eq!(config.editor.snap_threshold_px, 8.0);
    }

    #[test]
    fn test_load_from_invalid_json_uses_defaults() {
        let path = std::env::temp_dir().join("splice_invalid_config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let config = AppConfig::load_from(&path);
        assert_eq!(config.editor.history_capacity, 100);
        std::fs::remove_file(&path).ok();
    }
}
