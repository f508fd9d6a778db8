//! Configuration management for the SliMP3 server
//!
//! Configuration is read from a platform-specific TOML file. Every section
//! and field is optional; anything missing takes its default.
//!
//! ## Config File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/slimp3-server/config.toml` |
//! | macOS | `~/Library/Application Support/slimp3-server/config.toml` |
//! | Windows | `%APPDATA%\slimp3-server\config.toml` |
//!
//! ## Example
//!
//! ```no_run
//! use slimp3_server::Config;
//!
//! let mut config = Config::load().unwrap_or_default();
//! config.screensaver.timeout_secs = 300;
//! config.save().expect("Failed to save config");
//! ```

use crate::client::ClientSettings;
use crate::display::{AnimatorSettings, ScreenSaverKind, ScrollStrategy};
use crate::keys::{HoldThreshold, KeyTiming};
use crate::protocol::DEFAULT_PORT;
use crate::server::ServerSettings;
use crate::vfd::MAX_BRIGHTNESS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine config directory
    #[error("Could not determine config directory")]
    NoConfigDir,
    /// IO error reading or writing config file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Failed to parse config file
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize config
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Returns the path to the config file.
///
/// Creates the config directory if it doesn't exist.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    let app_dir = config_dir.join("slimp3-server");

    if !app_dir.exists() {
        fs::create_dir_all(&app_dir)?;
    }

    Ok(app_dir.join("config.toml"))
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub screensaver: ScreenSaverConfig,
}

/// Network and client lifetime settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// UDP port to listen on
    pub port: u16,
    /// Seconds of silence before a terminal is dropped
    pub stale_after_secs: u64,
    /// Seconds between checks for silent terminals
    pub stale_check_interval_secs: u64,
    /// Show the main screen instead of the clock when a terminal appears
    pub start_powered_on: bool,
    /// Lines of the main screen
    pub greeting: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            stale_after_secs: 60,
            stale_check_interval_secs: 10,
            start_powered_on: false,
            greeting: vec!["SliMP3".to_string(), "Ready".to_string()],
        }
    }
}

/// Remote control key timing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeysConfig {
    /// Period of the release check in ms
    pub check_interval_ms: u64,
    /// Time down before a press counts as held, in ms
    pub hold_threshold_ms: u64,
    /// Count observations instead of time: reports before a press is held
    pub hold_count: Option<u32>,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 256,
            hold_threshold_ms: 512,
            hold_count: None,
        }
    }
}

/// Display rendering settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Initial brightness, 0 (off) to 3
    pub brightness: u8,
    /// Display update period in ms
    pub refresh_interval_ms: u64,
    /// How long volume and state overlays stay up, in seconds
    pub overlay_duration_secs: u64,
    /// Frames to wait before a long line starts scrolling
    pub scroll_hold_frames: u32,
    pub scroll: ScrollStrategy,
    /// Volume change per key action, in percent
    pub volume_step: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            brightness: MAX_BRIGHTNESS,
            refresh_interval_ms: 250,
            overlay_duration_secs: 3,
            scroll_hold_frames: 10,
            scroll: ScrollStrategy::Crawl,
            volume_step: 5,
        }
    }
}

/// Screensaver settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScreenSaverConfig {
    pub kind: ScreenSaverKind,
    /// Seconds without display changes before the screensaver starts
    pub timeout_secs: u64,
}

impl Default for ScreenSaverConfig {
    fn default() -> Self {
        Self {
            kind: ScreenSaverKind::Blank,
            timeout_secs: 120,
        }
    }
}

impl Config {
    /// Load configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default config file.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.display.refresh_interval_ms)
    }

    pub fn screensaver_timeout(&self) -> Duration {
        Duration::from_secs(self.screensaver.timeout_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.server.stale_after_secs)
    }

    pub fn key_timing(&self) -> KeyTiming {
        let hold = match self.keys.hold_count {
            Some(count) => HoldThreshold::Count(count),
            None => HoldThreshold::Elapsed(Duration::from_millis(self.keys.hold_threshold_ms)),
        };
        KeyTiming {
            check_interval: Duration::from_millis(self.keys.check_interval_ms),
            hold,
        }
    }

    pub fn animator_settings(&self) -> AnimatorSettings {
        AnimatorSettings {
            hold_count: self.display.scroll_hold_frames,
            scroll: self.display.scroll,
            screensaver: self.screensaver.kind,
            screensaver_timeout: self.screensaver_timeout(),
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            key_timing: self.key_timing(),
            animator: self.animator_settings(),
            refresh_interval: self.refresh_interval(),
            overlay_duration: Duration::from_secs(self.display.overlay_duration_secs),
            stale_after: self.stale_after(),
            brightness: self.display.brightness.min(MAX_BRIGHTNESS),
            volume_step: self.display.volume_step,
            start_powered_on: self.server.start_powered_on,
        }
    }

    pub fn server_settings(&self) -> ServerSettings {
        ServerSettings {
            client: self.client_settings(),
            stale_check_interval: Duration::from_secs(self.server.stale_check_interval_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_config_path(tag: &str) -> PathBuf {
        env::temp_dir().join(format!(
            "slimp3-server-test-{}-{}.toml",
            tag,
            std::process::id()
        ))
    }

    #[test]
    fn config_default_values() {
        let config = Config::default();
        assert_eq!(config.server.port, 3483);
        assert_eq!(config.server.stale_after_secs, 60);
        assert_eq!(config.keys.check_interval_ms, 256);
        assert_eq!(config.keys.hold_threshold_ms, 512);
        assert_eq!(config.display.brightness, 3);
        assert_eq!(config.display.scroll_hold_frames, 10);
        assert_eq!(config.screensaver.kind, ScreenSaverKind::Blank);
        assert_eq!(config.screensaver.timeout_secs, 120);
    }

    #[test]
    fn config_durations() {
        let config = Config::default();
        assert_eq!(config.refresh_interval(), Duration::from_millis(250));
        assert_eq!(config.screensaver_timeout(), Duration::from_secs(120));
        assert_eq!(config.stale_after(), Duration::from_secs(60));
    }

    #[test]
    fn key_timing_defaults_to_elapsed_threshold() {
        let timing = Config::default().key_timing();
        assert_eq!(timing, KeyTiming::default());
    }

    #[test]
    fn hold_count_switches_to_count_threshold() {
        let mut config = Config::default();
        config.keys.hold_count = Some(4);
        assert_eq!(config.key_timing().hold, HoldThreshold::Count(4));
    }

    #[test]
    fn config_save_and_load_roundtrip() {
        let path = temp_config_path("roundtrip");

        let mut config = Config::default();
        config.server.port = 4000;
        config.screensaver.kind = ScreenSaverKind::RotateLeft;
        config.display.scroll = ScrollStrategy::Page;

        config.save_to(&path).expect("Failed to save config");
        let loaded = Config::load_from(&path).expect("Failed to load config");
        assert_eq!(loaded, config);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn config_load_missing_file_is_an_error() {
        let path = PathBuf::from("/nonexistent/path/config.toml");
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn config_load_garbage_is_a_parse_error() {
        let path = temp_config_path("garbage");
        fs::write(&path, "[server\nport = ").expect("Failed to write");
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let toml_str = r#"
[screensaver]
kind = "zap"

[keys]
hold_count = 3
"#;
        let config: Config = toml::from_str(toml_str).expect("Failed to deserialize");
        assert_eq!(config.screensaver.kind, ScreenSaverKind::Zap);
        assert_eq!(config.screensaver.timeout_secs, 120);
        assert_eq!(config.keys.hold_count, Some(3));
        assert_eq!(config.keys.check_interval_ms, 256);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn config_serializes_to_toml() {
        let toml_str = toml::to_string_pretty(&Config::default()).expect("Failed to serialize");
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[keys]"));
        assert!(toml_str.contains("[display]"));
        assert!(toml_str.contains("[screensaver]"));
        assert!(toml_str.contains("port = 3483"));
        assert!(toml_str.contains("kind = \"blank\""));
    }

    #[test]
    fn client_settings_follow_config() {
        let mut config = Config::default();
        config.display.brightness = 9;
        config.server.start_powered_on = true;
        config.screensaver.timeout_secs = 5;

        let settings = config.server_settings();
        assert_eq!(settings.client.brightness, 3);
        assert!(settings.client.start_powered_on);
        assert_eq!(
            settings.client.animator.screensaver_timeout,
            Duration::from_secs(5)
        );
        assert_eq!(settings.stale_check_interval, Duration::from_secs(10));
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::NoConfigDir;
        assert_eq!(err.to_string(), "Could not determine config directory");

        let io_err = ConfigError::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        assert!(io_err.to_string().contains("IO error"));
    }
}
