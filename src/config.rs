//! Application configuration.
//!
//! The configuration is loaded from `$XDG_CONFIG_HOME/hyprfeed/config.json`.
//! Every section and every field is optional; a minimal `{}` file (or no
//! file at all) yields the compiled-in defaults.
//!
//! # Example
//!
//! ```json
//! {
//!   "hyprland": { "event_socket": "/run/user/1000/hypr/abc/.socket2.sock" },
//!   "audio": {
//!     "enabled": true,
//!     "subscribe_command": ["sh", "-c", "pactl subscribe | grep --line-buffered sink"]
//!   },
//!   "feed": {
//!     "poll_interval_ms": 1000,
//!     "clock_format": "%H:%M",
//!     "battery": true,
//!     "track_command": "playerctl metadata --format '{{artist}} - {{title}}'"
//!   },
//!   "network": { "wifi_interface": "wlan0" },
//!   "brightness": { "device": "intel_backlight" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hyprland: HyprlandConfig,

    /// Audio event stream settings.
    #[serde(default)]
    pub audio: AudioConfig,

    /// Status feed output and polling.
    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub brightness: BrightnessConfig,
}

/// Socket overrides.  Unset paths are resolved from
/// `XDG_RUNTIME_DIR` / `HYPRLAND_INSTANCE_SIGNATURE`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HyprlandConfig {
    pub event_socket: Option<PathBuf>,
    pub command_socket: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Start the audio event bridge.  Default: `true`.
    pub enabled: bool,
    /// argv of the process whose stdout carries audio events.  Default:
    /// `pactl subscribe` filtered to sink events.
    pub subscribe_command: Option<Vec<String>>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            subscribe_command: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Interval for clock, battery and track polling (ms).  Default: `1000`.
    pub poll_interval_ms: u64,
    /// `chrono` strftime format for the clock.
    pub clock_format: String,
    /// Poll `acpi` for battery charge.  Default: `true`.
    pub battery: bool,
    /// Shell command printing the now-playing track, run on every poll.
    /// Default: unset (no track field).
    pub track_command: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            clock_format: "%a %H:%M:%S %Y-%m-%d".into(),
            battery: true,
            track_command: None,
        }
    }
}

impl FeedConfig {
    /// Poll interval, never shorter than 50 ms.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(50))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Station used by `iwctl`.  Default: `wlan0`.
    pub wifi_interface: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wifi_interface: "wlan0".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BrightnessConfig {
    /// `brightnessctl -d` device.  Default: let brightnessctl choose.
    pub device: Option<String>,
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

/// Resolve the config directory (`$XDG_CONFIG_HOME/hyprfeed`).
pub fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("hyprfeed")
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
