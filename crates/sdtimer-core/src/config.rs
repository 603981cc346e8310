use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Countdown polling period. Display granularity is up to the client;
    /// the engine corrects for scheduler drift either way.
    #[serde(default = "GeneralConfig::default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Issue an OS shutdown once the countdown expires.
    #[serde(default = "GeneralConfig::default_shutdown")]
    pub shutdown: bool,
    /// Delay between the alarm and the actual shutdown command, during
    /// which `sdtimerctl cancel` can still abort it.
    #[serde(default = "GeneralConfig::default_grace_period")]
    pub grace_period_ms: u64,
}

impl GeneralConfig {
    fn default_tick_interval() -> u64 { 100 }
    fn default_shutdown() -> bool { true }
    fn default_grace_period() -> u64 { 20_000 }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            shutdown: true,
            grace_period_ms: 20_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Pause media playback on alarm and resume it when a pending
    /// shutdown is cancelled.
    #[serde(default = "MediaConfig::default_control")]
    pub control: bool,
}

impl MediaConfig {
    fn default_control() -> bool { true }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self { control: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "NotificationConfig::default_enabled")]
    pub enabled: bool,
}

impl NotificationConfig {
    fn default_enabled() -> bool { true }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("sdtimer")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&contents).with_context(|| "parsing config TOML")
    }
}

pub fn socket_path() -> PathBuf {
    // SDTIMER_SOCK env var overrides for testing.
    // Default: $XDG_RUNTIME_DIR/sdtimer.sock, falling back to the temp dir
    // when no runtime dir exists (e.g. headless CI).
    if let Ok(path) = std::env::var("SDTIMER_SOCK") {
        return PathBuf::from(path);
    }
    dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("sdtimer.sock")
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- spec: defaults ---

    #[test]
    fn default_tick_interval_is_100ms() {
        let config = Config::default();
        assert_eq!(config.general.tick_interval_ms, 100);
    }

    #[test]
    fn default_shutdown_is_enabled() {
        let config = Config::default();
        assert!(config.general.shutdown);
    }

    #[test]
    fn default_grace_period_is_20s() {
        let config = Config::default();
        assert_eq!(config.general.grace_period_ms, 20_000);
    }

    #[test]
    fn default_media_control_is_enabled() {
        let config = Config::default();
        assert!(config.media.control);
    }

    #[test]
    fn default_notifications_are_enabled() {
        let config = Config::default();
        assert!(config.notification.enabled);
    }

    // --- spec: TOML parsing ---

    #[test]
    fn parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        // All defaults should apply
        assert_eq!(config.general.tick_interval_ms, 100);
        assert!(config.general.shutdown);
        assert!(config.media.control);
    }

    #[test]
    fn parse_custom_tick_interval() {
        let toml = r#"
[general]
tick_interval_ms = 1
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.general.tick_interval_ms, 1);
        // Other fields should still be defaults
        assert!(config.general.shutdown);
        assert_eq!(config.general.grace_period_ms, 20_000);
    }

    #[test]
    fn parse_shutdown_disabled() {
        let toml = r#"
[general]
shutdown = false
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.general.shutdown);
    }

    #[test]
    fn parse_media_control_disabled() {
        let toml = r#"
[media]
control = false
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.media.control);
    }

    #[test]
    fn load_from_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_from(&dir.path().join("nope.toml"));
        assert!(result.is_err());
    }

    // --- spec: socket path ---

    #[test]
    fn socket_path_ends_with_sdtimer_sock() {
        let path = socket_path();
        assert_eq!(path.file_name().unwrap(), "sdtimer.sock");
    }
}
