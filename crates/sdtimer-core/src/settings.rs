use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Mutable per-user state the daemon persists between sessions, as opposed
/// to the hand-edited TOML in [`crate::config`]. Currently just the last
/// explicitly started duration, so `sdtimerctl start` with no arguments
/// works across daemon restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub last_input_ms: Option<u64>,
}

impl Settings {
    pub fn data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("sdtimer")
    }

    pub fn path() -> PathBuf {
        Self::data_dir().join("settings.json")
    }

    /// Missing or unreadable file yields the defaults; persisted state is
    /// never worth refusing to start over.
    pub fn load() -> Self {
        Self::load_from(&Self::path()).unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| "parsing settings JSON")
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let contents = serde_json::to_string(self).context("serializing settings")?;
        std::fs::write(path, contents)
            .with_context(|| format!("writing settings to {}", path.display()))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
