use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Persistent per-user session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Name this participant announces itself under
    pub participant_name: String,
    /// Construct the widget muted, for autoplay-restricted embedders
    pub start_muted: bool,
    /// Push authoritative state to newcomers that signal ready
    pub push_state_on_join: bool,
    /// Capacity of the native-signal channel feeding the session task
    pub signal_buffer: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            participant_name: "viewer".to_string(),
            start_muted: true,
            push_state_on_join: true,
            signal_buffer: 64,
        }
    }
}

impl SyncSettings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lockstep").join("settings.json"))
    }

    /// Load settings from the user's config directory, falling back to
    /// defaults when the file is missing or unreadable
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                if let Ok(contents) = fs::read_to_string(&path) {
                    if let Ok(settings) = serde_json::from_str(&contents) {
                        return settings;
                    }
                }
            }
        }
        Self::default()
    }

    /// Persist settings to the user's config directory
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().context("No config directory available")?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(&path, contents).context("Failed to write settings file")?;
        Ok(())
    }
}
