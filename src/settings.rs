use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, fs, path::Path};

/// Environment fallback when no key is stored.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// User preferences consulted at the start of every tick.
pub trait Preferences: Send + Sync {
    /// Credential for the semantic classifier, if one is configured.
    fn api_key(&self) -> Option<String>;

    fn debug_panel_open(&self) -> bool;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct UserSettings {
    api_key: Option<String>,
    debug_panel_open: bool,
}

/// Preferences read once from a JSON file at startup.
#[derive(Debug)]
pub struct SettingsStore {
    data: UserSettings,
}

impl SettingsStore {
    pub fn new(path: &Path) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("Ignoring malformed settings at {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self { data })
    }
}

impl Preferences for SettingsStore {
    fn api_key(&self) -> Option<String> {
        self.data
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| env::var(API_KEY_ENV).ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    fn debug_panel_open(&self) -> bool {
        self.data.debug_panel_open
    }
}
