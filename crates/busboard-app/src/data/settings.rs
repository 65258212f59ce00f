//! Application settings management
//!
//! User preferences that survive restarts.

use crate::config::app::SETTINGS_FILE;
use crate::data::storage;
use crate::error::{AppError, Result};
use busboard::config::poll;
use busboard::i18n::Language;
use busboard::transit::Route;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Settings file format version for migrations
const SETTINGS_VERSION: u32 = 1;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// File format version
    #[serde(default = "default_version")]
    pub version: u32,

    /// Display language for names and labels
    #[serde(default)]
    pub language: Language,

    /// Theme preference
    #[serde(default)]
    pub theme: Theme,

    /// Seconds between ETA polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Alternate API base URL (mirrors, testing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,

    /// Last watched route (for resume)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_route: Option<Route>,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_poll_interval() -> u64 {
    poll::DEFAULT_INTERVAL_SECS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            language: Language::default(),
            theme: Theme::default(),
            poll_interval_secs: default_poll_interval(),
            api_base_url: None,
            last_route: None,
        }
    }
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from default storage location
    pub fn load() -> Result<Self> {
        let settings = storage::load::<Settings>(SETTINGS_FILE)?.unwrap_or_default();
        Ok(settings.normalized())
    }

    /// Load settings from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = storage::load_from::<Settings>(path)?.unwrap_or_default();
        Ok(settings.normalized())
    }

    /// Save settings to default storage location
    pub fn save(&self) -> Result<()> {
        storage::save(SETTINGS_FILE, self)
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        storage::save_to(path, self)
    }

    /// Set poll interval (clamped to the allowed range)
    pub fn set_poll_interval(&mut self, secs: u64) {
        self.poll_interval_secs = poll::clamp_interval(secs);
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(poll::clamp_interval(self.poll_interval_secs))
    }

    /// Switch between English and Chinese, returning the new language
    pub fn toggle_language(&mut self) -> Language {
        self.language = self.language.toggle();
        self.language
    }

    fn normalized(mut self) -> Self {
        self.poll_interval_secs = poll::clamp_interval(self.poll_interval_secs);
        self
    }
}

/// Theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Follow terminal colors
    #[default]
    System,
    Light,
    Dark,
}

impl Theme {
    /// Check if this theme prefers dark mode
    pub fn is_dark(&self) -> bool {
        matches!(self, Theme::Dark)
    }

    /// Next theme in the order system, light, dark
    pub fn cycle(self) -> Self {
        match self {
            Theme::System => Theme::Light,
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::System,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::System => "system",
            Theme::Light => "light",
            Theme::Dark => "dark",
        })
    }
}

impl FromStr for Theme {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" | "auto" => Ok(Theme::System),
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(AppError::Config(format!("Unknown theme '{other}'"))),
        }
    }
}
