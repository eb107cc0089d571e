//! App-wide preferences: UI language and theme
//!
//! Both preferences are plain strings bound to their storage keys. Their
//! defaults come from the storage configuration.

use app_state::{BindingOptions, BindingSnapshot, StorageBinding};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use storage::{StorageKey, StorageManager};
use thiserror::Error;
use tokio::sync::watch;

/// Language codes with bundled translations
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "tr"];

/// Language used when the stored code is not supported
pub const FALLBACK_LANGUAGE: &str = "en";

/// Preference errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreferenceError {
    /// Language code without translations
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Theme name not recognized
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    /// Write to storage failed
    #[error("Failed to save preference {0}")]
    SaveFailed(StorageKey),
}

/// Result type for preference operations
pub type Result<T> = std::result::Result<T, PreferenceError>;

/// UI theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Follow the OS setting
    #[default]
    System,
    /// Light theme
    Light,
    /// Dark theme
    Dark,
}

impl Theme {
    /// Stored name
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::System => "system",
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = PreferenceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "system" => Ok(Theme::System),
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(PreferenceError::UnknownTheme(other.to_string())),
        }
    }
}

/// Whether translations exist for `code`
pub fn is_supported_language(code: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&code)
}

/// Language and theme bindings
pub struct AppPreferences {
    language: StorageBinding,
    theme: StorageBinding,
}

impl AppPreferences {
    /// Bind both preferences; defaults come from the manager's configuration
    pub fn new(manager: StorageManager) -> Self {
        let config = manager.config().clone();
        Self {
            language: StorageBinding::new(
                manager.clone(),
                StorageKey::AppLanguage,
                BindingOptions::new(config.default_language),
            ),
            theme: StorageBinding::new(
                manager,
                StorageKey::AppTheme,
                BindingOptions::new(config.default_theme),
            ),
        }
    }

    /// Load both preferences
    pub async fn open(&self) {
        tokio::join!(self.language.open(), self.theme.open());
    }

    /// Stop observing both preferences
    pub fn close(&self) {
        self.language.close();
        self.theme.close();
    }

    /// Effective language; unsupported codes resolve to [`FALLBACK_LANGUAGE`]
    pub fn language(&self) -> String {
        match self.language.value().as_str() {
            Some(code) if is_supported_language(code) => code.to_string(),
            _ => FALLBACK_LANGUAGE.to_string(),
        }
    }

    /// Store a supported language code
    pub async fn set_language(&self, code: &str) -> Result<()> {
        if !is_supported_language(code) {
            return Err(PreferenceError::UnsupportedLanguage(code.to_string()));
        }
        if self.language.set_value(code).await {
            tracing::info!(language = code, "language changed");
            Ok(())
        } else {
            Err(PreferenceError::SaveFailed(StorageKey::AppLanguage))
        }
    }

    /// Effective theme; unknown names resolve to [`Theme::System`]
    pub fn theme(&self) -> Theme {
        self.theme
            .value()
            .as_str()
            .and_then(|name| name.parse().ok())
            .unwrap_or_default()
    }

    /// Store a theme
    pub async fn set_theme(&self, theme: Theme) -> Result<()> {
        if self.theme.set_value(theme.as_str()).await {
            tracing::info!(%theme, "theme changed");
            Ok(())
        } else {
            Err(PreferenceError::SaveFailed(StorageKey::AppTheme))
        }
    }

    /// Subscribe to language changes
    pub fn subscribe_language(&self) -> watch::Receiver<BindingSnapshot> {
        self.language.subscribe()
    }

    /// Subscribe to theme changes
    pub fn subscribe_theme(&self) -> watch::Receiver<BindingSnapshot> {
        self.theme.subscribe()
    }
}
