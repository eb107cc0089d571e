//! Storage key registry and storage configuration
//!
//! Every key the storage manager touches comes from [`StorageKey`], so two
//! features can never collide on the same device-store entry by accident.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default namespace prefix for every persisted entry
pub const DEFAULT_PREFIX: &str = "rn_boilerplate_";

/// Default UI language code
pub const DEFAULT_LANGUAGE: &str = "tr";

/// Default theme name
pub const DEFAULT_THEME: &str = "system";

/// Default cache expiration (24 hours)
pub const DEFAULT_CACHE_EXPIRATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Default maximum number of history items
pub const DEFAULT_MAX_HISTORY_ITEMS: usize = 50;

/// Returned when a string does not name a registered key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown storage key: {0}")]
pub struct UnknownKey(pub String);

macro_rules! storage_keys {
    ($($(#[$doc:meta])* $variant:ident => $name:literal,)+) => {
        /// Logical storage keys
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum StorageKey {
            $(
                $(#[$doc])*
                #[serde(rename = $name)]
                $variant,
            )+
        }

        impl StorageKey {
            /// Every registered key
            pub const ALL: &'static [StorageKey] = &[$(StorageKey::$variant,)+];

            /// Logical (un-prefixed) key name
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(StorageKey::$variant => $name,)+
                }
            }
        }

        impl FromStr for StorageKey {
            type Err = UnknownKey;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(StorageKey::$variant),)+
                    other => Err(UnknownKey(other.to_string())),
                }
            }
        }
    };
}

storage_keys! {
    /// Consolidated user profile record
    UserData => "user_data",
    /// Auth token
    UserToken => "user_token",
    /// Remote profile snapshot
    UserProfile => "user_profile",
    /// User settings blob
    UserSettings => "user_settings",
    /// User preferences blob
    UserPreferences => "user_preferences",
    /// Legacy onboarding field
    UserDisplayName => "user_display_name",
    /// Legacy onboarding field
    UserGender => "user_gender",
    /// Legacy onboarding field
    UserAge => "user_age",
    /// Legacy onboarding field
    UserHeight => "user_height",
    /// Legacy onboarding field
    UserWeight => "user_weight",
    /// Legacy onboarding field
    UserExperience => "user_experience",
    /// Legacy onboarding field
    UserExerciseHours => "user_exercise_hours",
    /// Legacy onboarding field
    UserFocusAreas => "user_focus_areas",
    /// Legacy onboarding field
    UserSports => "user_sports",
    /// Legacy onboarding field
    UserEnvironmentPreference => "user_environment_preference",
    /// Legacy onboarding field
    UserAim => "user_aim",
    /// UI language code
    AppLanguage => "app_language",
    /// UI theme
    AppTheme => "app_theme",
    /// First launch marker
    AppFirstLaunch => "app_first_launch",
    /// Installed app version
    AppVersion => "app_version",
    /// Standalone onboarding flag
    OnboardingCompleted => "onboarding_completed",
    /// Push provider user id
    OnesignalUserId => "onesignal_user_id",
    /// Push provider email
    OnesignalEmail => "onesignal_email",
    /// Push provider external id
    OnesignalExternalId => "onesignal_external_id",
    /// Cache write time
    CacheTimestamp => "cache_timestamp",
    /// Cached payload
    CacheData => "cache_data",
    /// Unsaved form drafts
    FormDrafts => "form_drafts",
    /// Search history
    SearchHistory => "search_history",
    /// Pending offline operations
    OfflineQueue => "offline_queue",
    /// Sync status marker
    SyncStatus => "sync_status",
    /// Developer mode flag
    DeveloperModeEnabled => "developer_mode_enabled",
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage manager configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Namespace prefix applied to every key
    pub prefix: String,
    /// Language used when none is stored
    pub default_language: String,
    /// Theme used when none is stored
    pub default_theme: String,
    /// Cache expiration window
    pub cache_expiration: Duration,
    /// Maximum history items
    pub max_history_items: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            default_theme: DEFAULT_THEME.to_string(),
            cache_expiration: DEFAULT_CACHE_EXPIRATION,
            max_history_items: DEFAULT_MAX_HISTORY_ITEMS,
        }
    }
}

impl StorageConfig {
    /// Create a configuration with a custom prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), ..Default::default() }
    }

    /// Set the default language
    pub fn default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into();
        self
    }

    /// Set the default theme
    pub fn default_theme(mut self, theme: impl Into<String>) -> Self {
        self.default_theme = theme.into();
        self
    }

    /// Set the cache expiration window
    pub fn cache_expiration(mut self, expiration: Duration) -> Self {
        self.cache_expiration = expiration;
        self
    }

    /// Set the maximum history items
    pub fn max_history_items(mut self, max: usize) -> Self {
        self.max_history_items = max;
        self
    }
}
