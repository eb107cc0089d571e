//! Developer storage inspector
//!
//! Lists everything stored under the namespace with human-readable labels and
//! lets developer tooling edit or delete individual entries.

use crate::keys::StorageKey;
use crate::manager::{StorageError, StorageManager};
use crate::value::StorageValue;
use serde::Serialize;
use thiserror::Error;

/// Inspector error types
#[derive(Debug, Error)]
pub enum InspectorError {
    /// Storage fault
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Key is not in the registry
    #[error("Unknown storage key: {0}")]
    UnknownKey(String),

    /// Key is shown but may not be edited
    #[error("Key is read-only: {0}")]
    ReadOnly(StorageKey),
}

/// Result type for inspector operations
pub type Result<T> = std::result::Result<T, InspectorError>;

/// One stored entry as shown to a developer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectorEntry {
    /// Label for display
    pub title: String,
    /// Logical key (prefix stripped)
    pub key: String,
    /// Stored value, parsed when it is JSON
    pub data: StorageValue,
    /// Whether the entry may be edited
    pub editable: bool,
}

/// Display label for a key
pub fn display_name(key: StorageKey) -> &'static str {
    match key {
        StorageKey::UserData => "User Data",
        StorageKey::UserToken => "User Token",
        StorageKey::UserProfile => "User Profile",
        StorageKey::UserSettings => "User Settings",
        StorageKey::UserPreferences => "User Preferences",
        StorageKey::UserDisplayName => "Display Name",
        StorageKey::UserGender => "Gender",
        StorageKey::UserAge => "Age",
        StorageKey::UserHeight => "Height",
        StorageKey::UserWeight => "Weight",
        StorageKey::UserExperience => "Experience Level",
        StorageKey::UserExerciseHours => "Exercise Hours",
        StorageKey::UserFocusAreas => "Focus Areas",
        StorageKey::UserSports => "Sports",
        StorageKey::UserEnvironmentPreference => "Environment Preference",
        StorageKey::UserAim => "Goal",
        StorageKey::AppLanguage => "App Language",
        StorageKey::AppTheme => "App Theme",
        StorageKey::AppFirstLaunch => "First Launch",
        StorageKey::AppVersion => "App Version",
        StorageKey::OnboardingCompleted => "Onboarding Completed",
        StorageKey::OnesignalUserId => "OneSignal User ID",
        StorageKey::OnesignalEmail => "OneSignal Email",
        StorageKey::OnesignalExternalId => "OneSignal External ID",
        StorageKey::CacheTimestamp => "Cache Timestamp",
        StorageKey::CacheData => "Cache Data",
        StorageKey::FormDrafts => "Form Drafts",
        StorageKey::SearchHistory => "Search History",
        StorageKey::OfflineQueue => "Offline Queue",
        StorageKey::SyncStatus => "Sync Status",
        StorageKey::DeveloperModeEnabled => "Developer Mode",
    }
}

/// Whether developer tooling may edit a key
pub fn is_editable(key: StorageKey) -> bool {
    !matches!(
        key,
        StorageKey::CacheTimestamp | StorageKey::AppVersion | StorageKey::AppFirstLaunch
    )
}

/// Pretty-printed JSON for a value
pub fn pretty(value: &StorageValue) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Storage inspector
pub struct StorageInspector {
    manager: StorageManager,
}

impl StorageInspector {
    /// Create an inspector over `manager`
    pub fn new(manager: StorageManager) -> Self {
        Self { manager }
    }

    /// Every namespaced entry, leftovers included
    ///
    /// Unregistered leftovers are listed under their raw name and are never
    /// editable.
    pub async fn entries(&self) -> Result<Vec<InspectorEntry>> {
        let mut entries = Vec::new();

        for raw in self.manager.try_raw_keys().await? {
            let entry = match raw.parse::<StorageKey>() {
                Ok(key) => {
                    let data = self
                        .manager
                        .try_read(key, true)
                        .await?
                        .into_value()
                        .unwrap_or(StorageValue::Null);
                    InspectorEntry {
                        title: display_name(key).to_string(),
                        key: raw,
                        data,
                        editable: is_editable(key),
                    }
                }
                Err(_) => InspectorEntry {
                    title: raw.clone(),
                    key: raw,
                    data: StorageValue::Null,
                    editable: false,
                },
            };
            entries.push(entry);
        }

        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    /// Replace an entry from edited text
    ///
    /// Text that parses as JSON is stored structurally, anything else as a
    /// plain string.
    pub async fn edit(&self, key: &str, text: &str) -> Result<StorageValue> {
        let key = Self::editable_key(key)?;
        let value = serde_json::from_str::<StorageValue>(text)
            .unwrap_or_else(|_| StorageValue::String(text.to_string()));

        self.manager.try_set(key, &value).await?;
        Ok(value)
    }

    /// Delete an entry
    pub async fn delete(&self, key: &str) -> Result<()> {
        let key = key
            .parse::<StorageKey>()
            .map_err(|e| InspectorError::UnknownKey(e.0))?;
        self.manager.try_remove(key).await?;
        Ok(())
    }

    /// Wipe the whole namespace
    pub async fn clear_all(&self) -> Result<usize> {
        Ok(self.manager.try_clear().await?)
    }

    fn editable_key(key: &str) -> Result<StorageKey> {
        let key = key
            .parse::<StorageKey>()
            .map_err(|e| InspectorError::UnknownKey(e.0))?;
        if !is_editable(key) {
            return Err(InspectorError::ReadOnly(key));
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceStore, MemoryDeviceStore};
    use crate::keys::StorageConfig;
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (StorageInspector, StorageManager, Arc<MemoryDeviceStore>) {
        let store = Arc::new(MemoryDeviceStore::new());
        let manager = StorageManager::new(store.clone(), StorageConfig::default());
        (StorageInspector::new(manager.clone()), manager, store)
    }

    #[tokio::test]
    async fn test_entries_label_and_parse() {
        let (inspector, manager, store) = setup();
        manager.set(StorageKey::UserAge, 30).await;
        manager.set(StorageKey::AppVersion, "1.0.0").await;
        store.set_item("rn_boilerplate_old_cache", "zzz").await.unwrap();

        let entries = inspector.entries().await.unwrap();
        assert_eq!(entries.len(), 3);

        let version = &entries[0];
        assert_eq!(version.key, "app_version");
        assert_eq!(version.title, "App Version");
        assert_eq!(version.data, json!("1.0.0"));
        assert!(!version.editable);

        let leftover = &entries[1];
        assert_eq!(leftover.key, "old_cache");
        assert!(!leftover.editable);

        let age = &entries[2];
        assert_eq!(age.title, "Age");
        assert_eq!(age.data, json!(30));
        assert!(age.editable);
    }

    #[tokio::test]
    async fn test_edit_parses_json_or_keeps_text() {
        let (inspector, manager, _) = setup();

        let stored = inspector.edit("user_focus_areas", "[\"core\", \"legs\"]").await.unwrap();
        assert_eq!(stored, json!(["core", "legs"]));
        assert_eq!(
            manager.get(StorageKey::UserFocusAreas, true).await,
            Some(json!(["core", "legs"]))
        );

        let stored = inspector.edit("user_aim", "lose weight").await.unwrap();
        assert_eq!(stored, json!("lose weight"));
        assert_eq!(manager.get(StorageKey::UserAim, false).await, Some(json!("lose weight")));
    }

    #[tokio::test]
    async fn test_edit_rejects_read_only_and_unknown() {
        let (inspector, _, _) = setup();

        let err = inspector.edit("app_version", "2.0.0").await.unwrap_err();
        assert!(matches!(err, InspectorError::ReadOnly(StorageKey::AppVersion)));

        let err = inspector.edit("nope", "1").await.unwrap_err();
        assert!(matches!(err, InspectorError::UnknownKey(ref k) if k == "nope"));
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let (inspector, manager, store) = setup();
        manager.set(StorageKey::UserAim, "run").await;
        manager.set(StorageKey::UserSports, "swim").await;
        store.set_item("unrelated", "1").await.unwrap();

        inspector.delete("user_aim").await.unwrap();
        assert!(!manager.is_key_exists(StorageKey::UserAim).await);

        assert_eq!(inspector.clear_all().await.unwrap(), 1);
        assert!(inspector.entries().await.unwrap().is_empty());
        assert!(store.get_item("unrelated").await.unwrap().is_some());
    }

    #[test]
    fn test_pretty() {
        assert_eq!(pretty(&json!({"a": 1})), "{\n  \"a\": 1\n}");
    }
}
