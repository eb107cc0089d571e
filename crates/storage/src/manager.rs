//! Namespaced storage manager
//!
//! [`StorageManager`] is the single entry point to the device store. It
//! prefixes every key, encodes values, and offers batch and enumeration
//! operations scoped to its namespace.
//!
//! The plain operations (`get`, `set`, `remove`, ...) never fail: faults are
//! logged and reported as `None`/`false`/empty. The `try_*` variants return
//! the underlying [`StorageError`] for callers that need to surface it.

use crate::device::{DeviceStore, DeviceStoreError};
use crate::keys::{StorageConfig, StorageKey};
use crate::value::{encode_value, Encoding, ReadOutcome, StorageValue};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Storage manager error types
#[derive(Debug, Error)]
pub enum StorageError {
    /// Device store fault
    #[error("Device store error: {0}")]
    Device(#[from] DeviceStoreError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage manager operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Namespaced accessor over a [`DeviceStore`]
#[derive(Clone)]
pub struct StorageManager {
    store: Arc<dyn DeviceStore>,
    config: Arc<StorageConfig>,
}

impl StorageManager {
    /// Create a manager over `store`
    pub fn new(store: Arc<dyn DeviceStore>, config: StorageConfig) -> Self {
        Self { store, config: Arc::new(config) }
    }

    /// Manager over a fresh in-memory store with default configuration
    pub fn in_memory() -> Self {
        Self::new(Arc::new(crate::device::MemoryDeviceStore::new()), StorageConfig::default())
    }

    /// Configuration this manager was built with
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Namespace prefix
    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }

    /// Device-store key for a logical key
    pub fn namespaced(&self, key: StorageKey) -> String {
        format!("{}{}", self.config.prefix, key.as_str())
    }

    fn strip<'a>(&self, raw: &'a str) -> Option<&'a str> {
        raw.strip_prefix(self.config.prefix.as_str())
    }

    // ------------------------------------------------------------------
    // Fallible operations
    // ------------------------------------------------------------------

    /// Read a key, reporting device faults
    pub async fn try_read(&self, key: StorageKey, parse_json: bool) -> Result<ReadOutcome> {
        let raw = self.store.get_item(&self.namespaced(key)).await?;
        Ok(ReadOutcome::from_stored(raw, parse_json))
    }

    /// Write a value with the given encoding; `Null` removes the key
    pub async fn try_set_encoded(
        &self,
        key: StorageKey,
        value: &StorageValue,
        encoding: Encoding,
    ) -> Result<()> {
        let prefixed = self.namespaced(key);
        match encode_value(value, encoding) {
            Some(encoded) => self.store.set_item(&prefixed, &encoded).await?,
            None => self.store.remove_item(&prefixed).await?,
        }
        tracing::debug!(%key, "storage write");
        Ok(())
    }

    /// Write a value with plain encoding; `Null` removes the key
    pub async fn try_set(&self, key: StorageKey, value: &StorageValue) -> Result<()> {
        self.try_set_encoded(key, value, Encoding::Plain).await
    }

    /// Remove a key
    pub async fn try_remove(&self, key: StorageKey) -> Result<()> {
        self.store.remove_item(&self.namespaced(key)).await?;
        Ok(())
    }

    /// Read several keys; absent keys are omitted from the result
    pub async fn try_multi_get(
        &self,
        keys: &[StorageKey],
        parse_json: bool,
    ) -> Result<BTreeMap<StorageKey, StorageValue>> {
        let prefixed: Vec<String> = keys.iter().map(|k| self.namespaced(*k)).collect();
        let values = self.store.multi_get(&prefixed).await?;

        let mut result = BTreeMap::new();
        for (raw_key, raw_value) in values {
            let Some(key) = self.strip(&raw_key).and_then(|k| k.parse::<StorageKey>().ok()) else {
                continue;
            };
            if let Some(value) = ReadOutcome::from_stored(raw_value, parse_json).into_value() {
                result.insert(key, value);
            }
        }
        Ok(result)
    }

    /// Write several keys with the given encoding; `Null` entries are skipped
    pub async fn try_multi_set_encoded<I>(&self, entries: I, encoding: Encoding) -> Result<()>
    where
        I: IntoIterator<Item = (StorageKey, StorageValue)>,
    {
        let pairs: Vec<(String, String)> = entries
            .into_iter()
            .filter_map(|(key, value)| {
                encode_value(&value, encoding).map(|encoded| (self.namespaced(key), encoded))
            })
            .collect();

        if !pairs.is_empty() {
            self.store.multi_set(&pairs).await?;
        }
        Ok(())
    }

    /// Write several keys with plain encoding; `Null` entries are skipped
    pub async fn try_multi_set<I>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (StorageKey, StorageValue)>,
    {
        self.try_multi_set_encoded(entries, Encoding::Plain).await
    }

    /// Remove every entry under the namespace prefix
    pub async fn try_clear(&self) -> Result<usize> {
        let prefixed: Vec<String> = self
            .store
            .get_all_keys()
            .await?
            .into_iter()
            .filter(|k| k.starts_with(self.config.prefix.as_str()))
            .collect();

        let count = prefixed.len();
        if count > 0 {
            self.store.multi_remove(&prefixed).await?;
        }
        Ok(count)
    }

    /// Every key under the namespace, prefix stripped, registered or not
    pub async fn try_raw_keys(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .get_all_keys()
            .await?
            .iter()
            .filter_map(|k| self.strip(k).map(str::to_string))
            .collect())
    }

    // ------------------------------------------------------------------
    // Fail-safe operations
    // ------------------------------------------------------------------

    /// Typed read; faults collapse to [`ReadOutcome::Absent`]
    pub async fn read(&self, key: StorageKey, parse_json: bool) -> ReadOutcome {
        self.try_read(key, parse_json).await.unwrap_or_else(|e| {
            tracing::error!(%key, error = %e, "storage get failed");
            ReadOutcome::Absent
        })
    }

    /// Read a key
    ///
    /// With `parse_json`, a stored string that is not JSON is returned as a
    /// string value.
    pub async fn get(&self, key: StorageKey, parse_json: bool) -> Option<StorageValue> {
        self.read(key, parse_json).await.into_value()
    }

    /// Read and decode a JSON value
    pub async fn get_as<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        match self.read(key, true).await.decode::<T>()? {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%key, error = %e, "stored value has unexpected shape");
                None
            }
        }
    }

    /// Write a value; `Null` removes the key
    pub async fn set(&self, key: StorageKey, value: impl Into<StorageValue>) -> bool {
        let value = value.into();
        match self.try_set(key, &value).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(%key, error = %e, "storage set failed");
                false
            }
        }
    }

    /// Remove a key (repeat removals succeed)
    pub async fn remove(&self, key: StorageKey) -> bool {
        match self.try_remove(key).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(%key, error = %e, "storage remove failed");
                false
            }
        }
    }

    /// Read several keys; absent keys are omitted
    pub async fn multi_get(
        &self,
        keys: &[StorageKey],
        parse_json: bool,
    ) -> BTreeMap<StorageKey, StorageValue> {
        self.try_multi_get(keys, parse_json)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "storage multi_get failed");
                BTreeMap::new()
            })
    }

    /// Write several keys; `Null` entries are skipped, not deleted
    pub async fn multi_set<I>(&self, entries: I) -> bool
    where
        I: IntoIterator<Item = (StorageKey, StorageValue)>,
    {
        match self.try_multi_set(entries).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "storage multi_set failed");
                false
            }
        }
    }

    /// Remove every namespaced entry; foreign keys are left alone
    pub async fn clear(&self) -> bool {
        match self.try_clear().await {
            Ok(count) => {
                tracing::info!(removed = count, "storage namespace cleared");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "storage clear failed");
                false
            }
        }
    }

    /// Registered keys currently stored under the namespace
    pub async fn get_all_keys(&self) -> Vec<StorageKey> {
        self.raw_keys()
            .await
            .into_iter()
            .filter_map(|raw| match raw.parse::<StorageKey>() {
                Ok(key) => Some(key),
                Err(_) => {
                    tracing::debug!(key = %raw, "skipping unregistered namespaced key");
                    None
                }
            })
            .collect()
    }

    /// Every key under the namespace, including unregistered leftovers
    pub async fn raw_keys(&self) -> Vec<String> {
        self.try_raw_keys().await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "storage key enumeration failed");
            Vec::new()
        })
    }

    /// Total encoded length of stored values
    ///
    /// Re-reads every namespaced key, unregistered leftovers included;
    /// meant for diagnostics only.
    pub async fn get_size(&self) -> usize {
        let mut total = 0;
        for raw in self.raw_keys().await {
            let device_key = format!("{}{}", self.config.prefix, raw);
            match self.store.get_item(&device_key).await {
                Ok(Some(value)) if !value.is_empty() => {
                    total += StorageValue::String(value).to_string().len();
                }
                Ok(_) => {}
                Err(e) => tracing::error!(key = %raw, error = %e, "storage size read failed"),
            }
        }
        total
    }

    /// Check whether a key is stored
    pub async fn is_key_exists(&self, key: StorageKey) -> bool {
        match self.store.get_item(&self.namespaced(key)).await {
            Ok(value) => value.is_some(),
            Err(e) => {
                tracing::error!(%key, error = %e, "storage exists check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{MemoryDeviceStore, MockDeviceStore};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    fn manager_with_store() -> (StorageManager, Arc<MemoryDeviceStore>) {
        let store = Arc::new(MemoryDeviceStore::new());
        let manager = StorageManager::new(store.clone(), StorageConfig::default());
        (manager, store)
    }

    fn failing_manager() -> StorageManager {
        let mut mock = MockDeviceStore::new();
        mock.expect_get_item()
            .returning(|_| Err(DeviceStoreError::Backend("disk unavailable".to_string())));
        mock.expect_set_item()
            .returning(|_, _| Err(DeviceStoreError::Backend("disk unavailable".to_string())));
        mock.expect_remove_item()
            .returning(|_| Err(DeviceStoreError::Backend("disk unavailable".to_string())));
        mock.expect_multi_get()
            .returning(|_| Err(DeviceStoreError::Backend("disk unavailable".to_string())));
        mock.expect_multi_set()
            .returning(|_| Err(DeviceStoreError::Backend("disk unavailable".to_string())));
        mock.expect_get_all_keys()
            .returning(|| Err(DeviceStoreError::Backend("disk unavailable".to_string())));
        StorageManager::new(Arc::new(mock), StorageConfig::default())
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Draft {
        title: String,
        words: u32,
    }

    #[tokio::test]
    async fn test_set_and_get_string() {
        let (manager, store) = manager_with_store();

        assert!(manager.set(StorageKey::AppLanguage, "en").await);
        assert_eq!(manager.get(StorageKey::AppLanguage, false).await, Some(json!("en")));

        // Written under the namespaced key, verbatim
        assert_eq!(
            store.get_item("rn_boilerplate_app_language").await.unwrap(),
            Some("en".to_string())
        );
    }

    #[tokio::test]
    async fn test_primitives_are_stored_as_text() {
        let (manager, store) = manager_with_store();

        manager.set(StorageKey::UserAge, 30).await;
        manager.set(StorageKey::DeveloperModeEnabled, true).await;

        assert_eq!(
            store.get_item("rn_boilerplate_user_age").await.unwrap(),
            Some("30".to_string())
        );
        assert_eq!(manager.get(StorageKey::UserAge, false).await, Some(json!("30")));
        assert_eq!(manager.get(StorageKey::UserAge, true).await, Some(json!(30)));
        assert_eq!(manager.get(StorageKey::DeveloperModeEnabled, true).await, Some(json!(true)));
    }

    #[tokio::test]
    async fn test_structured_round_trip() {
        let (manager, _) = manager_with_store();
        let draft = Draft { title: "Morning run".to_string(), words: 12 };

        assert!(manager.set(StorageKey::FormDrafts, serde_json::to_value(&draft).unwrap()).await);

        let value = manager.get(StorageKey::FormDrafts, true).await.unwrap();
        assert_eq!(value, json!({"title": "Morning run", "words": 12}));

        let decoded: Option<Draft> = manager.get_as(StorageKey::FormDrafts).await;
        assert_eq!(decoded, Some(draft));
    }

    #[tokio::test]
    async fn test_parse_failure_falls_back_to_raw_string() {
        let (manager, _) = manager_with_store();
        manager.set(StorageKey::UserToken, "abc.def").await;

        assert_eq!(manager.get(StorageKey::UserToken, true).await, Some(json!("abc.def")));
        assert_eq!(
            manager.read(StorageKey::UserToken, true).await,
            ReadOutcome::RawFallback("abc.def".to_string())
        );
    }

    #[tokio::test]
    async fn test_get_as_wrong_shape_is_none() {
        let (manager, _) = manager_with_store();
        manager.set(StorageKey::FormDrafts, json!([1, 2, 3])).await;

        let decoded: Option<Draft> = manager.get_as(StorageKey::FormDrafts).await;
        assert_eq!(decoded, None);
    }

    #[tokio::test]
    async fn test_set_null_removes() {
        let (manager, _) = manager_with_store();
        manager.set(StorageKey::UserAim, "strength").await;
        assert!(manager.is_key_exists(StorageKey::UserAim).await);

        assert!(manager.set(StorageKey::UserAim, StorageValue::Null).await);
        assert_eq!(manager.get(StorageKey::UserAim, false).await, None);
        assert!(!manager.is_key_exists(StorageKey::UserAim).await);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let (manager, store) = manager_with_store();
        manager.set(StorageKey::UserSports, "tennis").await;
        manager.set(StorageKey::UserAim, "endurance").await;

        assert!(manager.remove(StorageKey::UserSports).await);
        let after_first = store.get_all_keys().await.unwrap();

        assert!(manager.remove(StorageKey::UserSports).await);
        assert_eq!(store.get_all_keys().await.unwrap(), after_first);
    }

    #[tokio::test]
    async fn test_get_all_keys_after_remove() {
        let (manager, _) = manager_with_store();
        manager.set(StorageKey::AppLanguage, 1).await;
        manager.set(StorageKey::AppTheme, 2).await;
        manager.remove(StorageKey::AppLanguage).await;

        assert_eq!(manager.get_all_keys().await, vec![StorageKey::AppTheme]);
    }

    #[tokio::test]
    async fn test_clear_spares_foreign_keys() {
        let (manager, store) = manager_with_store();
        store.set_item("other_sdk_session", "keep me").await.unwrap();

        for (i, key) in StorageKey::ALL.iter().take(6).enumerate() {
            manager.set(*key, i as u64).await;
        }
        // Leftover from an older build, not in the registry
        store
            .set_item("rn_boilerplate_legacy_blob", "{}")
            .await
            .unwrap();

        assert!(manager.clear().await);
        assert!(manager.get_all_keys().await.is_empty());
        assert!(manager.raw_keys().await.is_empty());
        assert_eq!(
            store.get_item("other_sdk_session").await.unwrap(),
            Some("keep me".to_string())
        );
    }

    #[tokio::test]
    async fn test_unregistered_keys_are_hidden_from_get_all_keys() {
        let (manager, store) = manager_with_store();
        manager.set(StorageKey::AppVersion, "1.2.0").await;
        store.set_item("rn_boilerplate_legacy_blob", "{}").await.unwrap();
        store.set_item("foreign", "x").await.unwrap();

        assert_eq!(manager.get_all_keys().await, vec![StorageKey::AppVersion]);

        let mut raw = manager.raw_keys().await;
        raw.sort();
        assert_eq!(raw, vec!["app_version".to_string(), "legacy_blob".to_string()]);
    }

    #[tokio::test]
    async fn test_multi_get_omits_absent_keys() {
        let (manager, _) = manager_with_store();
        manager.set(StorageKey::UserAge, 41).await;

        let values = manager
            .multi_get(&[StorageKey::UserDisplayName, StorageKey::UserAge, StorageKey::UserGender], true)
            .await;

        assert_eq!(values.len(), 1);
        assert_eq!(values.get(&StorageKey::UserAge), Some(&json!(41)));
        assert!(!values.contains_key(&StorageKey::UserDisplayName));
        assert!(!values.contains_key(&StorageKey::UserGender));
    }

    #[tokio::test]
    async fn test_multi_set_skips_null() {
        let (manager, _) = manager_with_store();
        manager.set(StorageKey::AppTheme, "dark").await;

        let ok = manager
            .multi_set([
                (StorageKey::AppLanguage, json!("en")),
                (StorageKey::AppTheme, StorageValue::Null),
                (StorageKey::SearchHistory, json!(["squat", "deadlift"])),
            ])
            .await;
        assert!(ok);

        // Null did not delete
        assert_eq!(manager.get(StorageKey::AppTheme, false).await, Some(json!("dark")));
        assert_eq!(
            manager.get(StorageKey::SearchHistory, true).await,
            Some(json!(["squat", "deadlift"]))
        );
    }

    #[tokio::test]
    async fn test_multi_set_empty_batch() {
        let (manager, store) = manager_with_store();
        assert!(manager.multi_set([(StorageKey::AppTheme, StorageValue::Null)]).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_get_size() {
        let (manager, _) = manager_with_store();
        assert_eq!(manager.get_size().await, 0);

        manager.set(StorageKey::AppLanguage, "en").await;
        manager.set(StorageKey::UserAge, 30).await;
        manager.set(StorageKey::UserAim, "").await;

        // "\"en\"" + "\"30\"", the empty string is not counted
        assert_eq!(manager.get_size().await, 8);
    }

    #[tokio::test]
    async fn test_get_size_counts_unregistered_leftovers() {
        let (manager, store) = manager_with_store();
        manager.set(StorageKey::AppLanguage, "en").await;
        store.set_item("rn_boilerplate_legacy_blob", "abc").await.unwrap();
        store.set_item("foreign_blob", "ignored").await.unwrap();

        // "\"en\"" + "\"abc\""
        assert_eq!(manager.get_size().await, 9);
        assert_eq!(manager.get_all_keys().await, vec![StorageKey::AppLanguage]);
    }

    #[tokio::test]
    async fn test_custom_prefix_isolates_namespaces() {
        let store = Arc::new(MemoryDeviceStore::new());
        let a = StorageManager::new(store.clone(), StorageConfig::new("a_"));
        let b = StorageManager::new(store.clone(), StorageConfig::new("b_"));

        a.set(StorageKey::AppTheme, "dark").await;
        b.set(StorageKey::AppTheme, "light").await;
        a.clear().await;

        assert_eq!(a.get(StorageKey::AppTheme, false).await, None);
        assert_eq!(b.get(StorageKey::AppTheme, false).await, Some(json!("light")));
    }

    #[tokio::test]
    async fn test_faults_are_contained() {
        let manager = failing_manager();

        assert_eq!(manager.get(StorageKey::UserData, true).await, None);
        assert_eq!(manager.read(StorageKey::UserData, true).await, ReadOutcome::Absent);
        assert!(!manager.set(StorageKey::UserData, json!({"a": 1})).await);
        assert!(!manager.remove(StorageKey::UserData).await);
        assert!(manager.multi_get(&[StorageKey::UserData], false).await.is_empty());
        assert!(!manager.multi_set([(StorageKey::UserAge, json!(3))]).await);
        assert!(!manager.clear().await);
        assert!(manager.get_all_keys().await.is_empty());
        assert_eq!(manager.get_size().await, 0);
        assert!(!manager.is_key_exists(StorageKey::UserData).await);
    }

    #[tokio::test]
    async fn test_try_variants_report_faults() {
        let manager = failing_manager();

        let err = manager.try_read(StorageKey::UserData, false).await.unwrap_err();
        assert!(matches!(err, StorageError::Device(DeviceStoreError::Backend(_))));
        assert!(err.to_string().contains("disk unavailable"));
    }

    #[tokio::test]
    async fn test_mock_sees_namespaced_key() {
        let mut mock = MockDeviceStore::new();
        mock.expect_get_item()
            .withf(|key: &str| key == "rn_boilerplate_user_token")
            .times(1)
            .returning(|_| Ok(Some("token".to_string())));
        let manager = StorageManager::new(Arc::new(mock), StorageConfig::default());

        assert_eq!(manager.get(StorageKey::UserToken, false).await, Some(json!("token")));
    }
}
