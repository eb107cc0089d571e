//! Device key-value store port
//!
//! The asynchronous, string-valued store the storage manager sits on. A
//! platform binding implements [`DeviceStore`]; [`MemoryDeviceStore`] is the
//! in-process implementation used by tests and ephemeral sessions.

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Device store error types
#[derive(Debug, Error)]
pub enum DeviceStoreError {
    /// Stored bytes are not valid UTF-8
    #[error("Invalid UTF-8 under key {0}")]
    InvalidUtf8(String),

    /// Backend rejected or failed the operation
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for device store operations
pub type Result<T> = std::result::Result<T, DeviceStoreError>;

/// Asynchronous string key-value store provided by the device
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Read one entry
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write one entry
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Delete one entry (no-op when absent)
    async fn remove_item(&self, key: &str) -> Result<()>;

    /// Read many entries, preserving request order
    async fn multi_get(&self, keys: &[String]) -> Result<Vec<(String, Option<String>)>>;

    /// Write many entries
    async fn multi_set(&self, pairs: &[(String, String)]) -> Result<()>;

    /// Delete many entries
    async fn multi_remove(&self, keys: &[String]) -> Result<()>;

    /// Every key currently stored, namespaced or not
    async fn get_all_keys(&self) -> Result<Vec<String>>;
}

/// In-memory device store
#[derive(Debug, Default)]
pub struct MemoryDeviceStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryDeviceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, namespaced or not
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl DeviceStore for MemoryDeviceStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<(String, Option<String>)>> {
        let entries = self.entries.read().await;
        Ok(keys
            .iter()
            .map(|key| (key.clone(), entries.get(key).cloned()))
            .collect())
    }

    async fn multi_set(&self, pairs: &[(String, String)]) -> Result<()> {
        let mut entries = self.entries.write().await;
        for (key, value) in pairs {
            entries.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn multi_remove(&self, keys: &[String]) -> Result<()> {
        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn get_all_keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }
}
