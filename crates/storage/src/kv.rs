//! Sled-backed device store
//!
//! Persistent [`DeviceStore`] implementation for desktop builds and tests
//! that need data to survive a restart.

use crate::device::{DeviceStore, DeviceStoreError, Result};
use async_trait::async_trait;
use sled::{Batch, Db};
use std::sync::Arc;

/// Key-value store configuration
#[derive(Debug, Clone)]
pub struct KvConfig {
    /// Database path
    pub path: String,
    /// Cache capacity in bytes
    pub cache_capacity: u64,
    /// Enable compression
    pub use_compression: bool,
    /// Flush interval in milliseconds (None for immediate flush)
    pub flush_every_ms: Option<u64>,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            path: "device_store.db".to_string(),
            cache_capacity: 16 * 1024 * 1024, // 16MB
            use_compression: true,
            flush_every_ms: Some(500),
        }
    }
}

impl KvConfig {
    /// Create a new configuration with a custom path
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    /// Set cache capacity in bytes
    pub fn cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    /// Enable or disable compression
    pub fn use_compression(mut self, enabled: bool) -> Self {
        self.use_compression = enabled;
        self
    }

    /// Set flush interval in milliseconds
    pub fn flush_every_ms(mut self, ms: Option<u64>) -> Self {
        self.flush_every_ms = ms;
        self
    }
}

impl From<sled::Error> for DeviceStoreError {
    fn from(e: sled::Error) -> Self {
        DeviceStoreError::Backend(format!("sled: {}", e))
    }
}

/// Device store on top of a sled database
#[derive(Clone)]
pub struct SledDeviceStore {
    db: Arc<Db>,
}

impl SledDeviceStore {
    /// Open (or create) the store described by `config`
    pub fn new(config: KvConfig) -> Result<Self> {
        let mut db_config = sled::Config::new()
            .path(&config.path)
            .cache_capacity(config.cache_capacity)
            .use_compression(config.use_compression);

        if let Some(ms) = config.flush_every_ms {
            db_config = db_config.flush_every_ms(Some(ms));
        }

        let db = db_config.open()?;
        tracing::debug!(path = %config.path, "opened sled device store");

        Ok(Self { db: Arc::new(db) })
    }

    /// Create a temporary store (for testing)
    pub fn in_memory() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await?;
        Ok(())
    }

    /// Number of entries, namespaced or not
    pub fn len(&self) -> usize {
        self.db.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    fn decode(key: &str, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec()).map_err(|_| DeviceStoreError::InvalidUtf8(key.to_string()))
    }
}

#[async_trait]
impl DeviceStore for SledDeviceStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.db
            .get(key.as_bytes())?
            .map(|bytes| Self::decode(key, &bytes))
            .transpose()
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.db.insert(key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.db.remove(key.as_bytes())?;
        Ok(())
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<(String, Option<String>)>> {
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            let value = self.get_item(key).await?;
            results.push((key.clone(), value));
        }
        Ok(results)
    }

    async fn multi_set(&self, pairs: &[(String, String)]) -> Result<()> {
        let mut batch = Batch::default();
        for (key, value) in pairs {
            batch.insert(key.as_bytes(), value.as_bytes());
        }
        self.db.apply_batch(batch)?;
        Ok(())
    }

    async fn multi_remove(&self, keys: &[String]) -> Result<()> {
        let mut batch = Batch::default();
        for key in keys {
            batch.remove(key.as_bytes());
        }
        self.db.apply_batch(batch)?;
        Ok(())
    }

    async fn get_all_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for item in self.db.iter().keys() {
            let key = item?;
            // Foreign binary keys are not ours to report
            if let Ok(key_str) = String::from_utf8(key.to_vec()) {
                keys.push(key_str);
            }
        }
        Ok(keys)
    }
}
