//! Test helpers: a device store that can fail or stall on demand

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use storage::device::{DeviceStore, DeviceStoreError, MemoryDeviceStore, Result};
use storage::{StorageConfig, StorageManager};
use tokio::sync::{Notify, Semaphore};

/// Memory store with switchable faults and a read gate
pub struct TestStore {
    inner: MemoryDeviceStore,
    fail: AtomicBool,
    gated: AtomicBool,
    stall_after_fetch: AtomicBool,
    gate: Semaphore,
    stalled: Notify,
}

impl TestStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryDeviceStore::new(),
            fail: AtomicBool::new(false),
            gated: AtomicBool::new(false),
            stall_after_fetch: AtomicBool::new(false),
            gate: Semaphore::new(0),
            stalled: Notify::new(),
        })
    }

    /// Make every operation fail until reset
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Hold reads until [`TestStore::release`] is called
    pub fn hold_reads(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    /// Let single reads fetch their value, then hold them until
    /// [`TestStore::resume_reads`]
    pub fn hold_reads_after_fetch(&self) {
        self.stall_after_fetch.store(true, Ordering::SeqCst);
        self.gated.store(true, Ordering::SeqCst);
    }

    /// Wait until a read is parked at the gate
    pub async fn wait_stalled(&self) {
        self.stalled.notified().await;
    }

    /// Let one held read through
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    /// Stop holding reads and let the parked one through
    pub fn resume_reads(&self) {
        self.gated.store(false, Ordering::SeqCst);
        self.stall_after_fetch.store(false, Ordering::SeqCst);
        self.gate.add_permits(1);
    }

    pub fn inner(&self) -> &MemoryDeviceStore {
        &self.inner
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeviceStoreError::Backend("simulated fault".to_string()));
        }
        Ok(())
    }

    async fn wait_gate(&self) {
        if self.gated.load(Ordering::SeqCst) {
            self.stalled.notify_one();
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }
    }
}

#[async_trait]
impl DeviceStore for TestStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        if self.stall_after_fetch.load(Ordering::SeqCst) {
            self.check()?;
            let value = self.inner.get_item(key).await;
            self.wait_gate().await;
            return value;
        }
        self.wait_gate().await;
        self.check()?;
        self.inner.get_item(key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.check()?;
        self.inner.set_item(key, value).await
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.check()?;
        self.inner.remove_item(key).await
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<(String, Option<String>)>> {
        self.wait_gate().await;
        self.check()?;
        self.inner.multi_get(keys).await
    }

    async fn multi_set(&self, pairs: &[(String, String)]) -> Result<()> {
        self.check()?;
        self.inner.multi_set(pairs).await
    }

    async fn multi_remove(&self, keys: &[String]) -> Result<()> {
        self.check()?;
        self.inner.multi_remove(keys).await
    }

    async fn get_all_keys(&self) -> Result<Vec<String>> {
        self.check()?;
        self.inner.get_all_keys().await
    }
}

/// Manager over a fresh [`TestStore`]
pub fn test_manager() -> (StorageManager, Arc<TestStore>) {
    let store = TestStore::new();
    let manager = StorageManager::new(store.clone(), StorageConfig::default());
    (manager, store)
}
