//! User profile aggregate
//!
//! [`UserDataStore`] owns the in-memory copy of the [`UserData`] record and is
//! the only writer of the `user_data` key within its instance. Updates are
//! read-merge-write: the whole record is written back on every change.
//!
//! Updates issued through one store are serialized, so they never lose each
//! other's fields. Two independent stores over the same key are not
//! coordinated; whichever writes last wins at whole-record granularity.

use crate::profile::{UserData, UserUpdate};
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use storage::{ReadOutcome, StorageKey, StorageManager};
use thiserror::Error;
use tokio::sync::{watch, Mutex};

/// User data errors surfaced through the snapshot
#[derive(Debug, Error)]
pub enum UserDataError {
    /// Storage fault
    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    /// Stored record does not match the expected shape
    #[error("Stored user data is corrupt: {0}")]
    Corrupt(String),

    /// Persisting the record failed
    #[error("User data could not be saved")]
    SaveFailed,

    /// Removing the record failed
    #[error("User data could not be cleared")]
    ClearFailed,
}

/// Observable state of the user data store
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserDataSnapshot {
    /// In-memory copy of the record
    pub user_data: Option<UserData>,
    /// Whether a reload is in flight
    pub loading: bool,
    /// Message of the last failure
    pub error: Option<String>,
}

/// User profile aggregate over the `user_data` key
pub struct UserDataStore {
    manager: StorageManager,
    state: RwLock<UserDataSnapshot>,
    tx: watch::Sender<UserDataSnapshot>,
    /// Merge base; kept current even while closed
    base: RwLock<Option<UserData>>,
    /// Serializes every read-merge-write and reload
    update_lock: Mutex<()>,
    closed: AtomicBool,
}

impl UserDataStore {
    /// Storage key holding the record
    pub const KEY: StorageKey = StorageKey::UserData;

    /// Create a store; nothing is read until [`UserDataStore::open`]
    pub fn new(manager: StorageManager) -> Self {
        let initial = UserDataSnapshot { loading: true, ..Default::default() };
        let (tx, _) = watch::channel(initial.clone());

        Self {
            manager,
            state: RwLock::new(initial),
            tx,
            base: RwLock::new(None),
            update_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
        }
    }

    /// Start observing and load the record
    pub async fn open(&self) {
        self.closed.store(false, Ordering::SeqCst);
        self.refresh_user_data().await;
    }

    /// Stop observing; late results are discarded
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Current state
    pub fn snapshot(&self) -> UserDataSnapshot {
        self.state.read().clone()
    }

    /// In-memory copy of the record
    pub fn user_data(&self) -> Option<UserData> {
        self.state.read().user_data.clone()
    }

    /// Subscribe to state transitions
    pub fn subscribe(&self) -> watch::Receiver<UserDataSnapshot> {
        self.tx.subscribe()
    }

    /// Fetch the stored record, creating and persisting an empty one if none
    /// exists
    ///
    /// Returns `None` and records the error when storage faults or the stored
    /// record cannot be decoded. The in-memory copy is not touched. Waits for
    /// any update in flight on this store.
    pub async fn get_user_data(&self) -> Option<UserData> {
        let _guard = self.update_lock.lock().await;
        self.fetch().await
    }

    /// Caller holds `update_lock`
    async fn fetch(&self) -> Option<UserData> {
        self.apply(|s| s.error = None);

        match self.load().await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::error!(error = %e, "failed to get user data");
                self.apply(move |s| s.error = Some(e.to_string()));
                None
            }
        }
    }

    async fn load(&self) -> Result<UserData, UserDataError> {
        match self.manager.try_read(Self::KEY, true).await? {
            ReadOutcome::Absent => {
                let empty = UserData::empty();
                let value = serde_json::to_value(&empty).map_err(storage::StorageError::from)?;
                self.manager.try_set(Self::KEY, &value).await?;
                tracing::info!("initialized empty user data");
                Ok(empty)
            }
            ReadOutcome::Parsed(value) => {
                serde_json::from_value(value).map_err(|e| UserDataError::Corrupt(e.to_string()))
            }
            ReadOutcome::Raw(raw) | ReadOutcome::RawFallback(raw) => {
                serde_json::from_str(&raw).map_err(|e| UserDataError::Corrupt(e.to_string()))
            }
        }
    }

    /// Merge `update` into the record and persist the whole record
    ///
    /// The base is the in-memory copy, else the stored record, else a fresh
    /// empty record. Returns `true` once the merged record is persisted, at
    /// which point it also becomes the in-memory copy.
    pub async fn update_user(&self, update: UserUpdate) -> bool {
        let _guard = self.update_lock.lock().await;
        self.apply(|s| s.error = None);

        let current = self.base.read().clone();
        let base = match current {
            Some(current) => current,
            None => match self.fetch().await {
                Some(stored) => stored,
                None => UserData::empty(),
            },
        };

        let merged = base.merged(&update, Utc::now());
        let value = match serde_json::to_value(&merged) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode user data");
                self.apply(move |s| s.error = Some(e.to_string()));
                return false;
            }
        };

        if self.manager.set(Self::KEY, value).await {
            tracing::info!(%update, "user data updated");
            *self.base.write() = Some(merged.clone());
            self.apply(move |s| s.user_data = Some(merged));
            true
        } else {
            self.apply(|s| s.error = Some(UserDataError::SaveFailed.to_string()));
            false
        }
    }

    /// Remove the stored record and drop the in-memory copy
    pub async fn clear_user_data(&self) -> bool {
        let _guard = self.update_lock.lock().await;
        self.apply(|s| s.error = None);

        if self.manager.remove(Self::KEY).await {
            tracing::info!("user data cleared");
            *self.base.write() = None;
            self.apply(|s| s.user_data = None);
            true
        } else {
            self.apply(|s| s.error = Some(UserDataError::ClearFailed.to_string()));
            false
        }
    }

    /// Reload the record from storage into the in-memory copy
    ///
    /// Runs after any update in flight on this store, so a reload never
    /// replaces a newer record with the one it read earlier.
    pub async fn refresh_user_data(&self) {
        let _guard = self.update_lock.lock().await;
        self.apply(|s| {
            s.loading = true;
            s.error = None;
        });

        let refreshed = self.fetch().await;
        *self.base.write() = refreshed.clone();

        self.apply(move |s| {
            s.user_data = refreshed;
            s.loading = false;
        });
    }

    fn apply(&self, f: impl FnOnce(&mut UserDataSnapshot)) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let snapshot = {
            let mut state = self.state.write();
            f(&mut state);
            state.clone()
        };
        self.tx.send_replace(snapshot);
    }
}
