//! Storage-bound state for a group of keys
//!
//! Batched counterpart of [`crate::binding::StorageBinding`]. Values live in a
//! partial map: keys with nothing stored are absent, never `Null`.

use crate::binding::{BindingState, BindingOptions};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use storage::{StorageKey, StorageManager, StorageValue};
use tokio::sync::watch;

/// Partial map of stored values
pub type GroupValues = BTreeMap<StorageKey, StorageValue>;

/// Observable state of a group binding
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupSnapshot {
    /// Values of the keys that are stored
    pub values: GroupValues,
    /// Load state
    pub state: BindingState,
    /// Whether a load is in flight
    pub loading: bool,
    /// Message of the last failure
    pub error: Option<String>,
}

/// Multi-key storage binding
pub struct StorageGroupBinding {
    manager: StorageManager,
    keys: Vec<StorageKey>,
    defaults: GroupValues,
    parse_json: bool,
    state: RwLock<GroupSnapshot>,
    tx: watch::Sender<GroupSnapshot>,
    closed: AtomicBool,
}

impl StorageGroupBinding {
    /// Create a group binding over `keys`
    ///
    /// `defaults` is reported before the first load and after a failed one.
    pub fn new(
        manager: StorageManager,
        keys: impl Into<Vec<StorageKey>>,
        defaults: GroupValues,
        parse_json: bool,
    ) -> Self {
        let initial = GroupSnapshot { values: defaults.clone(), ..Default::default() };
        let (tx, _) = watch::channel(initial.clone());

        Self {
            manager,
            keys: keys.into(),
            defaults,
            parse_json,
            state: RwLock::new(initial),
            tx,
            closed: AtomicBool::new(false),
        }
    }

    /// Group binding with no defaults, using the JSON flag of `options`
    pub fn with_options(
        manager: StorageManager,
        keys: impl Into<Vec<StorageKey>>,
        options: &BindingOptions,
    ) -> Self {
        Self::new(manager, keys, GroupValues::new(), options.parse_json)
    }

    /// Keys in this group
    pub fn keys(&self) -> &[StorageKey] {
        &self.keys
    }

    /// Start observing and load every key
    pub async fn open(&self) {
        self.closed.store(false, Ordering::SeqCst);
        self.refresh().await;
    }

    /// Stop observing; late results are discarded
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Current state
    pub fn snapshot(&self) -> GroupSnapshot {
        self.state.read().clone()
    }

    /// Current values
    pub fn values(&self) -> GroupValues {
        self.state.read().values.clone()
    }

    /// Subscribe to state transitions
    pub fn subscribe(&self) -> watch::Receiver<GroupSnapshot> {
        self.tx.subscribe()
    }

    /// Reload every key
    pub async fn refresh(&self) {
        self.apply(|s| {
            s.loading = true;
            s.state = BindingState::Loading;
            s.error = None;
        });

        let result = self.manager.try_multi_get(&self.keys, self.parse_json).await;
        let defaults = self.defaults.clone();

        self.apply(move |s| {
            s.loading = false;
            match result {
                Ok(values) => {
                    s.values = values;
                    s.state = BindingState::Ready;
                }
                Err(e) => {
                    s.values = defaults;
                    s.state = BindingState::Error;
                    s.error = Some(e.to_string());
                }
            }
        });
    }

    /// Write several values at once and merge them into the local map
    ///
    /// `Null` entries are neither written nor merged.
    pub async fn set_values(&self, values: GroupValues) -> bool {
        self.apply(|s| s.error = None);

        let encoding = BindingOptions::default().parse_json(self.parse_json).encoding();
        let present: GroupValues = values.into_iter().filter(|(_, v)| !v.is_null()).collect();

        match self
            .manager
            .try_multi_set_encoded(present.clone(), encoding)
            .await
        {
            Ok(()) => {
                self.apply(move |s| {
                    s.values.extend(present);
                    s.state = BindingState::Ready;
                });
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "group binding write failed");
                self.apply(move |s| {
                    s.state = BindingState::Error;
                    s.error = Some(e.to_string());
                });
                false
            }
        }
    }

    fn apply(&self, f: impl FnOnce(&mut GroupSnapshot)) {
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
