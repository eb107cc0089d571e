//! Storage-bound state for a single key
//!
//! [`StorageBinding`] keeps an observable copy of one stored value. It loads
//! on [`StorageBinding::open`], writes through on every change, and publishes
//! a [`BindingSnapshot`] to subscribers after each transition. Faults never
//! escape; they land in the snapshot's `error` field.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use storage::{Encoding, ReadOutcome, StorageKey, StorageManager, StorageValue};
use tokio::sync::watch;

/// Message used when a stored value is not valid JSON
pub const PARSE_ERROR: &str = "Failed to parse stored value";

/// Load state of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingState {
    /// Not opened yet
    #[default]
    Idle,
    /// Load in flight
    Loading,
    /// Value is loaded or was written
    Ready,
    /// Last operation failed
    Error,
}

/// Binding configuration
#[derive(Debug, Clone, Default)]
pub struct BindingOptions {
    /// Value reported while loading and when nothing is stored
    pub default_value: StorageValue,
    /// Store and read values as JSON
    pub parse_json: bool,
}

impl BindingOptions {
    /// Create options with a default value
    pub fn new(default_value: impl Into<StorageValue>) -> Self {
        Self { default_value: default_value.into(), parse_json: false }
    }

    /// Store and read values as JSON
    pub fn parse_json(mut self, enabled: bool) -> Self {
        self.parse_json = enabled;
        self
    }

    pub(crate) fn encoding(&self) -> Encoding {
        if self.parse_json {
            Encoding::Json
        } else {
            Encoding::Plain
        }
    }
}

/// Observable state of a binding
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BindingSnapshot {
    /// Current value (`Null` after removal)
    pub value: StorageValue,
    /// Load state
    pub state: BindingState,
    /// Whether a load is in flight
    pub loading: bool,
    /// Message of the last failure, cleared by the next operation
    pub error: Option<String>,
}

/// Single-key storage binding
pub struct StorageBinding {
    manager: StorageManager,
    key: StorageKey,
    options: BindingOptions,
    state: RwLock<BindingSnapshot>,
    tx: watch::Sender<BindingSnapshot>,
    closed: AtomicBool,
}

impl StorageBinding {
    /// Create a binding; nothing is read until [`StorageBinding::open`]
    pub fn new(manager: StorageManager, key: StorageKey, options: BindingOptions) -> Self {
        let initial = BindingSnapshot {
            value: options.default_value.clone(),
            ..Default::default()
        };
        let (tx, _) = watch::channel(initial.clone());

        Self {
            manager,
            key,
            options,
            state: RwLock::new(initial),
            tx,
            closed: AtomicBool::new(false),
        }
    }

    /// Key this binding is attached to
    pub fn key(&self) -> StorageKey {
        self.key
    }

    /// Start observing: mark live and load the stored value
    pub async fn open(&self) {
        self.closed.store(false, Ordering::SeqCst);
        self.refresh().await;
    }

    /// Stop observing; results of in-flight operations are discarded
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Whether the binding has been closed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Current state
    pub fn snapshot(&self) -> BindingSnapshot {
        self.state.read().clone()
    }

    /// Current value
    pub fn value(&self) -> StorageValue {
        self.state.read().value.clone()
    }

    /// Subscribe to state transitions
    pub fn subscribe(&self) -> watch::Receiver<BindingSnapshot> {
        self.tx.subscribe()
    }

    /// Reload the value from storage
    pub async fn refresh(&self) {
        self.apply(|s| {
            s.loading = true;
            s.state = BindingState::Loading;
            s.error = None;
        });

        let result = self.manager.try_read(self.key, self.options.parse_json).await;
        let default = self.options.default_value.clone();

        self.apply(move |s| {
            s.loading = false;
            match result {
                Ok(ReadOutcome::Absent) => {
                    s.value = default;
                    s.state = BindingState::Ready;
                }
                Ok(ReadOutcome::Parsed(value)) => {
                    s.value = value;
                    s.state = BindingState::Ready;
                }
                Ok(ReadOutcome::Raw(raw)) => {
                    s.value = StorageValue::String(raw);
                    s.state = BindingState::Ready;
                }
                Ok(ReadOutcome::RawFallback(_)) => {
                    s.value = default;
                    s.state = BindingState::Error;
                    s.error = Some(PARSE_ERROR.to_string());
                }
                Err(e) => {
                    tracing::warn!(key = %self.key, error = %e, "binding load failed");
                    s.value = default;
                    s.state = BindingState::Error;
                    s.error = Some(e.to_string());
                }
            }
        });
    }

    /// Write a new value; `Null` removes the key
    ///
    /// The local value is updated optimistically once the write succeeds;
    /// storage is not re-read.
    pub async fn set_value(&self, value: impl Into<StorageValue>) -> bool {
        let value = value.into();
        self.apply(|s| s.error = None);

        let result = if value.is_null() {
            self.manager.try_remove(self.key).await
        } else {
            self.manager
                .try_set_encoded(self.key, &value, self.options.encoding())
                .await
        };

        self.finish_write(result.map(|_| value))
    }

    /// Remove the key; the value becomes `Null`
    pub async fn remove_value(&self) -> bool {
        self.apply(|s| s.error = None);
        let result = self.manager.try_remove(self.key).await;
        self.finish_write(result.map(|_| StorageValue::Null))
    }

    /// Clear the whole namespace; the value resets to the default
    pub async fn clear_all(&self) -> bool {
        self.apply(|s| s.error = None);
        let result = self.manager.try_clear().await;
        let default = self.options.default_value.clone();
        self.finish_write(result.map(|_| default))
    }

    fn finish_write(&self, result: storage::manager::Result<StorageValue>) -> bool {
        match result {
            Ok(value) => {
                self.apply(move |s| {
                    s.value = value;
                    s.state = BindingState::Ready;
                });
                true
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "binding write failed");
                self.apply(move |s| {
                    s.state = BindingState::Error;
                    s.error = Some(e.to_string());
                });
                false
            }
        }
    }

    /// Mutate the state and notify subscribers, unless closed
    fn apply(&self, f: impl FnOnce(&mut BindingSnapshot)) {
        if self.is_closed() {
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
