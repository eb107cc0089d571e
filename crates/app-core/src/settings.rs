//! Settings: developer mode and session teardown
//!
//! Developer mode is a hidden switch flipped by tapping an invisible control
//! [`DEVELOPER_TAP_COUNT`] times within [`DEVELOPER_TAP_WINDOW`]. It is stored
//! as the string `"true"` or `"false"`.

use app_state::{BindingOptions, StorageBinding};
use parking_lot::Mutex;
use std::time::Duration;
use storage::{StorageKey, StorageManager};
use tokio::time::Instant;

/// Taps needed to flip developer mode
pub const DEVELOPER_TAP_COUNT: u32 = 3;

/// Window, measured from the first tap, in which the taps must land
pub const DEVELOPER_TAP_WINDOW: Duration = Duration::from_secs(2);

/// Result of one tap on the hidden control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// Tap counted; holds the count so far
    Counted(u32),
    /// Developer mode flipped to the given state
    Toggled(bool),
    /// Threshold reached but the new state could not be saved
    Failed,
}

#[derive(Debug, Default)]
struct TapCounter {
    count: u32,
    window_start: Option<Instant>,
}

impl TapCounter {
    /// Count a tap; `true` once the threshold is reached
    fn register(&mut self, now: Instant) -> bool {
        if let Some(start) = self.window_start {
            if now.duration_since(start) >= DEVELOPER_TAP_WINDOW {
                self.reset();
            }
        }
        if self.count == 0 {
            self.window_start = Some(now);
        }
        self.count += 1;

        if self.count >= DEVELOPER_TAP_COUNT {
            self.reset();
            true
        } else {
            false
        }
    }

    fn reset(&mut self) {
        self.count = 0;
        self.window_start = None;
    }
}

/// Settings screen state
pub struct Settings {
    developer_mode: StorageBinding,
    taps: Mutex<TapCounter>,
}

impl Settings {
    /// Create settings over a storage manager
    pub fn new(manager: StorageManager) -> Self {
        Self {
            developer_mode: StorageBinding::new(
                manager,
                StorageKey::DeveloperModeEnabled,
                BindingOptions::new("false"),
            ),
            taps: Mutex::new(TapCounter::default()),
        }
    }

    /// Load the stored developer mode flag
    pub async fn open(&self) {
        self.developer_mode.open().await;
    }

    /// Stop observing
    pub fn close(&self) {
        self.developer_mode.close();
    }

    /// Whether developer mode is on
    pub fn is_developer_mode_enabled(&self) -> bool {
        self.developer_mode.value().as_str() == Some("true")
    }

    /// Flip developer mode; returns the new state once saved
    pub async fn toggle_developer_mode(&self) -> Option<bool> {
        let enabled = !self.is_developer_mode_enabled();
        if self.developer_mode.set_value(enabled.to_string()).await {
            tracing::info!(enabled, "developer mode changed");
            Some(enabled)
        } else {
            None
        }
    }

    /// Register a tap on the hidden control
    pub async fn tap(&self) -> TapOutcome {
        let reached = self.taps.lock().register(Instant::now());
        if !reached {
            return TapOutcome::Counted(self.taps.lock().count);
        }

        match self.toggle_developer_mode().await {
            Some(enabled) => TapOutcome::Toggled(enabled),
            None => TapOutcome::Failed,
        }
    }

    /// Sign out: wipe every namespaced entry
    pub async fn logout(&self) -> bool {
        let cleared = self.developer_mode.clear_all().await;
        if cleared {
            tracing::info!("logged out, local data cleared");
        }
        cleared
    }

    /// Delete the account locally: wipe every namespaced entry
    pub async fn delete_account(&self) -> bool {
        let cleared = self.developer_mode.clear_all().await;
        if cleared {
            tracing::info!("account deleted, local data cleared");
        }
        cleared
    }
}
