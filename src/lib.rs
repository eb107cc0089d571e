//! Pulse Profile
//!
//! Local persisted state for the Pulse Profile app: the namespaced storage
//! layer, storage-bound state holders, the user profile aggregate and the
//! onboarding and settings logic built on top of them.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod telemetry;

pub use app_core;
pub use app_state;
pub use storage;

pub use telemetry::{init_tracing, LogConfig, TelemetryError};
