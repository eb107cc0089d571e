//! Storage layer for Pulse Profile
//!
//! This crate provides the storage key registry, the device key-value store
//! port with in-memory and sled backends, and the namespaced storage manager.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod device;
pub mod inspector;
pub mod keys;
pub mod kv;
pub mod manager;
pub mod value;

pub use device::{DeviceStore, DeviceStoreError, MemoryDeviceStore};
pub use inspector::{InspectorEntry, InspectorError, StorageInspector};
pub use keys::{StorageConfig, StorageKey, UnknownKey};
pub use kv::{KvConfig, SledDeviceStore};
pub use manager::{StorageError, StorageManager};
pub use value::{encode_value, Encoding, ReadOutcome, StorageValue};
