//! Application state for Pulse Profile
//!
//! This crate provides storage-bound state holders for single keys and key
//! groups, the persisted user profile record, and the user data aggregate
//! that reads, merges and writes it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod binding;
pub mod group;
pub mod profile;
pub mod user_data;

#[cfg(test)]
mod test_utils;

pub use binding::{BindingOptions, BindingSnapshot, BindingState, StorageBinding};
pub use group::{GroupSnapshot, GroupValues, StorageGroupBinding};
pub use profile::{Gender, Height, InvalidGenderCode, UserData, UserUpdate, Weight};
pub use user_data::{UserDataError, UserDataSnapshot, UserDataStore};
