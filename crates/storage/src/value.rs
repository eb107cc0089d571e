//! Stored value encoding
//!
//! The device store only holds strings. Strings are written verbatim,
//! numbers and booleans as their display form, objects and arrays as JSON.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// A value that can be handed to the storage manager
///
/// `Value::Null` is the delete sentinel and is never written.
pub type StorageValue = Value;

/// How a value is turned into the stored string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Strings verbatim, primitives as text, structures as JSON
    #[default]
    Plain,
    /// Everything JSON-encoded, strings included
    Json,
}

/// Encode a non-null value for storage
///
/// Returns `None` for `Value::Null`.
pub fn encode_value(value: &StorageValue, encoding: Encoding) -> Option<String> {
    match (value, encoding) {
        (Value::Null, _) => None,
        (Value::String(s), Encoding::Plain) => Some(s.clone()),
        (Value::Bool(b), Encoding::Plain) => Some(b.to_string()),
        (Value::Number(n), Encoding::Plain) => Some(n.to_string()),
        (other, _) => Some(other.to_string()),
    }
}

/// Result of reading a key
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// Nothing stored (or the read faulted)
    Absent,
    /// Raw string, no parse requested
    Raw(String),
    /// Stored string parsed as JSON
    Parsed(Value),
    /// Parse requested but the stored string is not JSON
    RawFallback(String),
}

impl ReadOutcome {
    /// Build an outcome from a stored string
    pub fn from_stored(raw: Option<String>, parse_json: bool) -> Self {
        match raw {
            None => ReadOutcome::Absent,
            Some(raw) if !parse_json => ReadOutcome::Raw(raw),
            Some(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(value) => ReadOutcome::Parsed(value),
                Err(_) => ReadOutcome::RawFallback(raw),
            },
        }
    }

    /// Whether anything was stored
    pub fn is_present(&self) -> bool {
        !matches!(self, ReadOutcome::Absent)
    }

    /// Whether the stored string failed to parse
    pub fn is_fallback(&self) -> bool {
        matches!(self, ReadOutcome::RawFallback(_))
    }

    /// Collapse into a plain value, raw strings becoming `Value::String`
    pub fn into_value(self) -> Option<Value> {
        match self {
            ReadOutcome::Absent => None,
            ReadOutcome::Raw(s) | ReadOutcome::RawFallback(s) => Some(Value::String(s)),
            ReadOutcome::Parsed(v) => Some(v),
        }
    }

    /// Decode a parsed value into `T`
    pub fn decode<T: DeserializeOwned>(self) -> Option<serde_json::Result<T>> {
        match self {
            ReadOutcome::Absent => None,
            ReadOutcome::Parsed(v) => Some(serde_json::from_value(v)),
            ReadOutcome::Raw(s) | ReadOutcome::RawFallback(s) => Some(serde_json::from_str(&s)),
        }
    }
}
