//! Display name validation

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

/// Minimum display name length in characters
pub const MIN_NAME_LENGTH: usize = 2;

/// Maximum display name length in characters
pub const MAX_NAME_LENGTH: usize = 30;

/// Display name rejections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NameError {
    /// Nothing but whitespace
    #[error("Name is required")]
    Required,

    /// Shorter than [`MIN_NAME_LENGTH`]
    #[error("Name must be at least 2 characters")]
    TooShort,

    /// Longer than [`MAX_NAME_LENGTH`]
    #[error("Name must be at most 30 characters")]
    TooLong,

    /// Contains something other than letters, spaces, `'` or `-`
    #[error("Name may only contain letters, spaces, apostrophes and hyphens")]
    InvalidCharacters,
}

fn name_regex() -> &'static Regex {
    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    NAME_REGEX.get_or_init(|| Regex::new(r"^[a-zA-ZğüşıöçĞÜŞİÖÇ\s'-]+$").unwrap())
}

/// Validate a display name, returning it trimmed
///
/// Latin letters plus the Turkish letters `ğüşıöçĞÜŞİÖÇ` are accepted.
pub fn validate_display_name(input: &str) -> Result<String, NameError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(NameError::Required);
    }

    let length = trimmed.graphemes(true).count();
    if length < MIN_NAME_LENGTH {
        return Err(NameError::TooShort);
    }
    if length > MAX_NAME_LENGTH {
        return Err(NameError::TooLong);
    }

    if !name_regex().is_match(trimmed) {
        return Err(NameError::InvalidCharacters);
    }

    Ok(trimmed.to_string())
}
