//! Core application logic for Pulse Profile
//!
//! This crate contains the caller-side logic around the persisted state:
//! onboarding, input validation, measurement tables, app preferences and
//! settings.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod measurements;
pub mod onboarding;
pub mod preferences;
pub mod settings;
pub mod validation;

pub use measurements::{HeightOption, WeightOption, AGE_RANGE, DEFAULT_AGE};
pub use onboarding::{OnboardingError, OnboardingFlow, OnboardingStep};
pub use preferences::{AppPreferences, PreferenceError, Theme};
pub use settings::{Settings, TapOutcome};
pub use validation::{validate_display_name, NameError};
