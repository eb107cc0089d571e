//! Onboarding flow
//!
//! Each onboarding screen saves one profile field through the user data
//! aggregate and records its step marker. Input is validated here, before
//! anything reaches storage.

use crate::measurements::{HeightOption, WeightOption, AGE_RANGE};
use crate::validation::{validate_display_name, NameError};
use app_state::{Gender, UserDataStore, UserUpdate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Onboarding errors
#[derive(Debug, Error)]
pub enum OnboardingError {
    /// Display name rejected
    #[error("Invalid name: {0}")]
    InvalidName(#[from] NameError),

    /// Age outside the selectable range
    #[error("Age out of range: {0}")]
    AgeOutOfRange(u32),

    /// Profile could not be saved
    #[error("Failed to save {0}")]
    SaveFailed(OnboardingStep),

    /// Unrecognized step marker
    #[error("Unknown onboarding step: {0}")]
    UnknownStep(String),
}

/// Result type for onboarding operations
pub type Result<T> = std::result::Result<T, OnboardingError>;

/// Completed onboarding stage, persisted as `onboardingStep`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OnboardingStep {
    /// Display name saved
    #[serde(rename = "name_completed")]
    Name,
    /// Gender saved
    #[serde(rename = "gender_completed")]
    Gender,
    /// Age saved
    #[serde(rename = "age_completed")]
    Age,
    /// Height saved
    #[serde(rename = "height_completed")]
    Height,
    /// Weight saved; basic onboarding is complete
    #[serde(rename = "weight_completed")]
    Weight,
}

impl OnboardingStep {
    /// Steps in screen order
    pub const ALL: [OnboardingStep; 5] = [
        OnboardingStep::Name,
        OnboardingStep::Gender,
        OnboardingStep::Age,
        OnboardingStep::Height,
        OnboardingStep::Weight,
    ];

    /// Persisted marker
    pub fn as_str(self) -> &'static str {
        match self {
            OnboardingStep::Name => "name_completed",
            OnboardingStep::Gender => "gender_completed",
            OnboardingStep::Age => "age_completed",
            OnboardingStep::Height => "height_completed",
            OnboardingStep::Weight => "weight_completed",
        }
    }

    /// Step after this one
    pub fn next(self) -> Option<OnboardingStep> {
        let index = Self::ALL.iter().position(|step| *step == self)?;
        Self::ALL.get(index + 1).copied()
    }
}

impl fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OnboardingStep {
    type Err = OnboardingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| OnboardingError::UnknownStep(s.to_string()))
    }
}

/// Saves onboarding answers into the user profile
pub struct OnboardingFlow {
    users: Arc<UserDataStore>,
}

impl OnboardingFlow {
    /// Create a flow over a user data store
    pub fn new(users: Arc<UserDataStore>) -> Self {
        Self { users }
    }

    /// Validate and save the display name; returns the trimmed name
    pub async fn save_name(&self, input: &str) -> Result<String> {
        let name = validate_display_name(input)?;
        self.record(OnboardingStep::Name, UserUpdate::new().display_name(name.clone()))
            .await?;
        Ok(name)
    }

    /// Save the gender
    pub async fn save_gender(&self, gender: Gender) -> Result<()> {
        self.record(OnboardingStep::Gender, UserUpdate::new().gender(gender))
            .await
    }

    /// Save the age; must lie in [`AGE_RANGE`]
    pub async fn save_age(&self, age: u32) -> Result<()> {
        if !AGE_RANGE.contains(&age) {
            return Err(OnboardingError::AgeOutOfRange(age));
        }
        self.record(OnboardingStep::Age, UserUpdate::new().age(age)).await
    }

    /// Save the height picked in the given unit system
    pub async fn save_height(&self, option: &HeightOption, is_metric: bool) -> Result<()> {
        self.record(
            OnboardingStep::Height,
            UserUpdate::new().height(option.to_height(is_metric)),
        )
        .await
    }

    /// Save the weight and mark basic onboarding complete
    pub async fn save_weight(&self, option: &WeightOption, is_metric: bool) -> Result<()> {
        self.record(
            OnboardingStep::Weight,
            UserUpdate::new()
                .weight(option.to_weight(is_metric))
                .onboarding_completed(true),
        )
        .await
    }

    /// Last completed step of the in-memory profile
    ///
    /// Unrecognized markers read as no progress.
    pub fn current_step(&self) -> Option<OnboardingStep> {
        let marker = self.users.user_data()?.onboarding_step?;
        marker.parse().ok()
    }

    /// Step the user should see next
    pub fn next_step(&self) -> Option<OnboardingStep> {
        match self.current_step() {
            Some(step) => step.next(),
            None => Some(OnboardingStep::Name),
        }
    }

    /// Whether basic onboarding finished
    pub fn is_completed(&self) -> bool {
        self.users
            .user_data()
            .map(|user| user.onboarding_completed)
            .unwrap_or(false)
    }

    async fn record(&self, step: OnboardingStep, update: UserUpdate) -> Result<()> {
        let update = update.onboarding_step(step.as_str());
        if self.users.update_user(update).await {
            tracing::debug!(%step, "onboarding step saved");
            Ok(())
        } else {
            Err(OnboardingError::SaveFailed(step))
        }
    }
}
