//! User profile record
//!
//! [`UserData`] is persisted whole under `user_data`. It is only ever changed
//! by overlaying a [`UserUpdate`], which also refreshes `updated_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gender code as persisted: `0` male, `1` female
///
/// The stored format has exactly these two codes; anything else fails to
/// deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Gender {
    /// Code 0
    Male,
    /// Code 1
    Female,
}

impl Gender {
    /// Persisted numeric code
    pub fn code(self) -> u8 {
        match self {
            Gender::Male => 0,
            Gender::Female => 1,
        }
    }
}

impl From<Gender> for u8 {
    fn from(gender: Gender) -> Self {
        gender.code()
    }
}

impl TryFrom<u8> for Gender {
    type Error = InvalidGenderCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Gender::Male),
            1 => Ok(Gender::Female),
            other => Err(InvalidGenderCode(other)),
        }
    }
}

/// Unrecognized gender code
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid gender code: {0}")]
pub struct InvalidGenderCode(pub u8);

/// Lenient reading of stored whole numbers
///
/// Records written by other clients may carry fractional or float-typed
/// values; they are rounded instead of rejecting the whole record.
mod whole {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    fn to_u32<E: Error>(n: f64) -> Result<u32, E> {
        if n.is_finite() && n >= 0.0 && n <= f64::from(u32::MAX) {
            Ok(n.round() as u32)
        } else {
            Err(E::custom(format!("expected a non-negative number, got {}", n)))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        to_u32(f64::deserialize(d)?)
    }

    pub mod option {
        use serde::{Deserialize, Deserializer};

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
            Option::<f64>::deserialize(d)?.map(super::to_u32).transpose()
        }
    }
}

/// Height, always carrying centimetres
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Height {
    /// Centimetres
    #[serde(deserialize_with = "whole::deserialize")]
    pub cm: u32,
    /// Whole feet (imperial display)
    #[serde(
        default,
        deserialize_with = "whole::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub feet: Option<u32>,
    /// Remaining inches (imperial display)
    #[serde(
        default,
        deserialize_with = "whole::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub inches: Option<u32>,
    /// Whether the user picked metric units
    pub is_metric: bool,
}

/// Weight, always carrying kilograms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weight {
    /// Kilograms
    #[serde(deserialize_with = "whole::deserialize")]
    pub kg: u32,
    /// Pounds (imperial display)
    #[serde(
        default,
        deserialize_with = "whole::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub lbs: Option<u32>,
    /// Whether the user picked metric units
    pub is_metric: bool,
}

/// Persisted user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    /// Name shown in the app
    pub display_name: Option<String>,
    /// Gender code
    pub gender: Option<Gender>,
    /// Age in years
    #[serde(default, deserialize_with = "whole::option::deserialize")]
    pub age: Option<u32>,
    /// Height
    pub height: Option<Height>,
    /// Weight
    pub weight: Option<Weight>,
    /// Set once when the record is first created
    pub created_at: DateTime<Utc>,
    /// Refreshed on every update
    pub updated_at: DateTime<Utc>,
    /// Whether the basic onboarding finished
    #[serde(default)]
    pub onboarding_completed: bool,
    /// Last completed onboarding stage
    pub onboarding_step: Option<String>,
}

impl UserData {
    /// Fresh record with every optional field empty
    pub fn empty() -> Self {
        Self::empty_at(Utc::now())
    }

    /// Fresh record stamped at `now`
    pub fn empty_at(now: DateTime<Utc>) -> Self {
        Self {
            display_name: None,
            gender: None,
            age: None,
            height: None,
            weight: None,
            created_at: now,
            updated_at: now,
            onboarding_completed: false,
            onboarding_step: None,
        }
    }

    /// Overlay `update` on this record, stamping `updated_at = now`
    ///
    /// Fields absent from the update keep their current value.
    pub fn merged(&self, update: &UserUpdate, now: DateTime<Utc>) -> Self {
        let mut merged = self.clone();

        if let Some(name) = &update.display_name {
            merged.display_name = Some(name.clone());
        }
        if let Some(gender) = update.gender {
            merged.gender = Some(gender);
        }
        if let Some(age) = update.age {
            merged.age = Some(age);
        }
        if let Some(height) = &update.height {
            merged.height = Some(height.clone());
        }
        if let Some(weight) = &update.weight {
            merged.weight = Some(weight.clone());
        }
        if let Some(completed) = update.onboarding_completed {
            merged.onboarding_completed = completed;
        }
        if let Some(step) = &update.onboarding_step {
            merged.onboarding_step = Some(step.clone());
        }

        merged.updated_at = now;
        merged
    }
}

/// Partial profile update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    /// New display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// New gender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    /// New age
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// New height
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Height>,
    /// New weight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Weight>,
    /// New onboarding completion flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboarding_completed: Option<bool>,
    /// New onboarding step marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboarding_step: Option<String>,
}

impl UserUpdate {
    /// Empty update
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the display name
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set the gender
    pub fn gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    /// Set the age
    pub fn age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    /// Set the height
    pub fn height(mut self, height: Height) -> Self {
        self.height = Some(height);
        self
    }

    /// Set the weight
    pub fn weight(mut self, weight: Weight) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Set the onboarding completion flag
    pub fn onboarding_completed(mut self, completed: bool) -> Self {
        self.onboarding_completed = Some(completed);
        self
    }

    /// Set the onboarding step marker
    pub fn onboarding_step(mut self, step: impl Into<String>) -> Self {
        self.onboarding_step = Some(step.into());
        self
    }

    /// Whether the update carries no fields
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for UserUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_empty_record() {
        let user = UserData::empty_at(at(1_700_000_000));
        assert_eq!(user.display_name, None);
        assert_eq!(user.gender, None);
        assert_eq!(user.age, None);
        assert_eq!(user.height, None);
        assert_eq!(user.weight, None);
        assert_eq!(user.onboarding_step, None);
        assert!(!user.onboarding_completed);
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_wire_format() {
        let user = UserData::empty_at(at(0)).merged(
            &UserUpdate::new()
                .display_name("Deniz")
                .gender(Gender::Female)
                .height(Height { cm: 170, feet: Some(5), inches: Some(7), is_metric: false }),
            at(60),
        );

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["displayName"], json!("Deniz"));
        assert_eq!(value["gender"], json!(1));
        assert_eq!(value["age"], json!(null));
        assert_eq!(value["height"], json!({"cm": 170, "feet": 5, "inches": 7, "isMetric": false}));
        assert_eq!(value["weight"], json!(null));
        assert_eq!(value["createdAt"], json!("1970-01-01T00:00:00Z"));
        assert_eq!(value["updatedAt"], json!("1970-01-01T00:01:00Z"));
        assert_eq!(value["onboardingCompleted"], json!(false));
        assert_eq!(value["onboardingStep"], json!(null));
    }

    #[test]
    fn test_reads_millisecond_timestamps() {
        let stored = json!({
            "displayName": null,
            "gender": 0,
            "age": 25,
            "height": null,
            "weight": {"kg": 70, "isMetric": true},
            "createdAt": "2024-03-01T10:00:00.000Z",
            "updatedAt": "2024-03-01T10:05:00.000Z",
            "onboardingCompleted": false,
            "onboardingStep": "age_completed"
        });

        let user: UserData = serde_json::from_value(stored).unwrap();
        assert_eq!(user.gender, Some(Gender::Male));
        assert_eq!(user.weight, Some(Weight { kg: 70, lbs: None, is_metric: true }));
        assert_eq!(user.onboarding_step.as_deref(), Some("age_completed"));
    }

    #[test]
    fn test_reads_fractional_measurements() {
        let stored = json!({
            "displayName": "Can",
            "gender": null,
            "age": 29.0,
            "height": {"cm": 170.6, "feet": 5, "inches": 7.2, "isMetric": true},
            "weight": {"kg": 70.4, "lbs": 155.2, "isMetric": true},
            "createdAt": "2024-03-01T10:00:00.000Z",
            "updatedAt": "2024-03-01T10:00:00.000Z",
            "onboardingCompleted": false,
            "onboardingStep": null
        });

        let user: UserData = serde_json::from_value(stored).unwrap();
        assert_eq!(user.age, Some(29));
        assert_eq!(user.height, Some(Height { cm: 171, feet: Some(5), inches: Some(7), is_metric: true }));
        assert_eq!(user.weight, Some(Weight { kg: 70, lbs: Some(155), is_metric: true }));

        // Written back as whole numbers
        assert_eq!(serde_json::to_value(&user).unwrap()["height"]["cm"], json!(171));
    }

    #[test]
    fn test_rejects_negative_measurements() {
        let err = serde_json::from_value::<Weight>(json!({"kg": -3, "isMetric": true})).unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn test_rejects_unknown_gender_code() {
        let err = serde_json::from_value::<Gender>(json!(2)).unwrap_err();
        assert!(err.to_string().contains("invalid gender code: 2"));
        assert_eq!(Gender::try_from(1u8), Ok(Gender::Female));
    }

    #[test]
    fn test_merge_overlays_present_fields_only() {
        let base = UserData::empty_at(at(100)).merged(&UserUpdate::new().age(30), at(200));
        let merged = base.merged(&UserUpdate::new().gender(Gender::Male), at(300));

        assert_eq!(merged.age, Some(30));
        assert_eq!(merged.gender, Some(Gender::Male));
        assert_eq!(merged.created_at, at(100));
        assert_eq!(merged.updated_at, at(300));
    }

    #[test]
    fn test_merge_sets_onboarding_flags() {
        let merged = UserData::empty_at(at(0)).merged(
            &UserUpdate::new()
                .onboarding_step("weight_completed")
                .onboarding_completed(true),
            at(1),
        );
        assert!(merged.onboarding_completed);
        assert_eq!(merged.onboarding_step.as_deref(), Some("weight_completed"));
    }

    #[test]
    fn test_update_builder() {
        assert!(UserUpdate::new().is_empty());
        let update = UserUpdate::new().age(41);
        assert!(!update.is_empty());
        assert_eq!(update.to_string(), "{\"age\":41}");
    }
}
