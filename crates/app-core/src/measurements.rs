//! Age, height and weight option tables
//!
//! Options are offered in the unit system the user picked. Every option also
//! carries the converted value so the stored record always has `cm` and `kg`.

use app_state::{Height, Weight};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Selectable ages
pub const AGE_RANGE: RangeInclusive<u32> = 18..=99;

/// Age preselected in the picker
pub const DEFAULT_AGE: u32 = 25;

const CM_PER_INCH: f64 = 2.54;
const KG_PER_LB: f64 = 0.453592;

/// Fraction of the height list preselected in the picker
const HEIGHT_PRESELECT: f64 = 0.4;

/// Fraction of the weight list preselected in the picker
const WEIGHT_PRESELECT: f64 = 0.35;

/// One entry of the height picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightOption {
    /// Whole feet
    pub feet: u32,
    /// Remaining inches
    pub inches: u32,
    /// Centimetres
    pub cm: u32,
    /// Label in the picked unit system
    pub display: String,
}

impl HeightOption {
    /// Imperial option; centimetres are rounded
    pub fn imperial(feet: u32, inches: u32) -> Self {
        let total_inches = f64::from(feet * 12 + inches);
        Self {
            feet,
            inches,
            cm: (total_inches * CM_PER_INCH).round() as u32,
            display: format!("{} ft {} in", feet, inches),
        }
    }

    /// Metric option; feet are floored and inches rounded
    ///
    /// Rounding can yield `inches == 12` just below a whole foot.
    pub fn metric(cm: u32) -> Self {
        let total_inches = f64::from(cm) / CM_PER_INCH;
        Self {
            feet: (total_inches / 12.0).floor() as u32,
            inches: (total_inches % 12.0).round() as u32,
            cm,
            display: format!("{} cm", cm),
        }
    }

    /// Stored height for this option
    pub fn to_height(&self, is_metric: bool) -> Height {
        Height {
            cm: self.cm,
            feet: Some(self.feet),
            inches: Some(self.inches),
            is_metric,
        }
    }
}

/// One entry of the weight picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightOption {
    /// Pounds
    pub lbs: u32,
    /// Kilograms
    pub kg: u32,
    /// Label in the picked unit system
    pub display: String,
}

impl WeightOption {
    /// Imperial option; kilograms are rounded
    pub fn imperial(lbs: u32) -> Self {
        Self {
            lbs,
            kg: (f64::from(lbs) * KG_PER_LB).round() as u32,
            display: format!("{} lbs", lbs),
        }
    }

    /// Metric option; pounds are rounded
    pub fn metric(kg: u32) -> Self {
        Self {
            lbs: (f64::from(kg) / KG_PER_LB).round() as u32,
            kg,
            display: format!("{} kg", kg),
        }
    }

    /// Stored weight for this option
    pub fn to_weight(&self, is_metric: bool) -> Weight {
        Weight { kg: self.kg, lbs: Some(self.lbs), is_metric }
    }
}

/// Height picker entries: 3 ft 0 in to 8 ft 11 in, or 100 to 250 cm
pub fn height_options(is_metric: bool) -> Vec<HeightOption> {
    if is_metric {
        (100..=250).map(HeightOption::metric).collect()
    } else {
        (3..=8)
            .flat_map(|feet| (0..=11).map(move |inches| HeightOption::imperial(feet, inches)))
            .collect()
    }
}

/// Weight picker entries: 80 to 500 lbs, or 35 to 200 kg
pub fn weight_options(is_metric: bool) -> Vec<WeightOption> {
    if is_metric {
        (35..=200).map(WeightOption::metric).collect()
    } else {
        (80..=500).map(WeightOption::imperial).collect()
    }
}

/// Index of the preselected height entry
pub fn initial_height_index(is_metric: bool) -> usize {
    (height_options(is_metric).len() as f64 * HEIGHT_PRESELECT).floor() as usize
}

/// Index of the preselected weight entry
pub fn initial_weight_index(is_metric: bool) -> usize {
    (weight_options(is_metric).len() as f64 * WEIGHT_PRESELECT).floor() as usize
}
