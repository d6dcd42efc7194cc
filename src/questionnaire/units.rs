//! Conversions between display units and the canonical metric units.

use std::fmt;

pub const LBS_PER_KG: f64 = 2.20462;
pub const CM_PER_INCH: f64 = 2.54;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightUnit {
    #[default]
    Kg,
    Lbs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeightUnit {
    #[default]
    Cm,
    In,
}

impl WeightUnit {
    pub fn toggled(self) -> Self {
        match self {
            Self::Kg => Self::Lbs,
            Self::Lbs => Self::Kg,
        }
    }
}

impl HeightUnit {
    pub fn toggled(self) -> Self {
        match self {
            Self::Cm => Self::In,
            Self::In => Self::Cm,
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Kg => "kg",
            Self::Lbs => "lbs",
        })
    }
}

impl fmt::Display for HeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cm => "cm",
            Self::In => "in",
        })
    }
}

pub fn kg_to_lbs(kg: f64) -> f64 {
    kg * LBS_PER_KG
}

pub fn lbs_to_kg(lbs: f64) -> f64 {
    lbs / LBS_PER_KG
}

pub fn cm_to_in(cm: f64) -> f64 {
    cm / CM_PER_INCH
}

pub fn in_to_cm(inches: f64) -> f64 {
    inches * CM_PER_INCH
}

fn parse_display(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn rounded(value: f64) -> String {
    format!("{}", value.round())
}

/// Re-expresses a displayed weight in the other unit, rounded to a whole
/// number. Empty or non-numeric text is returned untouched.
pub fn toggle_weight_display(text: &str, from: WeightUnit) -> String {
    match parse_display(text) {
        Some(value) => match from {
            WeightUnit::Kg => rounded(kg_to_lbs(value)),
            WeightUnit::Lbs => rounded(lbs_to_kg(value)),
        },
        None => text.to_string(),
    }
}

/// Height counterpart of [`toggle_weight_display`].
pub fn toggle_height_display(text: &str, from: HeightUnit) -> String {
    match parse_display(text) {
        Some(value) => match from {
            HeightUnit::Cm => rounded(cm_to_in(value)),
            HeightUnit::In => rounded(in_to_cm(value)),
        },
        None => text.to_string(),
    }
}

/// Kilograms for the currently displayed value and unit.
pub fn canonical_weight(text: &str, unit: WeightUnit) -> Option<f64> {
    parse_display(text).map(|value| match unit {
        WeightUnit::Kg => value,
        WeightUnit::Lbs => lbs_to_kg(value),
    })
}

/// Centimeters for the currently displayed value and unit.
pub fn canonical_height(text: &str, unit: HeightUnit) -> Option<f64> {
    parse_display(text).map(|value| match unit {
        HeightUnit::Cm => value,
        HeightUnit::In => in_to_cm(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_round_trip_stays_within_one_kg() {
        for kg in 30..=200 {
            let lbs = toggle_weight_display(&kg.to_string(), WeightUnit::Kg);
            let back: i64 = toggle_weight_display(&lbs, WeightUnit::Lbs).parse().unwrap();
            assert!((back - kg).abs() <= 1, "{kg} kg came back as {back}");
        }
    }

    #[test]
    fn height_round_trip_stays_within_rounding() {
        for cm in 100..=220 {
            let inches = toggle_height_display(&cm.to_string(), HeightUnit::Cm);
            let back: i64 = toggle_height_display(&inches, HeightUnit::In).parse().unwrap();
            assert!((back - cm).abs() <= 2, "{cm} cm came back as {back}");
        }
    }

    #[test]
    fn display_toggle_rounds_to_whole_numbers() {
        assert_eq!(toggle_weight_display("150", WeightUnit::Lbs), "68");
        assert_eq!(toggle_weight_display("68", WeightUnit::Kg), "150");
        assert_eq!(toggle_height_display("70", HeightUnit::In), "178");
        assert_eq!(toggle_height_display("178", HeightUnit::Cm), "70");
    }

    #[test]
    fn empty_and_non_numeric_pass_through() {
        assert_eq!(toggle_weight_display("", WeightUnit::Kg), "");
        assert_eq!(toggle_weight_display("heavy", WeightUnit::Lbs), "heavy");
        assert_eq!(toggle_height_display("  ", HeightUnit::In), "  ");
        assert_eq!(canonical_weight("", WeightUnit::Lbs), None);
        assert_eq!(canonical_height("tall", HeightUnit::Cm), None);
    }

    #[test]
    fn canonical_value_is_computed_from_display() {
        let kg = canonical_weight("150", WeightUnit::Lbs).unwrap();
        assert!((kg - 68.0388).abs() < 1e-3);
        assert_eq!(canonical_weight("68", WeightUnit::Kg), Some(68.0));
        let cm = canonical_height("70", HeightUnit::In).unwrap();
        assert!((cm - 177.8).abs() < 1e-9);
    }
}
