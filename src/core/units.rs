//! Display units for real-valued attributes
//!
//! The host stores lengths in feet, areas in square feet, volumes in cubic
//! feet and angles in radians. Attributes may declare a display unit; values
//! are converted on the way out to the workbook and back on the way in.

use serde::{Deserialize, Serialize};

/// Physical dimension of a unit, used to check that a typed suffix is compatible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Length,
    Area,
    Volume,
    Angle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayUnit {
    #[serde(rename = "mm", alias = "millimeters")]
    Millimeters,
    #[serde(rename = "cm", alias = "centimeters")]
    Centimeters,
    #[serde(rename = "m", alias = "meters")]
    Meters,
    #[serde(rename = "ft", alias = "feet")]
    Feet,
    #[serde(rename = "in", alias = "inches")]
    Inches,
    #[serde(rename = "m²", alias = "m2")]
    SquareMeters,
    #[serde(rename = "ft²", alias = "ft2")]
    SquareFeet,
    #[serde(rename = "m³", alias = "m3")]
    CubicMeters,
    #[serde(rename = "ft³", alias = "ft3")]
    CubicFeet,
    #[serde(rename = "°", alias = "deg")]
    Degrees,
}

impl DisplayUnit {
    /// Parse a unit symbol or name as typed by a user
    pub fn parse(unit: &str) -> Option<Self> {
        let unit_lower = unit.trim().to_lowercase();
        match unit_lower.as_str() {
            "mm" | "millimeter" | "millimeters" => Some(DisplayUnit::Millimeters),
            "cm" | "centimeter" | "centimeters" => Some(DisplayUnit::Centimeters),
            "m" | "meter" | "meters" | "metre" | "metres" => Some(DisplayUnit::Meters),
            "ft" | "'" | "foot" | "feet" => Some(DisplayUnit::Feet),
            "in" | "\"" | "inch" | "inches" => Some(DisplayUnit::Inches),
            "m²" | "m2" | "sqm" => Some(DisplayUnit::SquareMeters),
            "ft²" | "ft2" | "sf" | "sqft" => Some(DisplayUnit::SquareFeet),
            "m³" | "m3" => Some(DisplayUnit::CubicMeters),
            "ft³" | "ft3" | "cf" => Some(DisplayUnit::CubicFeet),
            "°" | "deg" | "degree" | "degrees" => Some(DisplayUnit::Degrees),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            DisplayUnit::Millimeters => "mm",
            DisplayUnit::Centimeters => "cm",
            DisplayUnit::Meters => "m",
            DisplayUnit::Feet => "ft",
            DisplayUnit::Inches => "in",
            DisplayUnit::SquareMeters => "m²",
            DisplayUnit::SquareFeet => "ft²",
            DisplayUnit::CubicMeters => "m³",
            DisplayUnit::CubicFeet => "ft³",
            DisplayUnit::Degrees => "°",
        }
    }

    pub fn dimension(self) -> Dimension {
        match self {
            DisplayUnit::Millimeters
            | DisplayUnit::Centimeters
            | DisplayUnit::Meters
            | DisplayUnit::Feet
            | DisplayUnit::Inches => Dimension::Length,
            DisplayUnit::SquareMeters | DisplayUnit::SquareFeet => Dimension::Area,
            DisplayUnit::CubicMeters | DisplayUnit::CubicFeet => Dimension::Volume,
            DisplayUnit::Degrees => Dimension::Angle,
        }
    }

    /// Display units per internal unit
    fn factor(self) -> f64 {
        match self {
            DisplayUnit::Millimeters => 304.8,
            DisplayUnit::Centimeters => 30.48,
            DisplayUnit::Meters => 0.3048,
            DisplayUnit::Feet => 1.0,
            DisplayUnit::Inches => 12.0,
            DisplayUnit::SquareMeters => 0.092_903_04,
            DisplayUnit::SquareFeet => 1.0,
            DisplayUnit::CubicMeters => 0.028_316_846_592,
            DisplayUnit::CubicFeet => 1.0,
            DisplayUnit::Degrees => 180.0 / std::f64::consts::PI,
        }
    }

    /// Internal → display. `None` when the result is not a finite number.
    pub fn to_display(self, internal: f64) -> Option<f64> {
        finite(internal * self.factor())
    }

    /// Display → internal. `None` when the result is not a finite number.
    pub fn from_display(self, display: f64) -> Option<f64> {
        finite(display / self.factor())
    }

    /// Convert a value typed in `self` into `target` (same dimension only)
    pub fn convert_to(self, value: f64, target: DisplayUnit) -> Option<f64> {
        if self.dimension() != target.dimension() {
            return None;
        }
        self.from_display(value).and_then(|internal| target.to_display(internal))
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbols_and_names() {
        assert_eq!(DisplayUnit::parse("mm"), Some(DisplayUnit::Millimeters));
        assert_eq!(DisplayUnit::parse(" Meters "), Some(DisplayUnit::Meters));
        assert_eq!(DisplayUnit::parse("ft2"), Some(DisplayUnit::SquareFeet));
        assert_eq!(DisplayUnit::parse("deg"), Some(DisplayUnit::Degrees));
        assert_eq!(DisplayUnit::parse("furlong"), None);
    }

    #[test]
    fn test_length_conversion() {
        let display = DisplayUnit::Millimeters.to_display(10.0).unwrap();
        assert!((display - 3048.0).abs() < 1e-9);
        let internal = DisplayUnit::Millimeters.from_display(3048.0).unwrap();
        assert!((internal - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_cross_unit_conversion_same_dimension() {
        let mm = DisplayUnit::Meters.convert_to(3.0, DisplayUnit::Millimeters).unwrap();
        assert!((mm - 3000.0).abs() < 1e-9);
    }

    #[test]
    fn test_cross_dimension_conversion_refused() {
        assert!(DisplayUnit::Meters
            .convert_to(3.0, DisplayUnit::SquareMeters)
            .is_none());
    }

    #[test]
    fn test_non_finite_is_none() {
        assert!(DisplayUnit::Feet.to_display(f64::NAN).is_none());
        assert!(DisplayUnit::Millimeters.to_display(f64::MAX).is_none());
    }
}
