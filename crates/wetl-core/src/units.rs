//! Unit conversion utilities
//!
//! The API is queried in US units (°F, knots, inches); records carry both
//! the source values and their metric equivalents.

use crate::types::Timestamp;
use chrono::DateTime;

const KNOTS_TO_MPS: f64 = 0.514444;
const INCHES_TO_MM: f64 = 25.4;
const FEET_TO_METERS: f64 = 0.3048;
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Decimal places kept on every stored numeric field
pub const OUTPUT_DECIMALS: u32 = 2;

/// Unit conversion error
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum UnitError {
    #[error("Non-finite input: {0}")]
    NonFiniteInput(f64),

    #[error("Conversion {conversion:?} of {value} produced a non-finite result")]
    NonFiniteResult { conversion: Conversion, value: f64 },
}

/// Named conversion applied to a derived record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conversion {
    FahrenheitToCelsius,
    KnotsToMetersPerSecond,
    InchesToMillimeters,
    FeetToMeters,
}

impl Conversion {
    /// Convert a single finite value
    pub fn convert(self, value: f64) -> Result<f64, UnitError> {
        if !value.is_finite() {
            return Err(UnitError::NonFiniteInput(value));
        }

        let converted = match self {
            Conversion::FahrenheitToCelsius => fahrenheit_to_celsius(value),
            Conversion::KnotsToMetersPerSecond => knots_to_meters_per_second(value),
            Conversion::InchesToMillimeters => inches_to_millimeters(value),
            Conversion::FeetToMeters => feet_to_meters(value),
        };

        if converted.is_finite() {
            Ok(converted)
        } else {
            Err(UnitError::NonFiniteResult {
                conversion: self,
                value,
            })
        }
    }

    /// Convert and round an optional value; errors are logged and yield `None`
    pub fn apply(self, value: Option<f64>) -> Option<f64> {
        let value = value?;
        match self.convert(value) {
            Ok(converted) => Some(round(converted, OUTPUT_DECIMALS)),
            Err(e) => {
                tracing::warn!(error = %e, value, "unit conversion failed");
                None
            }
        }
    }
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

pub fn knots_to_meters_per_second(knots: f64) -> f64 {
    knots * KNOTS_TO_MPS
}

pub fn inches_to_millimeters(inches: f64) -> f64 {
    inches * INCHES_TO_MM
}

pub fn feet_to_meters(feet: f64) -> f64 {
    feet * FEET_TO_METERS
}

pub fn seconds_to_hours(seconds: f64) -> f64 {
    seconds / SECONDS_PER_HOUR
}

/// Format a Unix timestamp as `YYYY-MM-DDTHH:MM:SSZ`
///
/// Returns `None` for timestamps outside chrono's representable range.
pub fn unix_to_iso_utc(timestamp: Timestamp) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

/// Round half-up to `decimals` places
///
/// Ties go toward positive infinity (`-2.5` rounds to `-2`), so repeated
/// rounding is stable.
pub fn round(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let multiplier = 10_f64.powi(decimals as i32);
    let scaled = value * multiplier;
    if !scaled.is_finite() {
        return value;
    }
    // `scaled - floor` is exact, unlike `scaled + 0.5`
    let floor = scaled.floor();
    let rounded = if scaled - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded / multiplier
}
