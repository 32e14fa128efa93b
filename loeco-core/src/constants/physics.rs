//! Physical Constants
//!
//! Coefficients for derived quantities and unit conversions applied to
//! upstream data that does not report SI/metric units.

// ===== DEW POINT (MAGNUS FORMULA) =====

/// Magnus coefficient `a` (dimensionless), valid for -45°C to 60°C over water.
///
/// Source: Sonntag (1990) / WMO guide
pub const MAGNUS_A: f64 = 17.62;

/// Magnus coefficient `b` (°C).
pub const MAGNUS_B: f64 = 243.12;

/// Relative humidity clip range (%) applied before taking the logarithm.
pub const DEW_POINT_RH_MIN_PCT: f64 = 1.0;

/// Upper relative humidity clip (%).
pub const DEW_POINT_RH_MAX_PCT: f64 = 100.0;

// ===== UNIT CONVERSIONS =====

/// Hectopascals per inch of mercury.
pub const HPA_PER_INHG: f64 = 33.8639;

/// Convert degrees Fahrenheit to Celsius.
pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}
