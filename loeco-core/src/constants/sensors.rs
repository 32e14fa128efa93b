//! Sensor Channel Tables
//!
//! Channel names are device-defined (`TempC_SHT`, `Hum_SHT`, `BatV`, ...), so
//! behavior is keyed on case-insensitive keyword substrings. All tables are
//! ordered and evaluated first-match-wins.

// ===== CLASSIFICATION KEYWORDS =====

/// Keywords marking a continuous physical measurement.
///
/// Continuous channels get outlier rejection, Kalman smoothing and bounded
/// interpolation. Evaluated before [`DISCRETE_KEYWORDS`].
pub const CONTINUOUS_KEYWORDS: &[&str] = &["temp", "hum", "press", "wind", "rain"];

/// Keywords marking a discrete/status channel.
///
/// Discrete channels are only forward/backward filled.
pub const DISCRETE_KEYWORDS: &[&str] = &["bat", "status", "sensor"];

// ===== KALMAN PRESETS =====

/// Kalman `(keyword, Q_base, R)` presets per physical quantity.
///
/// `Q_base` is process-noise growth per hour, `R` is measurement variance.
/// Specific sensor keywords come before generic ones.
///
/// - Black bulb (DS18B20 inside a globe): slow thermal mass, noisier probe
/// - Dry bulb (SHT3x): fast and precise
/// - Humidity: large sensor noise (±2-3 %RH)
/// - Pressure: very smooth process, fine resolution
/// - Wind: gusty process, moderate sensor noise
/// - Rain: bursty accumulations, trust the gauge
pub const KALMAN_PRESETS: &[(&str, f64, f64)] = &[
    ("tempc_ds", 0.05, 0.5),
    ("tempc_sht", 0.02, 0.3),
    ("black", 0.05, 0.5),
    ("temp", 0.02, 0.5),
    ("hum", 0.1, 2.0),
    ("press", 0.005, 0.5),
    ("wind", 0.5, 1.5),
    ("rain", 1.0, 0.5),
];
