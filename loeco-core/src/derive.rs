//! Derived channels
//!
//! Dew point is computed from dry-bulb temperature and relative humidity
//! with the Magnus approximation:
//!
//! ```text
//! γ  = ln(RH/100) + a·T / (b + T)
//! Td = b·γ / (a - γ)
//! ```
//!
//! RH is clipped to `[1, 100]` % first so the logarithm stays finite.

use serde::{Deserialize, Serialize};

use crate::constants::physics::{DEW_POINT_RH_MAX_PCT, DEW_POINT_RH_MIN_PCT, MAGNUS_A, MAGNUS_B};
use crate::series::DeviceGrid;

/// Dew point (°C) from temperature (°C) and relative humidity (%)
pub fn dew_point(temp_c: f64, rh_pct: f64) -> f64 {
    let rh = rh_pct.clamp(DEW_POINT_RH_MIN_PCT, DEW_POINT_RH_MAX_PCT);
    let gamma = (rh / 100.0).ln() + MAGNUS_A * temp_c / (MAGNUS_B + temp_c);
    MAGNUS_B * gamma / (MAGNUS_A - gamma)
}

/// Which channels feed the dew point and where it goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DewPointRule {
    /// Dry-bulb temperature channel (°C)
    pub temperature: String,
    /// Relative humidity channel (%)
    pub humidity: String,
    /// Output channel name
    pub output: String,
}

impl Default for DewPointRule {
    fn default() -> Self {
        Self {
            temperature: "TempC_SHT".into(),
            humidity: "Hum_SHT".into(),
            output: "DewPoint".into(),
        }
    }
}

impl DewPointRule {
    /// Add the dew point column to `grid`.
    ///
    /// Returns `false` (grid untouched) when either source channel is absent.
    pub fn apply(&self, grid: &mut DeviceGrid) -> bool {
        let (Some(temp), Some(hum)) = (
            grid.channels.get(&self.temperature),
            grid.channels.get(&self.humidity),
        ) else {
            return false;
        };

        let column: Vec<Option<f64>> = temp
            .iter()
            .zip(hum)
            .map(|(t, h)| match (t, h) {
                (Some(t), Some(h)) => Some(dew_point(*t, *h)).filter(|d| d.is_finite()),
                _ => None,
            })
            .collect();

        grid.channels.insert(self.output.clone(), column);
        true
    }
}
