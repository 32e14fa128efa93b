//! Constants for LoEco Core
//!
//! This module provides centralized, documented constants used throughout
//! the reconstruction pipeline. Numeric defaults live here so that
//! [`crate::pipeline::PipelineConfig::default`] and the individual filters
//! agree on a single source of truth.
//!
//! ## Organization
//!
//! Constants are grouped by domain:
//! - **Time**: Resampling grid width
//! - **Filters**: Outlier rejection, Kalman smoothing and gap-filling limits
//! - **Sensors**: Channel keyword tables and Kalman presets per quantity
//! - **Physics**: Dew point formula coefficients and unit conversions

/// Resampling grid width.
pub mod time;

/// Outlier, Kalman and gap-filling parameters.
pub mod filters;

/// Channel classification keywords and Kalman noise presets.
pub mod sensors;

/// Physical constants and unit conversion factors.
pub mod physics;

pub use time::GRID_INTERVAL_MINUTES;

pub use filters::{
    OUTLIER_WINDOW, OUTLIER_MIN_PERIODS, OUTLIER_N_SIGMA, OUTLIER_MIN_SAMPLES,
    KALMAN_MIN_SAMPLES, KALMAN_DEFAULT_DT_HOURS, KALMAN_MIN_DT_HOURS,
    KALMAN_DEFAULT_Q_BASE, KALMAN_DEFAULT_R, KALMAN_DIVERGENCE_RATIO,
    GAP_FILL_LIMIT,
};

pub use sensors::{CONTINUOUS_KEYWORDS, DISCRETE_KEYWORDS, KALMAN_PRESETS};
