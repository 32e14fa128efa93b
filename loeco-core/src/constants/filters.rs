//! Filter Parameters
//!
//! Defaults for the three per-channel stages that run after resampling:
//! outlier rejection, gap-aware Kalman smoothing and residual gap filling.

// ===== OUTLIER REJECTION =====

/// Rolling window size, in grid points, for the centered mean/std estimate.
///
/// 12 points at a 30-minute grid spans six hours.
pub const OUTLIER_WINDOW: usize = 12;

/// Minimum non-missing points inside a window to produce a rolling estimate.
///
/// Below this the point falls back to the channel's global statistics.
pub const OUTLIER_MIN_PERIODS: usize = 3;

/// Rejection band half-width in standard deviations.
pub const OUTLIER_N_SIGMA: f64 = 3.0;

/// Minimum non-missing samples before rejection is attempted at all.
///
/// With fewer points the statistics are too weak to call anything an outlier.
pub const OUTLIER_MIN_SAMPLES: usize = 10;

// ===== KALMAN SMOOTHING =====

/// Minimum non-missing samples before a channel is smoothed.
pub const KALMAN_MIN_SAMPLES: usize = 3;

/// Elapsed time assumed before the first sample (hours).
pub const KALMAN_DEFAULT_DT_HOURS: f64 = 0.5;

/// Floor applied to the elapsed time between samples (hours).
///
/// Keeps process noise from collapsing to zero on near-duplicate timestamps.
pub const KALMAN_MIN_DT_HOURS: f64 = 0.01;

/// Process noise growth per hour when no preset matches.
pub const KALMAN_DEFAULT_Q_BASE: f64 = 0.01;

/// Measurement noise variance when no preset matches.
pub const KALMAN_DEFAULT_R: f64 = 1.0;

/// Smoothed/raw standard deviation ratio above which the filter is
/// considered divergent and the raw channel is kept.
pub const KALMAN_DIVERGENCE_RATIO: f64 = 3.0;

// ===== GAP FILLING =====

/// Longest run of missing grid points that interpolation may bridge.
///
/// 4 points at a 30-minute grid is two hours.
pub const GAP_FILL_LIMIT: usize = 4;
