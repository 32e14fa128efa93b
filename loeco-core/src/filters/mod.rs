//! Per-channel filters
//!
//! The three stages run in a fixed order on every continuous channel of a
//! resampled grid:
//!
//! 1. [`OutlierFilter`] masks glitches so they cannot drag the smoother
//! 2. [`KalmanSmoother`] denoises with time-gap-aware process noise
//! 3. [`GapFiller`] bridges short holes; discrete channels are only filled
//!
//! All stages implement [`crate::traits::ChannelFilter`].

pub mod gapfill;
pub mod kalman;
pub mod outlier;

pub use gapfill::{fill_discrete, interpolate_limited, GapFiller};
pub use kalman::{
    smooth_with_store, FilterStateStore, KalmanSmoother, KalmanState, RunScopedState, SmoothOutcome,
};
pub use outlier::{within_band, OutlierFilter};

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator), `None` below two values
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}
