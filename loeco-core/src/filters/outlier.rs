//! Rolling-statistics outlier rejection
//!
//! A value is kept iff it lies within `n_sigma` sample standard deviations
//! of the centered rolling mean around it. The window is centered the way
//! a 12-point rolling window with centering is: positions `i-6 ..= i+5`,
//! the point itself included. Missing points inside the window are ignored.
//! A window clipped by either end of the series, or holding fewer than
//! `min_periods` present values, has no estimate and the point is judged
//! against the whole channel's statistics instead.
//!
//! Rejected values become missing. The gap filler may later bridge them.

use crate::constants::{OUTLIER_MIN_PERIODS, OUTLIER_MIN_SAMPLES, OUTLIER_N_SIGMA, OUTLIER_WINDOW};
use crate::series::ChannelSeries;
use crate::traits::ChannelFilter;

use super::{mean, sample_std};

/// Whether `value` lies inside the closed band `mean ± n_sigma * std`
pub fn within_band(value: f64, mean: f64, std: f64, n_sigma: f64) -> bool {
    (value - mean).abs() <= n_sigma * std
}

/// Centered rolling-window outlier filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierFilter {
    window: usize,
    min_periods: usize,
    n_sigma: f64,
    min_samples: usize,
}

impl Default for OutlierFilter {
    fn default() -> Self {
        Self {
            window: OUTLIER_WINDOW,
            min_periods: OUTLIER_MIN_PERIODS,
            n_sigma: OUTLIER_N_SIGMA,
            min_samples: OUTLIER_MIN_SAMPLES,
        }
    }
}

impl OutlierFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rolling window length in grid points (at least 1)
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }

    pub fn with_min_periods(mut self, min_periods: usize) -> Self {
        self.min_periods = min_periods;
        self
    }

    pub fn with_n_sigma(mut self, n_sigma: f64) -> Self {
        self.n_sigma = n_sigma;
        self
    }

    /// Channels with fewer present samples are returned untouched
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Inclusive window bounds around position `i`
    fn bounds(&self, i: usize, len: usize) -> (usize, usize) {
        let before = self.window / 2;
        let after = self.window - before - 1;
        (i.saturating_sub(before), (i + after).min(len.saturating_sub(1)))
    }

    /// Rolling `(mean, std)` at position `i`; `None` at the series edges
    /// and below `min_periods`
    fn rolling_estimate(&self, values: &[Option<f64>], i: usize) -> Option<(f64, f64)> {
        let (lo, hi) = self.bounds(i, values.len());
        if hi + 1 - lo < self.window {
            return None;
        }
        let window: Vec<f64> = values[lo..=hi].iter().flatten().copied().collect();
        if window.len() < self.min_periods {
            return None;
        }
        Some((mean(&window)?, sample_std(&window)?))
    }
}

impl ChannelFilter for OutlierFilter {
    fn apply(&self, series: &ChannelSeries) -> ChannelSeries {
        let present = series.present_values();
        if present.len() < self.min_samples {
            return series.clone();
        }

        let global = match (mean(&present), sample_std(&present)) {
            (Some(m), Some(s)) => (m, s),
            _ => return series.clone(),
        };

        let values: Vec<Option<f64>> = series
            .values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let v = (*value)?;
                let (m, s) = self.rolling_estimate(&series.values, i).unwrap_or(global);
                within_band(v, m, s, self.n_sigma).then_some(v)
            })
            .collect();

        let masked = series.present_count() - values.iter().filter(|v| v.is_some()).count();
        if masked > 0 {
            log::debug!("outlier filter masked {} of {} samples", masked, present.len());
        }

        ChannelSeries::new(series.index.clone(), values)
    }

    fn name(&self) -> &'static str {
        "OutlierFilter"
    }
}
