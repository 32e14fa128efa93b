//! Gap-Aware Scalar Kalman Smoother
//!
//! ## Overview
//!
//! Each continuous channel is filtered independently with a random-walk
//! state model. The only twist is that process noise grows with the time
//! since the previous sample, so a reading after a long outage is trusted
//! more than one right after its predecessor.
//!
//! ## Model
//!
//! ```text
//! dt      = hours since previous processed sample (first: 0.5h, floor 0.01h)
//! Q       = Q_base · dt
//! predict:  x̂ = x           P̂ = P + Q
//! update:   K = P̂ / (P̂ + R)
//!           x = x̂ + K·(z - x̂)
//!           P = (1 - K)·P̂
//! ```
//!
//! `(Q_base, R)` come from the channel's preset (see [`crate::channels`]).
//!
//! ## Numerical Stability
//!
//! With finite, positive `Q` and `R` the gain stays in `[0, 1]` and the
//! estimate is a convex combination of the inputs. Presets that are far off
//! (huge `Q_base`) can still overflow `P` to infinity, which turns the gain
//! into NaN. The divergence guard catches that, and also a smoothed series
//! whose spread exceeds the raw spread by more than the divergence ratio.
//! Either way the raw channel is returned and a warning is logged.
//!
//! ## State Lifetime
//!
//! `(x, P)` is channel-local. [`FilterStateStore`] is the seam for carrying
//! it across runs; [`RunScopedState`] starts empty, so by default every run
//! starts fresh from the first sample.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::channels::KalmanPreset;
use crate::constants::{
    KALMAN_DEFAULT_DT_HOURS, KALMAN_DIVERGENCE_RATIO, KALMAN_MIN_DT_HOURS, KALMAN_MIN_SAMPLES,
};
use crate::series::ChannelSeries;
use crate::time::hours_between;
use crate::traits::ChannelFilter;

use super::sample_std;

/// Scalar filter state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KalmanState {
    /// State estimate
    pub x: f64,
    /// Estimate variance
    pub p: f64,
}

impl KalmanState {
    pub fn new(x: f64, p: f64) -> Self {
        Self { x, p }
    }

    /// Prediction step: random walk, variance grows by `q`
    fn predict(&mut self, q: f64) {
        self.p += q;
    }

    /// Update step with measurement `z` of variance `r`
    fn update(&mut self, z: f64, r: f64) {
        let k = self.p / (self.p + r);
        self.x += k * (z - self.x);
        self.p *= 1.0 - k;
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.p.is_finite()
    }
}

/// Persistence seam for filter state keyed by `(device_id, channel)`
pub trait FilterStateStore {
    /// State left by a previous run, if any
    fn load(&self, device_id: &str, channel: &str) -> Option<KalmanState>;

    /// Remember the final state of this run
    fn store(&mut self, device_id: &str, channel: &str, state: KalmanState);
}

/// State store that lives for one run and starts empty
#[derive(Debug, Default, Clone)]
pub struct RunScopedState {
    states: HashMap<(String, String), KalmanState>,
}

impl RunScopedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl FilterStateStore for RunScopedState {
    fn load(&self, device_id: &str, channel: &str) -> Option<KalmanState> {
        self.states
            .get(&(device_id.to_string(), channel.to_string()))
            .copied()
    }

    fn store(&mut self, device_id: &str, channel: &str, state: KalmanState) {
        self.states
            .insert((device_id.to_string(), channel.to_string()), state);
    }
}

/// Result of smoothing one channel
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothOutcome {
    /// Smoothed series, or the raw one on fallback
    pub series: ChannelSeries,
    /// Final state when smoothing ran and stayed stable
    pub state: Option<KalmanState>,
    /// The divergence guard rejected the estimate
    pub diverged: bool,
}

/// Per-channel gap-aware smoother
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KalmanSmoother {
    preset: KalmanPreset,
    default_dt_hours: f64,
    min_dt_hours: f64,
    min_samples: usize,
    divergence_ratio: f64,
}

impl Default for KalmanSmoother {
    fn default() -> Self {
        Self::new(KalmanPreset::default())
    }
}

impl KalmanSmoother {
    pub fn new(preset: KalmanPreset) -> Self {
        Self {
            preset,
            default_dt_hours: KALMAN_DEFAULT_DT_HOURS,
            min_dt_hours: KALMAN_MIN_DT_HOURS,
            min_samples: KALMAN_MIN_SAMPLES,
            divergence_ratio: KALMAN_DIVERGENCE_RATIO,
        }
    }

    /// Elapsed time assumed before the first sample
    pub fn with_default_dt_hours(mut self, hours: f64) -> Self {
        self.default_dt_hours = hours;
        self
    }

    pub fn with_min_dt_hours(mut self, hours: f64) -> Self {
        self.min_dt_hours = hours;
        self
    }

    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    pub fn with_divergence_ratio(mut self, ratio: f64) -> Self {
        self.divergence_ratio = ratio;
        self
    }

    pub fn preset(&self) -> KalmanPreset {
        self.preset
    }

    /// Smooth starting from the first sample
    pub fn smooth(&self, series: &ChannelSeries) -> ChannelSeries {
        self.smooth_from(series, None).series
    }

    /// Smooth, optionally seeding `(x, P)` from a previous run
    pub fn smooth_from(&self, series: &ChannelSeries, initial: Option<KalmanState>) -> SmoothOutcome {
        if series.present_count() < self.min_samples {
            return SmoothOutcome {
                series: series.clone(),
                state: None,
                diverged: false,
            };
        }

        let raw = if series.has_duplicate_index() {
            log::debug!("dropping duplicate timestamps before smoothing");
            series.dedup_first()
        } else {
            series.clone()
        };

        let (values, state) = self.run(&raw, initial);

        if self.is_divergent(&raw, &values) {
            log::warn!(
                "Kalman estimate diverged (Q_base={}, R={}); keeping raw channel",
                self.preset.q_base,
                self.preset.r
            );
            return SmoothOutcome {
                series: raw,
                state: None,
                diverged: true,
            };
        }

        SmoothOutcome {
            series: ChannelSeries::new(raw.index, values),
            state,
            diverged: false,
        }
    }

    /// Filter pass over present samples; missing samples stay missing
    fn run(&self, raw: &ChannelSeries, initial: Option<KalmanState>) -> (Vec<Option<f64>>, Option<KalmanState>) {
        let mut state = initial;
        let mut previous = None;

        let values = raw
            .index
            .iter()
            .zip(&raw.values)
            .map(|(ts, value)| {
                let z = (*value)?;
                let dt = match previous {
                    Some(prev) => hours_between(prev, *ts),
                    None => self.default_dt_hours,
                }
                .max(self.min_dt_hours);
                previous = Some(*ts);

                let s = state.get_or_insert(KalmanState::new(z, self.preset.r));
                s.predict(self.preset.q_base * dt);
                s.update(z, self.preset.r);
                Some(s.x)
            })
            .collect();

        (values, state)
    }

    fn is_divergent(&self, raw: &ChannelSeries, smoothed: &[Option<f64>]) -> bool {
        let estimates: Vec<f64> = smoothed.iter().flatten().copied().collect();
        if estimates.iter().any(|x| !x.is_finite()) {
            return true;
        }
        match (sample_std(&estimates), sample_std(&raw.present_values())) {
            (Some(smoothed_std), Some(raw_std)) => smoothed_std > self.divergence_ratio * raw_std,
            _ => false,
        }
    }
}

impl ChannelFilter for KalmanSmoother {
    fn apply(&self, series: &ChannelSeries) -> ChannelSeries {
        self.smooth(series)
    }

    fn name(&self) -> &'static str {
        "KalmanSmoother"
    }
}

/// Smooth `series` seeding from and saving to `store`
pub fn smooth_with_store(
    smoother: &KalmanSmoother,
    series: &ChannelSeries,
    store: &mut dyn FilterStateStore,
    device_id: &str,
    channel: &str,
) -> SmoothOutcome {
    let outcome = smoother.smooth_from(series, store.load(device_id, channel));
    if let Some(state) = outcome.state.filter(KalmanState::is_finite) {
        store.store(device_id, channel, state);
    }
    outcome
}
