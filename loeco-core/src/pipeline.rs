//! Stream-to-series reconstruction pipeline
//!
//! ## Stages
//!
//! ```text
//! observations → resample (per device grid)
//!              → per channel, by class:
//!                  continuous:   outlier mask → Kalman smooth → interpolate ≤ limit
//!                  discrete:     ffill → bfill
//!                  unclassified: untouched
//!              → derived channels (dew point)
//!              → time-sorted table
//! ```
//!
//! Devices are processed independently and every stage is a pure function
//! of its input, so identical batches produce identical tables.
//!
//! ## Example
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use loeco_core::{Observation, Pipeline, PipelineConfig};
//!
//! let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
//! let batch: Vec<Observation> = (0..12)
//!     .map(|i| {
//!         Observation::new("field-1", start + Duration::minutes(5 * i))
//!             .with_channel("TempC_SHT", Some(20.0))
//!     })
//!     .collect();
//!
//! let output = Pipeline::new(PipelineConfig::default()).process(&batch).unwrap();
//! assert_eq!(output.table.len(), 2);
//! assert_eq!(output.stats.devices, 1);
//! ```

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::channels::{ChannelClass, ChannelRules};
use crate::constants::{
    GAP_FILL_LIMIT, GRID_INTERVAL_MINUTES, KALMAN_DEFAULT_DT_HOURS, KALMAN_DIVERGENCE_RATIO,
    KALMAN_MIN_DT_HOURS, KALMAN_MIN_SAMPLES, OUTLIER_MIN_PERIODS, OUTLIER_MIN_SAMPLES,
    OUTLIER_N_SIGMA, OUTLIER_WINDOW,
};
use crate::derive::DewPointRule;
use crate::errors::{PipelineError, PipelineResult};
use crate::filters::{smooth_with_store, FilterStateStore, GapFiller, KalmanSmoother, OutlierFilter, RunScopedState};
use crate::observation::Observation;
use crate::resample::resample;
use crate::series::{DeviceGrid, SeriesTable};
use crate::traits::ChannelFilter;

/// Pipeline tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Grid spacing in minutes
    pub grid_interval_minutes: i64,
    /// Rolling window for outlier statistics (grid points)
    pub outlier_window: usize,
    /// Present points needed for a rolling estimate
    pub outlier_min_periods: usize,
    /// Rejection band half-width in standard deviations
    pub outlier_n_sigma: f64,
    /// Present samples needed before rejection runs at all
    pub outlier_min_samples: usize,
    /// Present samples needed before smoothing runs at all
    pub kalman_min_samples: usize,
    /// Elapsed hours assumed before the first sample
    pub kalman_default_dt_hours: f64,
    /// Floor for elapsed hours between samples
    pub kalman_min_dt_hours: f64,
    /// Smoothed/raw spread ratio treated as divergence
    pub kalman_divergence_ratio: f64,
    /// Longest interpolated run (grid points)
    pub gap_fill_limit: usize,
    /// Dew point derivation, `None` to disable
    pub dew_point: Option<DewPointRule>,
    /// Classification and Kalman preset tables
    pub rules: ChannelRules,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            grid_interval_minutes: GRID_INTERVAL_MINUTES,
            outlier_window: OUTLIER_WINDOW,
            outlier_min_periods: OUTLIER_MIN_PERIODS,
            outlier_n_sigma: OUTLIER_N_SIGMA,
            outlier_min_samples: OUTLIER_MIN_SAMPLES,
            kalman_min_samples: KALMAN_MIN_SAMPLES,
            kalman_default_dt_hours: KALMAN_DEFAULT_DT_HOURS,
            kalman_min_dt_hours: KALMAN_MIN_DT_HOURS,
            kalman_divergence_ratio: KALMAN_DIVERGENCE_RATIO,
            gap_fill_limit: GAP_FILL_LIMIT,
            dew_point: Some(DewPointRule::default()),
            rules: ChannelRules::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_grid_interval_minutes(mut self, minutes: i64) -> Self {
        self.grid_interval_minutes = minutes;
        self
    }

    pub fn with_outlier_n_sigma(mut self, n_sigma: f64) -> Self {
        self.outlier_n_sigma = n_sigma;
        self
    }

    pub fn with_gap_fill_limit(mut self, limit: usize) -> Self {
        self.gap_fill_limit = limit;
        self
    }

    pub fn with_dew_point(mut self, rule: Option<DewPointRule>) -> Self {
        self.dew_point = rule;
        self
    }

    pub fn with_rules(mut self, rules: ChannelRules) -> Self {
        self.rules = rules;
        self
    }

    /// Grid interval as a duration, if it is positive and representable in microseconds
    pub fn grid_interval(&self) -> PipelineResult<Duration> {
        if self.grid_interval_minutes <= 0 {
            return Err(PipelineError::InvalidConfig("grid interval must be positive"));
        }
        Duration::try_minutes(self.grid_interval_minutes)
            .filter(|d| d.num_microseconds().is_some())
            .ok_or(PipelineError::InvalidConfig("grid interval is out of range"))
    }

    /// Reject settings that make the pipeline meaningless
    pub fn validate(&self) -> PipelineResult<()> {
        self.grid_interval()?;
        if self.outlier_window == 0 {
            return Err(PipelineError::InvalidConfig("outlier window must be at least one point"));
        }
        if !(self.outlier_n_sigma > 0.0) {
            return Err(PipelineError::InvalidConfig("outlier band must be positive"));
        }
        if !(self.kalman_min_dt_hours > 0.0) {
            return Err(PipelineError::InvalidConfig("Kalman dt floor must be positive"));
        }
        Ok(())
    }

    fn outlier_filter(&self) -> OutlierFilter {
        OutlierFilter::new()
            .with_window(self.outlier_window)
            .with_min_periods(self.outlier_min_periods)
            .with_n_sigma(self.outlier_n_sigma)
            .with_min_samples(self.outlier_min_samples)
    }

    fn smoother_for(&self, channel: &str) -> KalmanSmoother {
        KalmanSmoother::new(self.rules.preset_for(channel))
            .with_default_dt_hours(self.kalman_default_dt_hours)
            .with_min_dt_hours(self.kalman_min_dt_hours)
            .with_min_samples(self.kalman_min_samples)
            .with_divergence_ratio(self.kalman_divergence_ratio)
    }
}

/// Counters for one pipeline run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineStats {
    /// Observations in the batch
    pub observations: usize,
    /// Devices seen
    pub devices: usize,
    /// Grid rows produced
    pub grid_rows: usize,
    /// Values masked by the outlier filter
    pub outliers_masked: usize,
    /// Continuous channels smoothed
    pub channels_smoothed: usize,
    /// Channels where the divergence guard kept the raw series
    pub divergences: usize,
    /// Missing grid values filled
    pub values_filled: usize,
}

/// Processed batch
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Time-sorted rows of every device
    pub table: SeriesTable,
    pub stats: PipelineStats,
}

/// Batch reconstruction pipeline
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process a batch with fresh filter state
    pub fn process(&self, observations: &[Observation]) -> PipelineResult<PipelineOutput> {
        let mut state = RunScopedState::new();
        self.process_with_state(observations, &mut state)
    }

    /// Process a batch, seeding and saving Kalman state through `state`
    pub fn process_with_state(
        &self,
        observations: &[Observation],
        state: &mut dyn FilterStateStore,
    ) -> PipelineResult<PipelineOutput> {
        self.config.validate()?;

        let mut stats = PipelineStats {
            observations: observations.len(),
            ..PipelineStats::default()
        };

        let grids = resample(observations, self.config.grid_interval()?)?;
        stats.devices = grids.len();

        let mut table = SeriesTable::new();
        for mut grid in grids {
            self.process_grid(&mut grid, state, &mut stats);
            stats.grid_rows += grid.len();
            table.extend(grid.into_rows());
        }
        table.sort_by_time();

        log::info!(
            "pipeline: {} observations, {} devices, {} rows, {} outliers masked, {} divergences",
            stats.observations,
            stats.devices,
            stats.grid_rows,
            stats.outliers_masked,
            stats.divergences
        );

        Ok(PipelineOutput { table, stats })
    }

    fn process_grid(&self, grid: &mut DeviceGrid, state: &mut dyn FilterStateStore, stats: &mut PipelineStats) {
        let outliers = self.config.outlier_filter();
        let names: Vec<String> = grid.channels.keys().cloned().collect();

        for name in names {
            let Some(series) = grid.channel(&name) else {
                continue;
            };
            let class = self.config.rules.classify(&name);

            let processed = match class {
                Some(ChannelClass::Continuous) => {
                    let masked = outliers.apply(&series);
                    stats.outliers_masked += series.present_count() - masked.present_count();

                    let smoothed = smooth_with_store(
                        &self.config.smoother_for(&name),
                        &masked,
                        state,
                        &grid.device_id,
                        &name,
                    );
                    if smoothed.diverged {
                        stats.divergences += 1;
                    } else if smoothed.state.is_some() {
                        stats.channels_smoothed += 1;
                    }

                    let filled = GapFiller::new(class)
                        .with_limit(self.config.gap_fill_limit)
                        .apply(&smoothed.series);
                    stats.values_filled += filled.present_count() - smoothed.series.present_count();
                    filled
                }
                Some(ChannelClass::Discrete) => {
                    let filled = GapFiller::new(class).apply(&series);
                    stats.values_filled += filled.present_count() - series.present_count();
                    filled
                }
                None => continue,
            };

            grid.set_channel(&name, processed);
        }

        if let Some(rule) = &self.config.dew_point {
            if rule.apply(grid) {
                log::debug!("derived {} for {}", rule.output, grid.device_id);
            }
        }
    }
}
