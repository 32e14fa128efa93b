//! Per-channel filter stage
//!
//! Every stage that runs after resampling takes one channel's series and
//! returns a same-indexed copy. Stages never see other channels or other
//! devices, which is what lets the pipeline process devices independently.
//!
//! ```text
//! grid column → [OutlierFilter] → [KalmanSmoother] → [GapFiller] → grid column
//! ```
//!
//! ## Example: Clamping Stage
//!
//! ```rust
//! use loeco_core::series::ChannelSeries;
//! use loeco_core::traits::ChannelFilter;
//!
//! struct NonNegative;
//!
//! impl ChannelFilter for NonNegative {
//!     fn apply(&self, series: &ChannelSeries) -> ChannelSeries {
//!         let values = series.values.iter().map(|v| v.map(|x| x.max(0.0))).collect();
//!         ChannelSeries::new(series.index.clone(), values)
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "NonNegative"
//!     }
//! }
//! ```

use crate::series::ChannelSeries;

/// One stage applied to a single channel
pub trait ChannelFilter {
    /// Filter a series, returning a new one over the same index.
    ///
    /// Implementations must not panic on empty or all-missing input.
    fn apply(&self, series: &ChannelSeries) -> ChannelSeries;

    /// Stage name for logs
    fn name(&self) -> &'static str;
}
