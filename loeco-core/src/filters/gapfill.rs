//! Residual gap filling
//!
//! After outlier masking and smoothing, short holes are bridged:
//!
//! - continuous channels: time-weighted linear interpolation across interior
//!   runs of at most `limit` missing points; leading/trailing runs of at most
//!   `limit` take the nearest valid value; longer runs stay missing
//! - discrete channels: forward fill, then backward fill, no limit
//! - unclassified channels: untouched

use crate::channels::ChannelClass;
use crate::constants::GAP_FILL_LIMIT;
use crate::series::ChannelSeries;
use crate::time::hours_between;
use crate::traits::ChannelFilter;

/// Interpolate runs of missing values no longer than `limit`
pub fn interpolate_limited(series: &ChannelSeries, limit: usize) -> ChannelSeries {
    let mut values = series.values.clone();
    let len = values.len();
    let mut i = 0;

    while i < len {
        if values[i].is_some() {
            i += 1;
            continue;
        }

        let start = i;
        while i < len && values[i].is_none() {
            i += 1;
        }
        let end = i; // exclusive
        if end - start > limit {
            continue;
        }

        let before = start.checked_sub(1).and_then(|j| values[j].map(|v| (j, v)));
        let after = values.get(end).copied().flatten().map(|v| (end, v));

        match (before, after) {
            (Some((ja, a)), Some((jb, b))) => {
                let (ta, tb) = (series.index[ja], series.index[jb]);
                let span = hours_between(ta, tb);
                for k in start..end {
                    let w = if span > 0.0 {
                        hours_between(ta, series.index[k]) / span
                    } else {
                        0.0
                    };
                    values[k] = Some(a + (b - a) * w);
                }
            }
            (Some((_, a)), None) => values[start..end].fill(Some(a)),
            (None, Some((_, b))) => values[start..end].fill(Some(b)),
            (None, None) => {}
        }
    }

    ChannelSeries::new(series.index.clone(), values)
}

/// Forward fill then backward fill
pub fn fill_discrete(series: &ChannelSeries) -> ChannelSeries {
    let mut values = series.values.clone();

    let mut last = None;
    for v in values.iter_mut() {
        match v {
            Some(x) => last = Some(*x),
            None => *v = last,
        }
    }

    let mut next = None;
    for v in values.iter_mut().rev() {
        match v {
            Some(x) => next = Some(*x),
            None => *v = next,
        }
    }

    ChannelSeries::new(series.index.clone(), values)
}

/// Class-dependent gap filler
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapFiller {
    class: Option<ChannelClass>,
    limit: usize,
}

impl GapFiller {
    pub fn new(class: Option<ChannelClass>) -> Self {
        Self {
            class,
            limit: GAP_FILL_LIMIT,
        }
    }

    /// Longest interpolated run for continuous channels
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl ChannelFilter for GapFiller {
    fn apply(&self, series: &ChannelSeries) -> ChannelSeries {
        match self.class {
            Some(ChannelClass::Continuous) => interpolate_limited(series, self.limit),
            Some(ChannelClass::Discrete) => fill_discrete(series),
            None => series.clone(),
        }
    }

    fn name(&self) -> &'static str {
        "GapFiller"
    }
}
