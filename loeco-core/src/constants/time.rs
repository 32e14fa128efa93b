//! Time-Related Constants
//!
//! This module defines the resampling grid width.

// ===== RESAMPLING GRID =====

/// Width of one grid bucket (minutes).
///
/// Uplinks arrive every few minutes with jitter and occasional loss;
/// 30 minutes leaves several native samples per bucket while still
/// resolving the diurnal cycle.
pub const GRID_INTERVAL_MINUTES: i64 = 30;
