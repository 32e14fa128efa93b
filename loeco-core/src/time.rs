//! Time handling for the reconstruction pipeline
//!
//! All grid arithmetic operates on elapsed UTC time (microseconds since the
//! UNIX epoch), never on local calendar fields, so bucketing is immune to DST
//! transitions and day boundaries.
//!
//! Provides clock abstraction for the few places that need "now":
//! - System clock (production runs)
//! - Fixed clock (tests, replays)

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Wall-clock timestamp used throughout the pipeline
pub type Timestamp = DateTime<Utc>;

/// Source of wall-clock time
pub trait TimeSource {
    /// Current UTC time
    fn now(&self) -> Timestamp;
}

/// System clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Fixed time source for testing
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Timestamp,
}

impl FixedTime {
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    pub fn advance(&mut self, by: Duration) {
        self.timestamp += by;
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }
}

/// Floor `ts` to the start of its `interval`-wide bucket, aligned to the epoch.
///
/// Non-positive intervals return `ts` unchanged.
pub fn floor_to_interval(ts: Timestamp, interval: Duration) -> Timestamp {
    let Some(step) = interval.num_microseconds().filter(|s| *s > 0) else {
        return ts;
    };
    let micros = ts.timestamp_micros();
    let floored = micros - micros.rem_euclid(step);
    Utc.timestamp_micros(floored).single().unwrap_or(ts)
}

/// Elapsed hours from `earlier` to `later` (negative if `later` precedes it)
pub fn hours_between(earlier: Timestamp, later: Timestamp) -> f64 {
    let delta = later - earlier;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 3_600_000_000.0,
        None => delta.num_seconds() as f64 / 3_600.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn fixed_time_advances() {
        let mut time = FixedTime::new(ts("2026-01-05T10:00:00Z"));
        time.advance(Duration::minutes(90));
        assert_eq!(time.now(), ts("2026-01-05T11:30:00Z"));
    }

    #[test]
    fn floors_to_half_hour() {
        let half_hour = Duration::minutes(30);
        assert_eq!(
            floor_to_interval(ts("2026-03-29T01:59:59.999Z"), half_hour),
            ts("2026-03-29T01:30:00Z")
        );
        assert_eq!(
            floor_to_interval(ts("2026-03-29T02:00:00Z"), half_hour),
            ts("2026-03-29T02:00:00Z")
        );
    }

    #[test]
    fn floor_ignores_offsets() {
        // Same instant written with two offsets lands in the same bucket
        let a = DateTime::parse_from_rfc3339("2026-10-25T02:44:00+02:00").unwrap();
        let b = DateTime::parse_from_rfc3339("2026-10-25T00:44:00+00:00").unwrap();
        let half_hour = Duration::minutes(30);
        assert_eq!(
            floor_to_interval(a.with_timezone(&Utc), half_hour),
            floor_to_interval(b.with_timezone(&Utc), half_hour)
        );
    }

    #[test]
    fn hours_between_is_signed() {
        let a = ts("2026-01-01T00:00:00Z");
        let b = ts("2026-01-01T01:30:00Z");
        assert_eq!(hours_between(a, b), 1.5);
        assert_eq!(hours_between(b, a), -1.5);
    }
}
