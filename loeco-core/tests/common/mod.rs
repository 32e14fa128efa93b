//! Common test utilities and data generators for integration tests
//!
//! This module provides:
//! - Seeded telemetry generators shaped like the field devices
//! - SSE body encoding for stream-level tests
//! - Assertion helpers and a deterministic RNG

#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};

use loeco_core::Timestamp;

pub mod generators;
pub mod harness;

/// Grid-aligned start of every scenario
pub fn start() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// `start() + minutes`
pub fn at(minutes: i64) -> Timestamp {
    start() + Duration::minutes(minutes)
}
