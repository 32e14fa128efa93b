//! Decoded telemetry readings
//!
//! An [`Observation`] is one uplink reduced to what the pipeline needs: which
//! device sent it, when it arrived, and its numeric channel values. It has
//! no identity beyond `(device_id, observed_at)`; at-least-once delivery
//! means duplicates are normal and resolved by the resampler.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::time::Timestamp;

/// Channel name to numeric-or-missing value, ordered by name
pub type Channels = BTreeMap<String, Option<f64>>;

/// One decoded reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Upstream device identifier
    pub device_id: String,
    /// Arrival time at the network server (UTC)
    pub observed_at: Timestamp,
    /// Decoded sensor channels
    pub channels: Channels,
}

impl Observation {
    pub fn new(device_id: impl Into<String>, observed_at: Timestamp) -> Self {
        Self {
            device_id: device_id.into(),
            observed_at,
            channels: Channels::new(),
        }
    }

    /// Builder-style channel insertion
    pub fn with_channel(mut self, name: impl Into<String>, value: Option<f64>) -> Self {
        self.channels.insert(name.into(), value);
        self
    }
}

/// Coerce a decoded JSON value into a channel value.
///
/// Numbers pass through, booleans become 1/0, numeric strings are parsed.
/// Everything else is missing.
pub fn coerce_channel_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}
