//! Record extraction from decoded uplink payloads
//!
//! One message in, zero or one [`Observation`] out. Every failure mode here
//! (bad JSON, missing device, unparseable time) is the malformed-message
//! class: the caller counts and drops it, the run continues.
//!
//! ## Payload Shape
//!
//! ```json
//! {"result": {
//!     "end_device_ids": {"device_id": "field-1"},
//!     "received_at": "2026-01-05T10:04:12.345678901Z",
//!     "uplink_message": {"f_cnt": 812, "decoded_payload": {"TempC_SHT": 21.4}}
//! }}
//! ```
//!
//! The `result` wrapper is optional.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::observation::{coerce_channel_value, Observation};
use crate::time::Timestamp;

/// Uplink frame counter, kept as a channel for loss diagnostics
pub const FRAME_COUNTER_CHANNEL: &str = "f_cnt";

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an upstream timestamp leniently.
///
/// Accepts RFC 3339 with any fractional precision and offset (normalized to
/// UTC), or a naive `YYYY-MM-DD[T ]HH:MM:SS[.f]` taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Extract an observation from one decoded payload
pub fn extract(payload: &Value) -> Option<Observation> {
    let message = match payload.get("result") {
        Some(inner @ Value::Object(_)) => inner,
        _ => payload,
    };

    let uplink = message.get("uplink_message")?.as_object()?;
    if uplink.is_empty() {
        return None;
    }

    let observed_at = message
        .get("received_at")
        .and_then(Value::as_str)
        .and_then(parse_timestamp)?;

    let device_id = message
        .get("end_device_ids")
        .and_then(|ids| ids.get("device_id"))
        .and_then(Value::as_str)?;

    let mut obs = Observation::new(device_id, observed_at);

    if let Some(f_cnt) = uplink.get(FRAME_COUNTER_CHANNEL) {
        obs.channels
            .insert(FRAME_COUNTER_CHANNEL.to_string(), coerce_channel_value(f_cnt));
    }

    if let Some(Value::Object(decoded)) = uplink.get("decoded_payload") {
        for (name, value) in decoded {
            obs.channels.insert(name.clone(), coerce_channel_value(value));
        }
    }

    Some(obs)
}

/// Decode a raw message and extract; bad JSON yields `None`
pub fn extract_message(raw: &str) -> Option<Observation> {
    match serde_json::from_str::<Value>(raw) {
        Ok(payload) => extract(&payload),
        Err(e) => {
            log::debug!("dropping undecodable message: {}", e);
            None
        }
    }
}
