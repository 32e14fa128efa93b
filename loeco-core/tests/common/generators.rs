//! Synthetic telemetry
//!
//! Produces observations shaped like the field devices: a dry-bulb
//! temperature with small sensor noise, humidity, battery voltage and the
//! uplink frame counter. Everything is seeded, so runs are reproducible.

use chrono::Duration;
use serde_json::json;

use loeco_core::{Observation, Timestamp};

use super::harness::TestRng;

/// Baseline values for one simulated device
#[derive(Debug, Clone, Copy)]
pub struct DeviceProfile {
    pub temp_c: f64,
    pub temp_noise: f64,
    pub humidity_pct: f64,
    pub battery_v: f64,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            temp_c: 20.0,
            temp_noise: 0.3,
            humidity_pct: 60.0,
            battery_v: 3.3,
        }
    }
}

/// Seeded telemetry generator
pub struct TelemetryGenerator {
    rng: TestRng,
    start: Timestamp,
}

impl TelemetryGenerator {
    pub fn new(seed: u32, start: Timestamp) -> Self {
        Self {
            rng: TestRng::new(seed),
            start,
        }
    }

    /// One observation every `step_minutes` over `[from_minute, to_minute)`
    pub fn device_series(
        &mut self,
        device_id: &str,
        profile: DeviceProfile,
        from_minute: i64,
        to_minute: i64,
        step_minutes: i64,
    ) -> Vec<Observation> {
        let mut observations = Vec::new();
        let mut minute = from_minute;
        while minute < to_minute {
            let noise = self.rng.gen_range(-profile.temp_noise, profile.temp_noise);
            let hum_noise = self.rng.gen_range(-1.0, 1.0);
            observations.push(
                Observation::new(device_id, self.start + Duration::minutes(minute))
                    .with_channel("f_cnt", Some((minute / step_minutes) as f64))
                    .with_channel("TempC_SHT", Some(profile.temp_c + noise))
                    .with_channel("Hum_SHT", Some(profile.humidity_pct + hum_noise))
                    .with_channel("BatV", Some(profile.battery_v)),
            );
            minute += step_minutes;
        }
        observations
    }
}

/// Replace one channel value of the observation at `at`
pub fn inject(observations: &mut [Observation], at: Timestamp, channel: &str, value: f64) {
    for obs in observations.iter_mut().filter(|o| o.observed_at == at) {
        obs.channels.insert(channel.to_string(), Some(value));
    }
}

/// Encode an observation as an uplink payload
pub fn uplink_json(obs: &Observation) -> String {
    let decoded: serde_json::Map<String, serde_json::Value> = obs
        .channels
        .iter()
        .filter(|(name, _)| name.as_str() != "f_cnt")
        .map(|(name, value)| (name.clone(), json!(value)))
        .collect();

    json!({
        "result": {
            "end_device_ids": {"device_id": obs.device_id},
            "received_at": obs.observed_at.to_rfc3339(),
            "uplink_message": {
                "f_cnt": obs.channels.get("f_cnt").copied().flatten(),
                "decoded_payload": decoded,
            }
        }
    })
    .to_string()
}

/// SSE body carrying the observations, with keep-alives sprinkled in
pub fn sse_body(observations: &[Observation]) -> String {
    let mut body = String::from(": connected\n\n");
    for (i, obs) in observations.iter().enumerate() {
        body.push_str("data: ");
        body.push_str(&uplink_json(obs));
        body.push_str("\n\n");
        if i % 10 == 9 {
            body.push_str(": keep-alive\n\n\n");
        }
    }
    body
}
