//! Ecowitt cloud real-time API
//!
//! One request returns the station's current readings as nested
//! `data.<section>.<field>` objects with string values and units:
//!
//! ```json
//! {"code": 0, "time": "1767225600", "data": {
//!   "outdoor":  {"temperature": {"value": "68.2", "unit": "ºF"}},
//!   "pressure": {"relative":    {"value": "29.92", "unit": "inHg"}}}}
//! ```
//!
//! Readings are flattened to native names, converted to metric, then mapped
//! onto the universal schema. The row is stamped with the response `time`
//! (UNIX seconds), or the run clock when the API omits it.

use std::sync::Arc;

use chrono::DateTime;
use serde_json::{Map, Value};

use loeco_core::constants::physics::{fahrenheit_to_celsius, HPA_PER_INHG};
use loeco_core::{SeriesTable, TimeSource, Timestamp};
use loeco_schemas::{apply_schema, SchemaMapping};

use crate::config::EcowittConfig;
use crate::http::{HttpClient, HttpConfig};
use crate::{ConnectorError, Provider};

const REAL_TIME_PATH: &str = "/api/v3/device/real_time";

/// Canonical column -> flattened Ecowitt field
pub fn schema_mapping() -> SchemaMapping {
    SchemaMapping::from_pairs([
        ("temperature_c", "temp"),
        ("humidity_pct", "humidity"),
        ("pressure_hpa", "baromrelin"),
        ("dewpoint_c", "dewpoint"),
        ("feels_like_c", "feelslike"),
        ("battery_voltage_v", "battery"),
        ("signal_strength_dbm", "rssi"),
    ])
}

/// Ecowitt station source
pub struct EcowittProvider {
    name: String,
    config: EcowittConfig,
    client: HttpClient,
    clock: Arc<dyn TimeSource + Send + Sync>,
}

impl EcowittProvider {
    pub fn new(
        name: impl Into<String>,
        config: EcowittConfig,
        http: HttpConfig,
        clock: Arc<dyn TimeSource + Send + Sync>,
    ) -> Result<Self, ConnectorError> {
        Ok(Self {
            name: name.into(),
            config,
            client: HttpClient::new(http)?,
            clock,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn observed_at(&self, raw: &Value) -> Timestamp {
        let seconds = match raw.get("time") {
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            Some(Value::Number(n)) => n.as_i64(),
            _ => None,
        };
        seconds
            .and_then(|s| DateTime::from_timestamp(s, 0))
            .unwrap_or_else(|| self.clock.now())
    }
}

impl Provider for EcowittProvider {
    type Raw = Value;

    fn fetch(&self) -> Result<Self::Raw, ConnectorError> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), REAL_TIME_PATH);
        let raw = self.client.get_json(
            &url,
            &[
                ("application_key", self.config.application_key.as_str()),
                ("api_key", self.config.api_key.as_str()),
                ("mac", self.config.mac.as_str()),
                ("call_back", "all"),
            ],
        )?;

        match raw.get("code").and_then(Value::as_i64) {
            Some(0) | None => Ok(raw),
            Some(code) => {
                let msg = raw.get("msg").and_then(Value::as_str).unwrap_or("no message");
                Err(ConnectorError::Upstream(format!("ecowitt code {code}: {msg}")))
            }
        }
    }

    fn normalize(&self, raw: Self::Raw) -> Result<SeriesTable, ConnectorError> {
        let data = match raw.get("data") {
            Some(Value::Object(data)) if !data.is_empty() => data,
            _ => {
                log::warn!("{}: Ecowitt returned no data", self.name);
                return Ok(SeriesTable::new());
            }
        };

        let native = flatten_readings(data);
        log::debug!("{}: {} readings", self.name, native.len());

        let row = apply_schema(
            &native,
            &schema_mapping(),
            &self.config.metadata(&self.name),
            self.observed_at(&raw),
        );
        Ok(SeriesTable::from_rows(vec![row]))
    }
}

/// Pull the readings out of the nested sections, in metric units
fn flatten_readings(data: &Map<String, Value>) -> Map<String, Value> {
    // outdoor sensors when the station has them, else the console
    let climate = ["outdoor", "indoor"]
        .iter()
        .find_map(|s| data.get(*s).filter(|v| v.as_object().is_some_and(|o| !o.is_empty())));

    let mut native = Map::new();
    let mut put = |name: &str, value: Option<f64>| {
        if let Some(v) = value {
            native.insert(name.to_string(), Value::from(v));
        }
    };

    if let Some(section) = climate {
        put("temp", temperature(section, "temperature"));
        put("humidity", reading(section, "humidity").map(|(v, _)| v));
        put("dewpoint", temperature(section, "dew_point"));
        put("feelslike", temperature(section, "feels_like"));
    }

    if let Some(pressure) = data.get("pressure") {
        put(
            "baromrelin",
            reading(pressure, "relative").map(|(v, unit)| if unit.contains("hPa") { v } else { v * HPA_PER_INHG }),
        );
    }

    if let Some(battery) = data.get("battery") {
        put("battery", reading(battery, "temperature_sensor_ch1").map(|(v, _)| v));
    }

    native
}

/// `section.field.value` as a number, with its unit
fn reading<'a>(section: &'a Value, field: &str) -> Option<(f64, &'a str)> {
    let entry = section.get(field)?;
    let value = match entry.get("value")? {
        Value::String(s) => s.trim().parse().ok()?,
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    let unit = entry.get("unit").and_then(Value::as_str).unwrap_or("");
    Some((value, unit))
}

/// Temperature in Celsius; Fahrenheit unless the unit says otherwise
fn temperature(section: &Value, field: &str) -> Option<f64> {
    reading(section, field).map(|(v, unit)| {
        if unit.contains('C') || unit.contains('℃') {
            v
        } else {
            fahrenheit_to_celsius(v)
        }
    })
}
