//! LoEco universal observation schema
//!
//! Every provider maps its native field names onto one fixed column list so
//! downstream consumers never see provider-specific layouts. A normalized row
//! carries every numeric column, missing where the provider has no data.
//!
//! ```text
//! raw JSON object ──(SchemaMapping)──> canonical row
//!     "temp": 21.3                      temperature_c = 21.3
//!     "humidity": 55                    humidity_pct  = 55
//!                                       pm2_5_ugm3    = missing
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use loeco_core::observation::coerce_channel_value;
use loeco_core::{SeriesRow, Timestamp};

/// Version tag written into every normalized row
pub const SCHEMA_VERSION: &str = "1";

/// Row metadata columns. Text ones become tags, coordinates become values.
pub const METADATA_COLUMNS: &[&str] = &[
    "schema_version",
    "timestamp",
    "provider",
    "station",
    "latitude",
    "longitude",
    "sensor_type",
    "height_m",
];

/// Observation columns that hold text codes rather than numbers
pub const TEXT_OBSERVATION_COLUMNS: &[&str] = &["precipitation_type", "sensor_status"];

/// Every observation column, in storage order
pub const OBSERVATION_COLUMNS: &[&str] = &[
    // temperature & humidity
    "temperature_c",
    "humidity_pct",
    "dewpoint_c",
    "wet_bulb_temperature_c",
    "feels_like_c",
    "heat_index_c",
    "wind_chill_c",
    "thw_index_c",
    "thsw_index_c",
    "black_bulb_temperature_c",
    // pressure
    "pressure_hpa",
    "vapor_pressure_hpa",
    // wind
    "wind_speed_ms",
    "wind_gust_ms",
    "wind_dir_deg",
    "wind_speed_avg_10min_ms",
    "wind_dir_avg_10min_deg",
    // precipitation
    "rain_mm",
    "rain_rate_mmhr",
    "rain_daily_mm",
    "rain_event_mm",
    "precipitation_type",
    "precipitation_type_code",
    // solar & uv
    "solar_wm2",
    "solar_radiation_perceived_wm2",
    "uv_index",
    "lux",
    // visibility & evapotranspiration
    "visibility_m",
    "et_mm",
    "et_daily_mm",
    // indoor
    "temperature_indoor_c",
    "humidity_indoor_pct",
    "pressure_indoor_hpa",
    "co2_indoor_ppm",
    // extra temperatures
    "temperature_1_c",
    "temperature_2_c",
    "temperature_3_c",
    "temperature_4_c",
    "temperature_5_c",
    "water_temperature_c",
    // extra humidity
    "humidity_1_pct",
    "humidity_2_pct",
    "humidity_3_pct",
    "humidity_4_pct",
    "humidity_5_pct",
    // soil
    "soil_temperature_1_c",
    "soil_temperature_2_c",
    "soil_temperature_3_c",
    "soil_temperature_4_c",
    "soil_temperature_5_c",
    "soil_moisture_1_pct",
    "soil_moisture_2_pct",
    "soil_moisture_3_pct",
    "soil_moisture_4_pct",
    "soil_moisture_5_pct",
    "soil_ec_dsm",
    "soil_water_potential_kpa",
    "soil_salinity_ppt",
    // leaf wetness
    "leaf_wetness_1",
    "leaf_wetness_2",
    "leaf_wetness_3",
    "leaf_wetness_4",
    "leaf_wetness_5",
    // particulate matter
    "pm1_0_ugm3",
    "pm2_5_ugm3",
    "pm4_0_ugm3",
    "pm10_ugm3",
    // gases
    "co2_ppm",
    "co_ppm",
    "no2_ppb",
    "o3_ppb",
    "voc_index",
    "formaldehyde_mgm3",
    "aqi",
    // lightning
    "lightning_strike_count",
    "lightning_distance_km",
    // power & signal
    "battery_voltage_v",
    "battery_pct",
    "solar_panel_voltage_v",
    "signal_strength_dbm",
    "reception_quality_pct",
    // diagnostics
    "sensor_status",
    "uptime_seconds",
    "transmission_failures",
    // reserved
    "obs_future_01",
    "obs_future_02",
    "obs_future_03",
    "obs_future_04",
    "obs_future_05",
    "obs_future_06",
    "obs_future_07",
    "obs_future_08",
    "obs_future_09",
    "obs_future_10",
    "obs_future_11",
    "obs_future_12",
    "obs_future_13",
    "obs_future_14",
    "obs_future_15",
    "obs_future_16",
    "obs_future_17",
    "obs_future_18",
    "obs_future_19",
    "obs_future_20",
];

/// Full column list: metadata then observations
pub fn loeco_schema() -> impl Iterator<Item = &'static str> {
    METADATA_COLUMNS.iter().chain(OBSERVATION_COLUMNS).copied()
}

/// Canonical column -> native field name
///
/// Columns without an entry are looked up under their canonical name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaMapping {
    entries: Vec<(String, String)>,
}

impl SchemaMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(canonical, native)` pairs
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(c, n)| (c.to_string(), n.to_string()))
                .collect(),
        }
    }

    pub fn with(mut self, canonical: &str, native: &str) -> Self {
        self.entries.retain(|(c, _)| c != canonical);
        self.entries.push((canonical.to_string(), native.to_string()));
        self
    }

    /// Native name for `canonical`
    pub fn native<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|(c, _)| c == canonical)
            .map(|(_, n)| n.as_str())
            .unwrap_or(canonical)
    }
}

/// Station description attached to every normalized row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationMetadata {
    pub provider: String,
    pub station: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub sensor_type: Option<String>,
    #[serde(default)]
    pub height_m: Option<f64>,
    #[serde(default)]
    pub owner: Option<String>,
}

impl StationMetadata {
    pub fn new(provider: impl Into<String>, station: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            station: station.into(),
            ..Self::default()
        }
    }
}

/// Normalize one raw provider object into a canonical row.
///
/// Every numeric observation column is present in the result, `None` when
/// the mapped native field is absent or not numeric. Text columns are kept
/// as tags when the provider sends a string.
pub fn apply_schema(
    raw: &Map<String, Value>,
    mapping: &SchemaMapping,
    metadata: &StationMetadata,
    timestamp: Timestamp,
) -> SeriesRow {
    let mut row = SeriesRow::new(timestamp)
        .with_device(metadata.station.clone())
        .with_tag("schema_version", SCHEMA_VERSION)
        .with_tag("provider", metadata.provider.clone())
        .with_tag("station", metadata.station.clone())
        .with_value("latitude", metadata.latitude)
        .with_value("longitude", metadata.longitude)
        .with_value("height_m", metadata.height_m);

    if let Some(sensor_type) = &metadata.sensor_type {
        row = row.with_tag("sensor_type", sensor_type.clone());
    }
    if let Some(owner) = &metadata.owner {
        row = row.with_tag("owner", owner.clone());
    }

    for &column in OBSERVATION_COLUMNS {
        let raw_value = raw.get(mapping.native(column));
        if TEXT_OBSERVATION_COLUMNS.contains(&column) {
            if let Some(Value::String(text)) = raw_value {
                row = row.with_tag(column, text.clone());
            }
            continue;
        }
        row = row.with_value(column, raw_value.and_then(coerce_channel_value));
    }

    let unmapped = raw
        .keys()
        .filter(|k| !OBSERVATION_COLUMNS.iter().any(|c| mapping.native(c) == k.as_str()))
        .count();
    if unmapped > 0 {
        log::debug!("{}: {} raw fields outside the universal schema", metadata.station, unmapped);
    }

    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn ts() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 4, 1, 6, 0, 0).unwrap()
    }

    #[test]
    fn column_list_shape() {
        let columns: Vec<_> = loeco_schema().collect();
        assert_eq!(columns.first(), Some(&"schema_version"));
        assert_eq!(columns.last(), Some(&"obs_future_20"));
        let unique: std::collections::BTreeSet<_> = columns.iter().collect();
        assert_eq!(unique.len(), columns.len());
    }

    #[test]
    fn every_numeric_column_is_present() {
        let raw = json!({"temp": 21.5, "humidity": "55", "ignored": 1});
        let mapping = SchemaMapping::from_pairs([("temperature_c", "temp"), ("humidity_pct", "humidity")]);
        let meta = StationMetadata::new("ecowitt", "roof");

        let row = apply_schema(raw.as_object().unwrap(), &mapping, &meta, ts());

        assert_eq!(row.values["temperature_c"], Some(21.5));
        assert_eq!(row.values["humidity_pct"], Some(55.0));
        assert_eq!(row.values["pm2_5_ugm3"], None);
        let numeric = OBSERVATION_COLUMNS.len() - TEXT_OBSERVATION_COLUMNS.len();
        // plus latitude, longitude, height_m
        assert_eq!(row.values.len(), numeric + 3);
        assert_eq!(row.tags["provider"], "ecowitt");
        assert_eq!(row.tags["schema_version"], SCHEMA_VERSION);
        assert_eq!(row.device_id.as_deref(), Some("roof"));
    }

    #[test]
    fn canonical_names_need_no_mapping() {
        let raw = json!({"pressure_hpa": 1001.0, "precipitation_type": "rain"});
        let meta = StationMetadata {
            latitude: Some(59.3),
            sensor_type: Some("WS90".into()),
            ..StationMetadata::new("ecowitt", "mast")
        };
        let row = apply_schema(raw.as_object().unwrap(), &SchemaMapping::new(), &meta, ts());

        assert_eq!(row.values["pressure_hpa"], Some(1001.0));
        assert_eq!(row.values["latitude"], Some(59.3));
        assert_eq!(row.tags["precipitation_type"], "rain");
        assert_eq!(row.tags["sensor_type"], "WS90");
        assert!(!row.values.contains_key("precipitation_type"));
    }

    #[test]
    fn later_mapping_entries_win() {
        let mapping = SchemaMapping::new().with("rain_mm", "rain").with("rain_mm", "rainfall");
        assert_eq!(mapping.native("rain_mm"), "rainfall");
        assert_eq!(mapping.native("lux"), "lux");
    }
}
