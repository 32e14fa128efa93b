//! Station configuration
//!
//! ```json
//! {
//!   "providers": [
//!     {"type": "ttn", "name": "campus", "config": {
//!         "token": "${TTN_TOKEN}", "application_id": "loeco-campus"}},
//!     {"type": "ecowitt", "name": "roof", "enabled": false, "config": {
//!         "application_key": "${ECOWITT_APP_KEY}", "api_key": "${ECOWITT_API_KEY}",
//!         "mac": "AA:BB:CC:DD:EE:FF", "latitude": 59.33}}
//!   ]
//! }
//! ```
//!
//! `${VAR}` placeholders inside string values are replaced from the
//! environment; unknown variables are left as written.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use loeco_core::PipelineConfig;
use loeco_schemas::StationMetadata;

use crate::ConnectorError;

/// Default location of the stations file
pub const DEFAULT_CONFIG_PATH: &str = "config/stations.json";

/// Default TTN storage lookback window
pub const DEFAULT_TTN_LOOKBACK: &str = "168h";

/// Default TTN cluster
pub const DEFAULT_TTN_BASE_URL: &str = "https://eu1.cloud.thethings.network";

/// Default Ecowitt API host
pub const DEFAULT_ECOWITT_BASE_URL: &str = "https://api.ecowitt.net";

/// Every configured source
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationsConfig {
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
}

impl StationsConfig {
    /// Load and substitute `${VAR}` from the process environment
    pub fn load(path: &Path) -> Result<Self, ConnectorError> {
        let text = fs::read_to_string(path).map_err(|e| {
            ConnectorError::Config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        Self::parse(&text, |name| std::env::var(name).ok())
    }

    /// Parse `text`, resolving placeholders with `lookup`
    pub fn parse(text: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConnectorError> {
        let mut value: Value = serde_json::from_str(text)?;
        substitute_in_value(&mut value, &lookup);
        Ok(serde_json::from_value(value)?)
    }

    /// Entries with `enabled: true`
    pub fn enabled(&self) -> impl Iterator<Item = &ProviderEntry> {
        self.providers.iter().filter(|p| p.enabled)
    }
}

/// One configured source
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawEntry")]
pub struct ProviderEntry {
    pub name: String,
    pub enabled: bool,
    pub source: SourceConfig,
}

impl ProviderEntry {
    /// `ttn`, `ecowitt`
    pub fn source_type(&self) -> &'static str {
        self.source.source_type()
    }
}

/// Source-specific settings
#[derive(Debug, Clone)]
pub enum SourceConfig {
    Ttn(TtnConfig),
    Ecowitt(EcowittConfig),
}

impl SourceConfig {
    pub fn source_type(&self) -> &'static str {
        match self {
            Self::Ttn(_) => "ttn",
            Self::Ecowitt(_) => "ecowitt",
        }
    }
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(default)]
    config: Value,
}

fn enabled_by_default() -> bool {
    true
}

impl TryFrom<RawEntry> for ProviderEntry {
    type Error = String;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        let invalid = |e: serde_json::Error| format!("provider '{}': {}", raw.name, e);
        let source = match raw.kind.as_str() {
            "ttn" => SourceConfig::Ttn(serde_json::from_value(raw.config.clone()).map_err(invalid)?),
            "ecowitt" => SourceConfig::Ecowitt(serde_json::from_value(raw.config.clone()).map_err(invalid)?),
            other => return Err(format!("provider '{}': unknown type '{}'", raw.name, other)),
        };
        Ok(Self {
            name: raw.name,
            enabled: raw.enabled,
            source,
        })
    }
}

/// The Things Network storage integration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TtnConfig {
    pub token: String,
    pub application_id: String,
    #[serde(default = "default_ttn_lookback")]
    pub lookback: String,
    #[serde(default = "default_ttn_base_url")]
    pub base_url: String,
    /// Reconstruction tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

fn default_ttn_lookback() -> String {
    DEFAULT_TTN_LOOKBACK.to_string()
}

fn default_ttn_base_url() -> String {
    DEFAULT_TTN_BASE_URL.to_string()
}

/// Ecowitt cloud real-time API
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EcowittConfig {
    pub application_key: String,
    pub api_key: String,
    pub mac: String,
    #[serde(default = "default_ecowitt_base_url")]
    pub base_url: String,
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

impl EcowittConfig {
    /// Metadata attached to every row of station `name`
    pub fn metadata(&self, name: &str) -> StationMetadata {
        StationMetadata {
            latitude: self.latitude,
            longitude: self.longitude,
            sensor_type: self.sensor_type.clone(),
            height_m: self.height_m,
            owner: self.owner.clone(),
            ..StationMetadata::new("ecowitt", name)
        }
    }
}

fn default_ecowitt_base_url() -> String {
    DEFAULT_ECOWITT_BASE_URL.to_string()
}

/// Replace `${NAME}` placeholders in `text`
pub fn substitute_env(text: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let resolved = after.find('}').and_then(|end| {
            let name = &after[..end];
            let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            valid.then(|| lookup(name)).flatten().map(|v| (v, end))
        });
        match resolved {
            Some((value, end)) => {
                out.push_str(&value);
                rest = &after[end + 1..];
            }
            None => {
                out.push_str("${");
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn substitute_in_value(value: &mut Value, lookup: &impl Fn(&str) -> Option<String>) {
    match value {
        Value::String(s) if s.contains("${") => *s = substitute_env(s, lookup),
        Value::Array(items) => items.iter_mut().for_each(|v| substitute_in_value(v, lookup)),
        Value::Object(map) => map.values_mut().for_each(|v| substitute_in_value(v, lookup)),
        _ => {}
    }
}
