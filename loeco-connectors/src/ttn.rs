//! The Things Network storage integration
//!
//! Stored uplinks arrive as a server-sent event stream. Each event is one
//! uplink; the stream ends when the lookback window is exhausted. The read
//! timeout of the HTTP client bounds how long a silent stream can stall.

use std::io::BufReader;

use loeco_core::stream::read_observations;
use loeco_core::{Observation, Pipeline, SeriesTable};

use crate::config::TtnConfig;
use crate::http::{HttpClient, HttpConfig};
use crate::{ConnectorError, Provider};

/// TTN application source
pub struct TtnProvider {
    name: String,
    config: TtnConfig,
    client: HttpClient,
    pipeline: Pipeline,
}

impl TtnProvider {
    /// Source `name`; `http` is extended with the application's bearer token
    pub fn new(name: impl Into<String>, config: TtnConfig, http: HttpConfig) -> Result<Self, ConnectorError> {
        config.pipeline.validate()?;
        let client = HttpClient::new(http.bearer_token(config.token.clone()))?;
        let pipeline = Pipeline::new(config.pipeline.clone());
        Ok(Self {
            name: name.into(),
            config,
            client,
            pipeline,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage endpoint for the application's uplinks
    pub fn stream_url(&self) -> String {
        format!(
            "{}/api/v3/as/applications/{}/packages/storage/uplink_message",
            self.config.base_url.trim_end_matches('/'),
            self.config.application_id
        )
    }
}

impl Provider for TtnProvider {
    type Raw = Vec<Observation>;

    fn fetch(&self) -> Result<Self::Raw, ConnectorError> {
        let body = self.client.get_stream(
            &self.stream_url(),
            &[("last", self.config.lookback.as_str())],
            "text/event-stream",
        )?;

        let (observations, stats) = read_observations(BufReader::new(body))?;
        log::info!(
            "{}: {} uplinks, {} dropped, {} bytes",
            self.name,
            observations.len(),
            stats.dropped,
            stats.stream.bytes_read
        );
        Ok(observations)
    }

    fn normalize(&self, raw: Self::Raw) -> Result<SeriesTable, ConnectorError> {
        if raw.is_empty() {
            log::warn!("{}: no valid uplinks in the lookback window", self.name);
            return Ok(SeriesTable::new());
        }

        let output = self.pipeline.process(&raw)?;
        log::info!("{}: {:?}", self.name, output.stats);

        Ok(output
            .table
            .into_rows()
            .into_iter()
            .map(|row| row.with_tag("provider", "ttn").with_tag("station", self.name.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn config() -> TtnConfig {
        serde_json::from_value(serde_json::json!({
            "token": "NNSXS.test",
            "application_id": "loeco-campus",
            "base_url": "https://eu1.cloud.thethings.network/"
        }))
        .unwrap()
    }

    #[test]
    fn stream_url_layout() {
        let provider = TtnProvider::new("campus", config(), HttpConfig::new()).unwrap();
        assert_eq!(
            provider.stream_url(),
            "https://eu1.cloud.thethings.network/api/v3/as/applications/loeco-campus/packages/storage/uplink_message"
        );
    }

    #[test]
    fn normalize_tags_rows_with_the_source() {
        let provider = TtnProvider::new("campus", config(), HttpConfig::new()).unwrap();
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let raw: Vec<_> = (0..6)
            .map(|i| Observation::new("field-1", start + Duration::minutes(10 * i)).with_channel("BatV", Some(3.6)))
            .collect();

        let table = provider.normalize(raw).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.rows().iter().all(|r| r.tags["provider"] == "ttn" && r.tags["station"] == "campus"));
        assert!(provider.normalize(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn invalid_pipeline_config_is_rejected() {
        let mut bad = config();
        bad.pipeline.grid_interval_minutes = 0;
        assert!(matches!(
            TtnProvider::new("campus", bad, HttpConfig::new()),
            Err(ConnectorError::Pipeline(_))
        ));
    }
}
