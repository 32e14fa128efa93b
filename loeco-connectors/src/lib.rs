//! Upstream sources for LoEco
//!
//! ## Overview
//!
//! Each configured station is a source with two steps:
//!
//! ```text
//! fetch      (transport)     → raw payload
//! normalize  (pure)          → SeriesTable
//! merge                      → <data>/<type>__<name>/<scope>.avro
//! ```
//!
//! ### TTN (The Things Network)
//!
//! - Storage integration, `text/event-stream` of stored uplinks
//! - Bearer token, `last=<lookback>` window (default `168h`)
//! - Full reconstruction pipeline: resample, outlier mask, Kalman smooth,
//!   gap fill, dew point
//! - Channels keep their device-native names
//!
//! ### Ecowitt
//!
//! - Cloud real-time API, one JSON snapshot per run
//! - Imperial units converted (°F → °C, inHg → hPa)
//! - Mapped onto the universal schema
//!
//! ## Failure Isolation
//!
//! The runner gives every source its own thread and scope prefix. A source
//! that fails (transport, bad payload, store) is reported and the others
//! carry on; the summary reads `n successful, m failed`.
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use loeco_connectors::{config::StationsConfig, runner::Runner};
//! use loeco_core::SystemClock;
//!
//! let config = StationsConfig::load(Path::new("config/stations.json"))?;
//! let report = Runner::from_config(&config, "data", None, Arc::new(SystemClock)).run_all();
//! println!("{}", report.summary());
//! # Ok::<(), loeco_connectors::ConnectorError>(())
//! ```

pub mod config;
pub mod ecowitt;
pub mod http;
pub mod runner;
pub mod ttn;

pub use config::{ProviderEntry, SourceConfig, StationsConfig};
pub use ecowitt::EcowittProvider;
pub use http::{HttpClient, HttpConfig, HttpError};
pub use runner::{RunReport, Runner, Source};
pub use ttn::TtnProvider;

use loeco_core::{PipelineError, SeriesTable};
use loeco_schemas::SchemaError;
use thiserror::Error;

/// Common connector errors
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// The stream broke after the response started
    #[error("Stream read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The upstream API answered but reported a failure
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("{failed} of {total} scopes failed to merge")]
    Store { failed: usize, total: usize },
}

/// A data source: fetch raw data, normalize it into series rows
pub trait Provider {
    /// What `fetch` hands to `normalize`
    type Raw;

    /// Talk to the upstream API
    fn fetch(&self) -> Result<Self::Raw, ConnectorError>;

    /// Turn the raw payload into rows ready for merging
    fn normalize(&self, raw: Self::Raw) -> Result<SeriesTable, ConnectorError>;
}
