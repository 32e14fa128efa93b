//! Stream-to-series reconstruction engine for LoEco
//!
//! Turns irregular, at-least-once telemetry into regular, de-noised,
//! append-only time series per device.
//!
//! Key constraints:
//! - Replaying a batch never duplicates or rewrites stored history
//! - Grid arithmetic uses elapsed UTC time only
//! - Each channel is filtered independently, state resets every run
//!
//! ```no_run
//! use std::io::BufReader;
//! use loeco_core::{Pipeline, PipelineConfig};
//! use loeco_core::store::{merge_append, MemoryStore, StoreScope};
//! use loeco_core::stream::read_observations;
//!
//! let body = std::fs::File::open("uplinks.sse").unwrap();
//! let (observations, _) = read_observations(BufReader::new(body)).unwrap();
//!
//! let output = Pipeline::new(PipelineConfig::default()).process(&observations).unwrap();
//! let mut store = MemoryStore::new();
//! merge_append(&mut store, &StoreScope::latest(), &output.table).unwrap();
//! ```

#![deny(unsafe_code)]

pub mod channels;
pub mod constants;
pub mod derive;
pub mod errors;
pub mod extract;
pub mod filters;
pub mod observation;
pub mod pipeline;
pub mod resample;
pub mod series;
pub mod store;
pub mod stream;
pub mod time;
pub mod traits;

// Public API
pub use channels::{ChannelClass, ChannelRules, KalmanPreset};
pub use errors::{PipelineError, PipelineResult};
pub use observation::{Channels, Observation};
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutput, PipelineStats};
pub use series::{ChannelSeries, DeviceGrid, SeriesRow, SeriesTable};
pub use time::{SystemClock, TimeSource, Timestamp};
pub use traits::ChannelFilter;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
