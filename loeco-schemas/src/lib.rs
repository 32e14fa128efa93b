//! Avro storage and the universal observation schema for LoEco
//!
//! ## Overview
//!
//! Reconstructed series are persisted as Avro object container files, one per
//! store scope. The file carries its schema, so any Avro reader can open the
//! data without this crate.
//!
//! ## Schema Evolution Strategy
//!
//! 1. **Always Append**: new fields get defaults, nothing is removed
//! 2. **Version in Name**: `series_row_v1`, `series_row_v2`
//! 3. **Read with the writer's schema**: container files embed it
//!
//! ## Row Layout
//!
//! ```json
//! {
//!   "type": "record",
//!   "name": "SeriesRow",
//!   "fields": [
//!     {"name": "timestamp", "type": {"type": "long", "logicalType": "timestamp-micros"}},
//!     {"name": "device_id", "type": ["null", "string"]},
//!     {"name": "tags", "type": {"type": "map", "values": "string"}},
//!     {"name": "values", "type": {"type": "map", "values": ["null", "double"]}}
//!   ]
//! }
//! ```
//!
//! Channel names stay as the map keys, so devices reporting new channels
//! need no schema change.
//!
//! ## Usage Example
//!
//! ```no_run
//! use loeco_core::store::{merge_append, StoreScope};
//! use loeco_core::SeriesTable;
//! use loeco_schemas::AvroFileStore;
//!
//! let mut store = AvroFileStore::new("data")?;
//! let scope = StoreScope::latest().with_source("ttn", "campus");
//! merge_append(&mut store, &scope, &SeriesTable::new())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
pub mod registry;
pub mod schemas;
pub mod store;
pub mod universal;

pub use codec::{decode_table, encode_table};
pub use registry::SchemaRegistry;
pub use store::AvroFileStore;
pub use universal::{apply_schema, SchemaMapping, StationMetadata};

/// Schema-related errors
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Failed to parse schema: {0}")]
    ParseError(String),

    #[error("Schema not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Avro error: {0}")]
    Avro(#[from] apache_avro::Error),

    #[error("Malformed record: {0}")]
    Decode(String),

    #[error("Schema registry lock poisoned")]
    LockPoisoned,
}
