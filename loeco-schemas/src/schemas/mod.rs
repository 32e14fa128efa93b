//! LoEco Avro schemas
//!
//! Names carry the version (`series_row_v1`); new fields are appended with
//! defaults so older readers keep working.

use apache_avro::Schema;
use serde_json::json;

use crate::SchemaError;

/// Qualified name of the stored series row schema
pub const SERIES_ROW_V1: &str = "series_row_v1";

/// One reconstructed grid row
pub fn series_row_v1() -> Result<Schema, SchemaError> {
    let schema_json = json!({
        "namespace": "org.loeco.series.v1",
        "type": "record",
        "name": "SeriesRow",
        "doc": "Reconstructed or normalized observation row",
        "fields": [
            {
                "name": "timestamp",
                "type": {"type": "long", "logicalType": "timestamp-micros"},
                "doc": "Grid timestamp, microseconds since epoch (UTC)"
            },
            {
                "name": "device_id",
                "type": ["null", "string"],
                "default": null
            },
            {
                "name": "tags",
                "type": {"type": "map", "values": "string"},
                "default": {},
                "doc": "Text columns (provider, station, ...)"
            },
            {
                "name": "values",
                "type": {"type": "map", "values": ["null", "double"]},
                "default": {},
                "doc": "Numeric channels; null where the channel is missing"
            }
        ]
    });

    Schema::parse(&schema_json).map_err(|e| SchemaError::ParseError(e.to_string()))
}
