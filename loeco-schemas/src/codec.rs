//! Series table <-> Avro object container
//!
//! Each [`SeriesRow`] becomes one `series_row_v1` record. Timestamps are
//! stored as UTC microseconds, so sub-microsecond precision is dropped.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use apache_avro::{types::Value, Reader, Schema, Writer};
use chrono::DateTime;

use loeco_core::{SeriesRow, SeriesTable};

use crate::SchemaError;

/// Encode a table as an Avro object container file
pub fn encode_table(schema: &Schema, table: &SeriesTable) -> Result<Vec<u8>, SchemaError> {
    let mut writer = Writer::new(schema, Vec::new());
    for row in table.rows() {
        writer.append(row_to_value(row))?;
    }
    Ok(writer.into_inner()?)
}

/// Decode every record of an Avro object container file
pub fn decode_table<R: Read>(reader: R) -> Result<SeriesTable, SchemaError> {
    let reader = Reader::new(reader)?;
    let mut rows = Vec::new();
    for value in reader {
        rows.push(value_to_row(value?)?);
    }
    Ok(SeriesTable::from_rows(rows))
}

fn row_to_value(row: &SeriesRow) -> Value {
    let device_id = match &row.device_id {
        Some(id) => Value::Union(1, Box::new(Value::String(id.clone()))),
        None => Value::Union(0, Box::new(Value::Null)),
    };

    let tags: HashMap<String, Value> = row
        .tags
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();

    let values: HashMap<String, Value> = row
        .values
        .iter()
        .map(|(k, v)| {
            let value = match v {
                Some(x) => Value::Union(1, Box::new(Value::Double(*x))),
                None => Value::Union(0, Box::new(Value::Null)),
            };
            (k.clone(), value)
        })
        .collect();

    Value::Record(vec![
        ("timestamp".to_string(), Value::TimestampMicros(row.timestamp.timestamp_micros())),
        ("device_id".to_string(), device_id),
        ("tags".to_string(), Value::Map(tags)),
        ("values".to_string(), Value::Map(values)),
    ])
}

fn value_to_row(value: Value) -> Result<SeriesRow, SchemaError> {
    let fields = match value {
        Value::Record(fields) => fields,
        other => return Err(SchemaError::Decode(format!("expected record, got {other:?}"))),
    };

    let mut timestamp = None;
    let mut device_id = None;
    let mut tags = BTreeMap::new();
    let mut values = BTreeMap::new();

    for (name, field) in fields {
        match (name.as_str(), unwrap_union(field)) {
            ("timestamp", Value::TimestampMicros(us) | Value::Long(us)) => {
                timestamp = DateTime::from_timestamp_micros(us);
            }
            ("device_id", Value::String(id)) => device_id = Some(id),
            ("device_id", Value::Null) => {}
            ("tags", Value::Map(map)) => {
                for (k, v) in map {
                    if let Value::String(s) = unwrap_union(v) {
                        tags.insert(k, s);
                    }
                }
            }
            ("values", Value::Map(map)) => {
                for (k, v) in map {
                    let x = match unwrap_union(v) {
                        Value::Double(x) => Some(x),
                        Value::Float(x) => Some(f64::from(x)),
                        _ => None,
                    };
                    values.insert(k, x);
                }
            }
            (name, other) => {
                log::debug!("ignoring field {name}: {other:?}");
            }
        }
    }

    let timestamp = timestamp.ok_or_else(|| SchemaError::Decode("row without timestamp".into()))?;
    Ok(SeriesRow {
        timestamp,
        device_id,
        tags,
        values,
    })
}

fn unwrap_union(value: Value) -> Value {
    match value {
        Value::Union(_, inner) => *inner,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::series_row_v1;
    use chrono::{TimeZone, Utc};
    use std::io::Cursor;

    fn sample() -> SeriesTable {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        SeriesTable::from_rows(vec![
            SeriesRow::new(t0)
                .with_device("field-a")
                .with_value("TempC_SHT", Some(21.25))
                .with_value("Hum_SHT", None),
            SeriesRow::new(t0 + chrono::Duration::minutes(30))
                .with_tag("provider", "ecowitt")
                .with_value("pressure_hpa", Some(1013.2)),
        ])
    }

    #[test]
    fn table_survives_encoding() {
        let schema = series_row_v1().unwrap();
        let table = sample();
        let bytes = encode_table(&schema, &table).unwrap();
        let decoded = decode_table(Cursor::new(bytes)).unwrap();
        assert_eq!(decoded, table);
    }

    #[test]
    fn empty_table_is_a_valid_file() {
        let schema = series_row_v1().unwrap();
        let bytes = encode_table(&schema, &SeriesTable::new()).unwrap();
        assert!(!bytes.is_empty());
        assert!(decode_table(Cursor::new(bytes)).unwrap().is_empty());
    }

    #[test]
    fn garbage_is_rejected() {
        let err = decode_table(Cursor::new(b"not avro".to_vec())).unwrap_err();
        assert!(matches!(err, SchemaError::Avro(_)));
    }
}
