//! Avro file-backed series store
//!
//! Each scope lives in `<root>/<scope key>.avro`, e.g.
//! `data/ttn__campus/weather_data_2026_W02.avro`. Writes go to a temporary
//! file in the same directory and are renamed over the target, so readers
//! see either the old table or the new one.

use std::fs::{self, File};
use std::io::{BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use apache_avro::Schema;
use tempfile::NamedTempFile;

use loeco_core::store::{SeriesStore, StoreScope};
use loeco_core::{PipelineError, PipelineResult, SeriesTable};

use crate::codec::{decode_table, encode_table};
use crate::registry::SchemaRegistry;
use crate::SchemaError;

/// Series store writing one Avro container file per scope
#[derive(Debug, Clone)]
pub struct AvroFileStore {
    root: PathBuf,
    schema: Schema,
}

impl AvroFileStore {
    /// Store rooted at `root`, writing the latest `series_row` schema
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, SchemaError> {
        let schema = SchemaRegistry::with_defaults()?.get_latest("series_row")?;
        Ok(Self {
            root: root.into(),
            schema,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `scope`
    pub fn path_for(&self, scope: &StoreScope) -> PathBuf {
        self.root.join(format!("{}.avro", scope.key()))
    }
}

impl SeriesStore for AvroFileStore {
    fn read(&self, scope: &StoreScope) -> PipelineResult<Option<SeriesTable>> {
        let path = self.path_for(scope);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let table = decode_table(BufReader::new(file)).map_err(|e| PipelineError::store(scope.key(), e))?;
        log::debug!("read {} rows from {}", table.len(), path.display());
        Ok(Some(table))
    }

    fn write(&mut self, scope: &StoreScope, table: &SeriesTable) -> PipelineResult<()> {
        let path = self.path_for(scope);
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;

        let bytes = encode_table(&self.schema, table).map_err(|e| PipelineError::store(scope.key(), e))?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        log::debug!("wrote {} rows to {}", table.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use loeco_core::SeriesRow;

    #[test]
    fn missing_scope_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = AvroFileStore::new(dir.path()).unwrap();
        assert!(store.read(&StoreScope::latest()).unwrap().is_none());
    }

    #[test]
    fn write_creates_source_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AvroFileStore::new(dir.path()).unwrap();
        let scope = StoreScope::latest().with_source("ttn", "campus");
        let ts = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let table = SeriesTable::from_rows(vec![SeriesRow::new(ts).with_value("BatV", Some(3.3))]);

        store.write(&scope, &table).unwrap();

        assert!(dir.path().join("ttn__campus/latest.avro").is_file());
        assert_eq!(store.read(&scope).unwrap(), Some(table));
    }

    #[test]
    fn corrupt_file_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = AvroFileStore::new(dir.path()).unwrap();
        fs::write(dir.path().join("latest.avro"), b"truncated").unwrap();

        let err = store.read(&StoreScope::latest()).unwrap_err();
        assert!(matches!(err, PipelineError::Store { .. }));
    }
}
