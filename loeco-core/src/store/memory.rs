//! In-memory series store for testing

use std::collections::BTreeMap;

use crate::errors::PipelineResult;
use crate::series::SeriesTable;

use super::{SeriesStore, StoreScope};

/// Series store backed by a map of scope key to table
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: BTreeMap<String, SeriesTable>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope keys with a stored table
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Stored table for `scope`
    pub fn table(&self, scope: &StoreScope) -> Option<&SeriesTable> {
        self.tables.get(&scope.key())
    }

    /// Number of successful writes
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl SeriesStore for MemoryStore {
    fn read(&self, scope: &StoreScope) -> PipelineResult<Option<SeriesTable>> {
        Ok(self.tables.get(&scope.key()).cloned())
    }

    fn write(&mut self, scope: &StoreScope, table: &SeriesTable) -> PipelineResult<()> {
        self.tables.insert(scope.key(), table.clone());
        self.writes += 1;
        Ok(())
    }
}
