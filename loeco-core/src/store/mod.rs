//! Append-only series storage
//!
//! ## Merge Rule
//!
//! A stored table only ever grows at its end:
//!
//! ```text
//! last_ts = max(stored.timestamp)
//! append  = batch rows with timestamp > last_ts
//! table   = stable_sort_by_time(stored ++ append)
//! ```
//!
//! Rows at or before `last_ts` are dropped even if they carry new values.
//! Replaying a batch is therefore a no-op, and history is never rewritten.
//!
//! ## Module Organization
//!
//! - `scope` - Scope naming (latest, monthly, weekly, per device)
//! - `memory` - In-memory store for tests
//!
//! File-backed stores live with the schema crate; anything implementing
//! [`SeriesStore`] works with [`merge_append`] and [`write_scopes`].

pub mod memory;
pub mod scope;

pub use memory::MemoryStore;
pub use scope::{scopes_for, ScopeKind, StoreScope};

use crate::errors::{PipelineError, PipelineResult};
use crate::series::SeriesTable;
use crate::time::Timestamp;

/// Durable table storage keyed by scope
pub trait SeriesStore {
    /// Stored table, `None` if the scope was never written
    fn read(&self, scope: &StoreScope) -> PipelineResult<Option<SeriesTable>>;

    /// Replace the scope's table. Implementations must be atomic: a failed
    /// write leaves the previous table readable.
    fn write(&mut self, scope: &StoreScope, table: &SeriesTable) -> PipelineResult<()>;

    /// Latest stored timestamp
    fn max_timestamp(&self, scope: &StoreScope) -> PipelineResult<Option<Timestamp>> {
        Ok(self.read(scope)?.and_then(|table| table.max_timestamp()))
    }
}

/// What a merge did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Scope did not exist; the batch became its table
    Created { rows: usize },
    /// Rows newer than the stored maximum were appended
    Appended { rows: usize },
    /// Nothing in the batch was newer (or the batch was empty)
    NoNewRows,
}

impl MergeOutcome {
    /// Rows written by this merge
    pub fn rows_written(&self) -> usize {
        match self {
            Self::Created { rows } | Self::Appended { rows } => *rows,
            Self::NoNewRows => 0,
        }
    }
}

/// Merge `batch` into `scope`, appending only strictly newer rows
pub fn merge_append<S: SeriesStore + ?Sized>(
    store: &mut S,
    scope: &StoreScope,
    batch: &SeriesTable,
) -> PipelineResult<MergeOutcome> {
    if batch.is_empty() {
        log::debug!("{}: empty batch", scope);
        return Ok(MergeOutcome::NoNewRows);
    }

    let (mut table, outcome) = match store.read(scope)? {
        Some(existing) => {
            let fresh = match existing.max_timestamp() {
                Some(last_ts) => batch.newer_than(last_ts),
                None => batch.clone(),
            };
            if fresh.is_empty() {
                log::info!("{}: no new rows to append", scope);
                return Ok(MergeOutcome::NoNewRows);
            }
            let rows = fresh.len();
            let mut table = existing;
            table.extend(fresh.into_rows());
            (table, MergeOutcome::Appended { rows })
        }
        None => (batch.clone(), MergeOutcome::Created { rows: batch.len() }),
    };

    table.sort_by_time();
    store.write(scope, &table)?;
    log::info!("{}: {:?}", scope, outcome);
    Ok(outcome)
}

/// Per-scope results of [`write_scopes`]
#[derive(Debug, Default)]
pub struct ScopeReport {
    /// Scopes merged successfully
    pub merged: Vec<(StoreScope, MergeOutcome)>,
    /// Scopes whose merge failed
    pub failed: Vec<(StoreScope, PipelineError)>,
}

impl ScopeReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total rows written across scopes
    pub fn rows_written(&self) -> usize {
        self.merged.iter().map(|(_, o)| o.rows_written()).sum()
    }
}

/// Merge `batch` into every scope; one scope failing does not stop the rest
pub fn write_scopes<S: SeriesStore + ?Sized>(
    store: &mut S,
    scopes: &[StoreScope],
    batch: &SeriesTable,
) -> ScopeReport {
    let mut report = ScopeReport::default();

    for scope in scopes {
        match merge_append(store, scope, &scope.select(batch)) {
            Ok(outcome) => report.merged.push((scope.clone(), outcome)),
            Err(e) => {
                log::error!("{}: merge failed: {}", scope, e);
                report.failed.push((scope.clone(), e));
            }
        }
    }

    report
}
