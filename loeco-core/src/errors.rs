//! Error Types for the Reconstruction Pipeline
//!
//! ## Error Categories
//!
//! Failures fall into four classes, and only one of them is ever surfaced as
//! an `Err`:
//!
//! ### Transport / storage failures
//! - `Io`: the event stream or the persisted store could not be read/written
//! - `Store`: a store backend rejected a table (codec, schema mismatch)
//!
//! These are fatal for the current source's run and propagate to the caller.
//!
//! ### Malformed messages
//! Bad JSON, missing device ids, unparseable timestamps. These never become
//! errors: the extractor returns `None` and the message is counted and dropped.
//!
//! ### Empty results
//! No observations, or nothing newer than the stored series. Reported through
//! [`crate::store::MergeOutcome::NoNewRows`], not as an error.
//!
//! ### Numerical instability
//! Kalman divergence falls back to the raw channel and is logged as a warning.
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use loeco_core::{PipelineError, store::{MemoryStore, SeriesStore, StoreScope}};
//!
//! fn last_seen(store: &MemoryStore, scope: &StoreScope) -> String {
//!     match store.max_timestamp(scope) {
//!         Ok(Some(ts)) => ts.to_rfc3339(),
//!         Ok(None) => "never".into(),
//!         Err(PipelineError::Io(e)) => format!("store unreadable: {e}"),
//!         Err(e) => format!("store rejected: {e}"),
//!     }
//! }
//! ```

use thiserror::Error;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that abort a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Reading the event stream or touching the store failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A store backend could not encode or decode a table
    #[error("Store error for scope '{scope}': {reason}")]
    Store {
        /// Scope key the operation targeted
        scope: String,
        /// Backend-specific reason
        reason: String,
    },

    /// A configuration value makes the pipeline meaningless (e.g. zero grid interval)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

impl PipelineError {
    /// Build a store error for `scope`
    pub fn store(scope: impl Into<String>, reason: impl ToString) -> Self {
        Self::Store {
            scope: scope.into(),
            reason: reason.to_string(),
        }
    }
}
