//! Multi-source runner
//!
//! Runs every enabled source on its own scoped thread. Sources share
//! nothing but the data directory, and each writes only beneath its own
//! `<type>__<name>/` prefix, so one failing source cannot corrupt another.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use loeco_core::store::{scopes_for, write_scopes, SeriesStore, StoreScope};
use loeco_core::{TimeSource, Timestamp};
use loeco_schemas::AvroFileStore;

use crate::config::{ProviderEntry, SourceConfig, StationsConfig};
use crate::ecowitt::EcowittProvider;
use crate::http::HttpConfig;
use crate::ttn::TtnProvider;
use crate::{ConnectorError, Provider};

/// A ready-to-run source
pub enum Source {
    Ttn(TtnProvider),
    Ecowitt(EcowittProvider),
}

impl Source {
    /// Build the source described by `entry`
    pub fn from_entry(
        entry: &ProviderEntry,
        http: &HttpConfig,
        clock: Arc<dyn TimeSource + Send + Sync>,
    ) -> Result<Self, ConnectorError> {
        Ok(match &entry.source {
            SourceConfig::Ttn(config) => Self::Ttn(TtnProvider::new(&entry.name, config.clone(), http.clone())?),
            SourceConfig::Ecowitt(config) => {
                Self::Ecowitt(EcowittProvider::new(&entry.name, config.clone(), http.clone(), clock)?)
            }
        })
    }

    /// Fetch, normalize and merge into `store`; returns rows written
    pub fn run<S: SeriesStore + ?Sized>(&self, store: &mut S, now: Timestamp) -> Result<usize, ConnectorError> {
        match self {
            Self::Ttn(p) => run_provider(p, store, "ttn", p.name(), now),
            Self::Ecowitt(p) => run_provider(p, store, "ecowitt", p.name(), now),
        }
    }
}

/// Fetch, normalize and merge one provider under `<source_type>__<name>`
pub fn run_provider<P: Provider + ?Sized, S: SeriesStore + ?Sized>(
    provider: &P,
    store: &mut S,
    source_type: &str,
    name: &str,
    now: Timestamp,
) -> Result<usize, ConnectorError> {
    log::info!("{}__{}: fetching", source_type, name);
    let raw = provider.fetch()?;
    let table = provider.normalize(raw)?;

    let scopes: Vec<StoreScope> = scopes_for(&table, now)
        .into_iter()
        .map(|scope| scope.with_source(source_type, name))
        .collect();
    let report = write_scopes(store, &scopes, &table);

    if !report.is_success() {
        return Err(ConnectorError::Store {
            failed: report.failed.len(),
            total: scopes.len(),
        });
    }
    log::info!(
        "{}__{}: {} rows across {} scopes",
        source_type,
        name,
        report.rows_written(),
        scopes.len()
    );
    Ok(report.rows_written())
}

/// Outcome of one source
#[derive(Debug)]
pub struct SourceResult {
    pub source_type: String,
    pub name: String,
    /// Rows written, or why the source failed
    pub result: Result<usize, ConnectorError>,
}

/// Outcome of a whole run
#[derive(Debug, Default)]
pub struct RunReport {
    pub results: Vec<SourceResult>,
}

impl RunReport {
    pub fn successes(&self) -> usize {
        self.results.iter().filter(|r| r.result.is_ok()).count()
    }

    pub fn failures(&self) -> usize {
        self.results.len() - self.successes()
    }

    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }

    /// `n successful, m failed`
    pub fn summary(&self) -> String {
        format!("{} successful, {} failed", self.successes(), self.failures())
    }
}

struct Slot {
    source_type: String,
    name: String,
    source: Result<Source, ConnectorError>,
}

/// Runs configured sources into an Avro store under `data_dir`
pub struct Runner {
    data_dir: PathBuf,
    clock: Arc<dyn TimeSource + Send + Sync>,
    slots: Vec<Slot>,
}

impl Runner {
    pub fn new(data_dir: impl Into<PathBuf>, clock: Arc<dyn TimeSource + Send + Sync>) -> Self {
        Self {
            data_dir: data_dir.into(),
            clock,
            slots: Vec::new(),
        }
    }

    /// Every enabled entry of `config`, or only the one named `only`.
    ///
    /// An entry that cannot be built is kept and reported as failed.
    pub fn from_config(
        config: &StationsConfig,
        data_dir: impl Into<PathBuf>,
        only: Option<&str>,
        clock: Arc<dyn TimeSource + Send + Sync>,
    ) -> Self {
        Self::from_config_with_http(config, data_dir, only, clock, &HttpConfig::default())
    }

    pub fn from_config_with_http(
        config: &StationsConfig,
        data_dir: impl Into<PathBuf>,
        only: Option<&str>,
        clock: Arc<dyn TimeSource + Send + Sync>,
        http: &HttpConfig,
    ) -> Self {
        let mut runner = Self::new(data_dir, clock);
        for entry in config.enabled().filter(|e| only.map_or(true, |name| e.name == name)) {
            let source = Source::from_entry(entry, http, Arc::clone(&runner.clock));
            runner.slots.push(Slot {
                source_type: entry.source_type().to_string(),
                name: entry.name.clone(),
                source,
            });
        }
        runner
    }

    pub fn with_source(mut self, source: Source) -> Self {
        let (source_type, name) = match &source {
            Source::Ttn(p) => ("ttn", p.name().to_string()),
            Source::Ecowitt(p) => ("ecowitt", p.name().to_string()),
        };
        self.slots.push(Slot {
            source_type: source_type.to_string(),
            name,
            source: Ok(source),
        });
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Run every source concurrently and collect the outcomes in order
    pub fn run_all(self) -> RunReport {
        let now = self.clock.now();
        let data_dir = self.data_dir.as_path();

        let results = thread::scope(|scope| {
            let handles: Vec<_> = self
                .slots
                .into_iter()
                .map(|slot| {
                    let labels = (slot.source_type.clone(), slot.name.clone());
                    let handle = scope.spawn(move || run_slot(slot.source, data_dir, now));
                    (labels, handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|((source_type, name), handle)| {
                    let result = handle
                        .join()
                        .unwrap_or_else(|_| Err(ConnectorError::Upstream("source thread panicked".into())));
                    match &result {
                        Ok(rows) => log::info!("{}__{}: ok, {} rows", source_type, name, rows),
                        Err(e) => log::error!("{}__{}: {}", source_type, name, e),
                    }
                    SourceResult {
                        source_type,
                        name,
                        result,
                    }
                })
                .collect()
        });

        let report = RunReport { results };
        log::info!("Summary: {}", report.summary());
        report
    }
}

fn run_slot(source: Result<Source, ConnectorError>, data_dir: &Path, now: Timestamp) -> Result<usize, ConnectorError> {
    let source = source?;
    let mut store = AvroFileStore::new(data_dir)?;
    source.run(&mut store, now)
}
