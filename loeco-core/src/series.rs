//! Time-indexed tables
//!
//! Three shapes flow through the pipeline:
//! - [`ChannelSeries`]: one channel of one device, what the filters operate on
//! - [`DeviceGrid`]: one device's resampled grid, column-oriented
//! - [`SeriesTable`]: row-oriented table that gets merged into the store

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::observation::Channels;
use crate::time::Timestamp;

/// 1-D series of optional values indexed by time
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelSeries {
    pub index: Vec<Timestamp>,
    pub values: Vec<Option<f64>>,
}

impl ChannelSeries {
    /// Build from parallel index/value vectors (truncated to the shorter one)
    pub fn new(mut index: Vec<Timestamp>, mut values: Vec<Option<f64>>) -> Self {
        let len = index.len().min(values.len());
        index.truncate(len);
        values.truncate(len);
        Self { index, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of non-missing samples
    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Non-missing values in index order
    pub fn present_values(&self) -> Vec<f64> {
        self.values.iter().flatten().copied().collect()
    }

    /// Whether the index contains a repeated timestamp
    pub fn has_duplicate_index(&self) -> bool {
        let mut seen = std::collections::HashSet::with_capacity(self.index.len());
        !self.index.iter().all(|ts| seen.insert(*ts))
    }

    /// Copy keeping only the first occurrence of each timestamp
    pub fn dedup_first(&self) -> Self {
        let mut seen = std::collections::HashSet::with_capacity(self.index.len());
        let (index, values) = self
            .index
            .iter()
            .zip(&self.values)
            .filter(|(ts, _)| seen.insert(**ts))
            .map(|(ts, v)| (*ts, *v))
            .unzip();
        Self { index, values }
    }
}

/// One device's resampled grid, one column per channel
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceGrid {
    pub device_id: String,
    /// Strictly increasing grid timestamps
    pub index: Vec<Timestamp>,
    /// Channel columns, each the same length as `index`
    pub channels: BTreeMap<String, Vec<Option<f64>>>,
}

impl DeviceGrid {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Extract one channel as a series
    pub fn channel(&self, name: &str) -> Option<ChannelSeries> {
        self.channels
            .get(name)
            .map(|values| ChannelSeries::new(self.index.clone(), values.clone()))
    }

    /// Replace a channel column; the series must share the grid's index
    pub fn set_channel(&mut self, name: &str, series: ChannelSeries) {
        debug_assert_eq!(series.index, self.index);
        self.channels.insert(name.to_string(), series.values);
    }

    /// Flatten into store rows tagged with the device id
    pub fn into_rows(self) -> Vec<SeriesRow> {
        let DeviceGrid {
            device_id,
            index,
            channels,
        } = self;

        index
            .into_iter()
            .enumerate()
            .map(|(i, timestamp)| SeriesRow {
                timestamp,
                device_id: Some(device_id.clone()),
                tags: BTreeMap::new(),
                values: channels
                    .iter()
                    .map(|(name, column)| (name.clone(), column.get(i).copied().flatten()))
                    .collect(),
            })
            .collect()
    }
}

/// One persisted row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRow {
    pub timestamp: Timestamp,
    #[serde(default)]
    pub device_id: Option<String>,
    /// Text metadata (provider, station, ...)
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Numeric channels
    #[serde(default)]
    pub values: Channels,
}

impl SeriesRow {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            device_id: None,
            tags: BTreeMap::new(),
            values: Channels::new(),
        }
    }

    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn with_value(mut self, name: impl Into<String>, value: Option<f64>) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(name.into(), value.into());
        self
    }
}

/// Row-oriented, time-indexed table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeriesTable {
    rows: Vec<SeriesRow>,
}

impl SeriesTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<SeriesRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[SeriesRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<SeriesRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: SeriesRow) {
        self.rows.push(row);
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = SeriesRow>) {
        self.rows.extend(rows);
    }

    /// Latest timestamp in the table
    pub fn max_timestamp(&self) -> Option<Timestamp> {
        self.rows.iter().map(|r| r.timestamp).max()
    }

    /// Stable sort by timestamp; rows sharing a timestamp keep their order
    pub fn sort_by_time(&mut self) {
        self.rows.sort_by_key(|r| r.timestamp);
    }

    /// Rows strictly newer than `ts`
    pub fn newer_than(&self, ts: Timestamp) -> SeriesTable {
        Self::from_rows(
            self.rows
                .iter()
                .filter(|r| r.timestamp > ts)
                .cloned()
                .collect(),
        )
    }

    /// Split into per-device tables; rows without a device id are skipped
    pub fn by_device(&self) -> BTreeMap<String, SeriesTable> {
        let mut out: BTreeMap<String, SeriesTable> = BTreeMap::new();
        for row in &self.rows {
            if let Some(device) = &row.device_id {
                out.entry(device.clone()).or_default().push(row.clone());
            }
        }
        out
    }
}

impl FromIterator<SeriesRow> for SeriesTable {
    fn from_iter<I: IntoIterator<Item = SeriesRow>>(iter: I) -> Self {
        Self::from_rows(iter.into_iter().collect())
    }
}
