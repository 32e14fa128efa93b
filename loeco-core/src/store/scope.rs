//! Store scopes
//!
//! A scope names one logical series table. Every source writes the same
//! batch into several scopes:
//!
//! | Kind | Name | Rows |
//! |---|---|---|
//! | latest | `latest` | all |
//! | monthly | `weather_data_2026_01_January` | all |
//! | weekly | `weather_data_2026_W02` | all |
//! | device | `field_1` (anything but `[A-Za-z0-9_-]` → `_`) | that device only |
//!
//! Monthly and weekly names come from the run's clock, not from the data,
//! matching the on-disk layout consumers already read. A source prefix
//! `<type>__<name>` keeps sources from sharing tables.

use std::fmt;

use chrono::{Datelike, Month};

use crate::series::{SeriesRow, SeriesTable};
use crate::time::Timestamp;

/// What a scope holds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Rolling table of everything
    Latest,
    /// Calendar month of the run
    Monthly { year: i32, month: u32 },
    /// ISO week of the run
    Weekly { iso_year: i32, week: u32 },
    /// One device's rows
    Device(String),
}

/// Destination table for a merge
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreScope {
    source: Option<String>,
    kind: ScopeKind,
}

impl StoreScope {
    pub fn new(kind: ScopeKind) -> Self {
        Self { source: None, kind }
    }

    pub fn latest() -> Self {
        Self::new(ScopeKind::Latest)
    }

    /// Month containing `now`
    pub fn monthly(now: Timestamp) -> Self {
        Self::new(ScopeKind::Monthly {
            year: now.year(),
            month: now.month(),
        })
    }

    /// ISO week containing `now`
    pub fn weekly(now: Timestamp) -> Self {
        let week = now.iso_week();
        Self::new(ScopeKind::Weekly {
            iso_year: week.year(),
            week: week.week(),
        })
    }

    pub fn device(device_id: impl Into<String>) -> Self {
        Self::new(ScopeKind::Device(device_id.into()))
    }

    /// Place the scope under `<source_type>__<source_name>`
    pub fn with_source(mut self, source_type: &str, source_name: &str) -> Self {
        self.source = Some(format!("{}__{}", file_safe(source_type), file_safe(source_name)));
        self
    }

    pub fn kind(&self) -> &ScopeKind {
        &self.kind
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Table name without the source prefix
    pub fn name(&self) -> String {
        match &self.kind {
            ScopeKind::Latest => "latest".to_string(),
            ScopeKind::Monthly { year, month } => {
                format!("weather_data_{}_{:02}_{}", year, month, month_name(*month))
            }
            ScopeKind::Weekly { iso_year, week } => format!("weather_data_{}_W{:02}", iso_year, week),
            ScopeKind::Device(id) => file_safe(id),
        }
    }

    /// Full key, `<prefix>/<name>` or just `<name>`
    pub fn key(&self) -> String {
        match &self.source {
            Some(prefix) => format!("{}/{}", prefix, self.name()),
            None => self.name(),
        }
    }

    /// Whether `row` belongs in this scope
    pub fn accepts(&self, row: &SeriesRow) -> bool {
        match &self.kind {
            ScopeKind::Device(id) => row.device_id.as_deref() == Some(id.as_str()),
            _ => true,
        }
    }

    /// Rows of `batch` that belong in this scope
    pub fn select(&self, batch: &SeriesTable) -> SeriesTable {
        match self.kind {
            ScopeKind::Device(_) => batch.rows().iter().filter(|r| self.accepts(r)).cloned().collect(),
            _ => batch.clone(),
        }
    }
}

impl fmt::Display for StoreScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map_or("Unknown", |m| m.name())
}

/// Keep `[A-Za-z0-9_-]`, replace everything else with `_`
fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// Scopes a batch is written to: latest, monthly, weekly, then one per device
pub fn scopes_for(batch: &SeriesTable, now: Timestamp) -> Vec<StoreScope> {
    let mut scopes = vec![
        StoreScope::latest(),
        StoreScope::monthly(now),
        StoreScope::weekly(now),
    ];
    scopes.extend(batch.by_device().into_keys().map(StoreScope::device));
    scopes
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn calendar_scope_names() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(StoreScope::monthly(now).name(), "weather_data_2026_01_January");
        // Jan 1st 2026 is a Thursday, so it is in ISO week 1 of 2026
        assert_eq!(StoreScope::weekly(now).name(), "weather_data_2026_W01");

        let new_year_2027 = Utc.with_ymd_and_hms(2027, 1, 1, 12, 0, 0).unwrap();
        // Friday: still ISO week 53 of 2026
        assert_eq!(StoreScope::weekly(new_year_2027).name(), "weather_data_2026_W53");
    }

    #[test]
    fn source_prefix_and_device_names() {
        let scope = StoreScope::device("garden sensor 2").with_source("ttn", "campus");
        assert_eq!(scope.name(), "garden_sensor_2");
        assert_eq!(scope.key(), "ttn__campus/garden_sensor_2");
        assert_eq!(StoreScope::latest().to_string(), "latest");
    }

    #[test]
    fn names_cannot_escape_the_store_root() {
        assert_eq!(StoreScope::device("../../etc/passwd").name(), "______etc_passwd");
        assert_eq!(StoreScope::device("eui-70b3d5/1.2").name(), "eui-70b3d5_1_2");
        let scope = StoreScope::device("node\\x").with_source("ttn", "../up");
        assert_eq!(scope.key(), "ttn_____up/node_x");
        assert!(!scope.key().contains(".."));
    }

    #[test]
    fn every_month_has_a_name() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(12), "December");
        assert_eq!(month_name(0), "Unknown");
        assert_eq!(month_name(13), "Unknown");
    }

    #[test]
    fn device_scope_selects_its_rows() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let batch = SeriesTable::from_rows(vec![
            SeriesRow::new(ts).with_device("a b"),
            SeriesRow::new(ts).with_device("c"),
        ]);
        let selected = StoreScope::device("a b").select(&batch);
        assert_eq!(selected.len(), 1);
        assert_eq!(StoreScope::latest().select(&batch).len(), 2);

        let scopes = scopes_for(&batch, ts);
        let names: Vec<_> = scopes.iter().map(StoreScope::name).collect();
        assert_eq!(
            names,
            vec!["latest", "weather_data_2026_01_January", "weather_data_2026_W01", "a_b", "c"]
        );
    }
}
