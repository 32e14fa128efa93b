//! Grid resampling
//!
//! Irregular, arrival-stamped observations become one fixed-interval grid
//! per device. Within a bucket the first-arriving observation wins whole;
//! sub-bucket readings are not averaged. Buckets between the device's first
//! and last reading with no observation become all-missing rows, so the
//! gap filler can see the holes.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Duration;

use crate::errors::{PipelineError, PipelineResult};
use crate::observation::Observation;
use crate::series::DeviceGrid;
use crate::time::{floor_to_interval, Timestamp};

/// Resample a batch of observations onto per-device grids, ordered by device id
pub fn resample(observations: &[Observation], interval: Duration) -> PipelineResult<Vec<DeviceGrid>> {
    if interval <= Duration::zero() {
        return Err(PipelineError::InvalidConfig("grid interval must be positive"));
    }

    let mut by_device: BTreeMap<&str, Vec<&Observation>> = BTreeMap::new();
    for obs in observations {
        by_device.entry(obs.device_id.as_str()).or_default().push(obs);
    }

    Ok(by_device
        .into_iter()
        .map(|(device_id, group)| resample_device(device_id, group, interval))
        .collect())
}

fn resample_device(device_id: &str, mut group: Vec<&Observation>, interval: Duration) -> DeviceGrid {
    // stable: equal timestamps keep insertion order
    group.sort_by_key(|obs| obs.observed_at);

    let mut buckets: BTreeMap<Timestamp, &Observation> = BTreeMap::new();
    let mut names: BTreeSet<&str> = BTreeSet::new();
    for &obs in &group {
        names.extend(obs.channels.keys().map(String::as_str));
        buckets
            .entry(floor_to_interval(obs.observed_at, interval))
            .or_insert(obs);
    }

    let index = match (buckets.keys().next(), buckets.keys().next_back()) {
        (Some(&first), Some(&last)) => grid_between(first, last, interval),
        _ => Vec::new(),
    };

    let channels = names
        .into_iter()
        .map(|name| {
            let column = index
                .iter()
                .map(|ts| buckets.get(ts).and_then(|obs| obs.channels.get(name).copied().flatten()))
                .collect();
            (name.to_string(), column)
        })
        .collect();

    log::debug!(
        "resampled {}: {} observations onto {} grid points ({} occupied)",
        device_id,
        group.len(),
        index.len(),
        buckets.len()
    );

    DeviceGrid {
        device_id: device_id.to_string(),
        index,
        channels,
    }
}

fn grid_between(first: Timestamp, last: Timestamp, interval: Duration) -> Vec<Timestamp> {
    let mut index = Vec::new();
    let mut next = Some(first);
    while let Some(ts) = next.filter(|ts| *ts <= last) {
        index.push(ts);
        next = ts.checked_add_signed(interval);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t(minutes: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn half_hour() -> Duration {
        Duration::minutes(30)
    }

    #[test]
    fn first_arrival_wins_bucket() {
        let obs = vec![
            Observation::new("d", t(20)).with_channel("TempC_SHT", Some(3.0)),
            Observation::new("d", t(5)).with_channel("TempC_SHT", Some(1.0)),
            Observation::new("d", t(5)).with_channel("TempC_SHT", Some(2.0)),
        ];
        let grids = resample(&obs, half_hour()).unwrap();
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].index, vec![t(0)]);
        assert_eq!(grids[0].channels["TempC_SHT"], vec![Some(1.0)]);
    }

    #[test]
    fn empty_buckets_are_all_missing() {
        let obs = vec![
            Observation::new("d", t(1)).with_channel("Hum_SHT", Some(50.0)),
            Observation::new("d", t(95)).with_channel("Hum_SHT", Some(52.0)),
        ];
        let grid = &resample(&obs, half_hour()).unwrap()[0];
        assert_eq!(grid.index, vec![t(0), t(30), t(60), t(90)]);
        assert_eq!(grid.channels["Hum_SHT"], vec![Some(50.0), None, None, Some(52.0)]);
    }

    #[test]
    fn channel_set_is_union() {
        let obs = vec![
            Observation::new("d", t(0)).with_channel("a", Some(1.0)),
            Observation::new("d", t(30)).with_channel("b", Some(2.0)),
        ];
        let grid = &resample(&obs, half_hour()).unwrap()[0];
        assert_eq!(grid.channels["a"], vec![Some(1.0), None]);
        assert_eq!(grid.channels["b"], vec![None, Some(2.0)]);
    }

    #[test]
    fn devices_are_independent_and_ordered() {
        let obs = vec![
            Observation::new("zeta", t(0)),
            Observation::new("alpha", t(200)),
        ];
        let grids = resample(&obs, half_hour()).unwrap();
        assert_eq!(grids[0].device_id, "alpha");
        assert_eq!(grids[0].len(), 1);
        assert_eq!(grids[1].device_id, "zeta");
        assert!(grids[1].channels.is_empty());
    }

    #[test]
    fn rejects_non_positive_interval() {
        let obs = vec![Observation::new("d", t(0))];
        assert!(resample(&obs, Duration::zero()).is_err());
    }

    #[test]
    fn huge_interval_stops_at_the_calendar_edge() {
        let obs = vec![
            Observation::new("d", t(0)).with_channel("a", Some(1.0)),
            Observation::new("d", t(600)).with_channel("a", Some(2.0)),
        ];
        let grid = &resample(&obs, Duration::days(100_000_000)).unwrap()[0];
        assert_eq!(grid.index, vec![Utc.timestamp_opt(0, 0).unwrap()]);
        assert_eq!(grid.channels["a"], vec![Some(1.0)]);
    }

    #[test]
    fn empty_batch() {
        assert!(resample(&[], half_hour()).unwrap().is_empty());
    }
}
