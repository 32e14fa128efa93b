//! Property-based tests for merge and reconstruction invariants.

mod common;

use std::collections::BTreeSet;

use chrono::Duration;
use proptest::prelude::*;

use loeco_core::{
    filters::{interpolate_limited, OutlierFilter},
    resample::resample,
    store::{merge_append, MemoryStore, MergeOutcome, SeriesStore, StoreScope},
    ChannelFilter, ChannelSeries, Observation, SeriesRow, SeriesTable,
};

use common::at;

fn table_strategy() -> impl Strategy<Value = SeriesTable> {
    prop::collection::vec((0i64..2_000, -40.0f64..50.0, 0usize..3), 0..40).prop_map(|rows| {
        rows.into_iter()
            .map(|(minute, value, device)| {
                SeriesRow::new(at(minute))
                    .with_device(format!("dev-{device}"))
                    .with_value("TempC_SHT", Some(value))
            })
            .collect()
    })
}

/// Observations at distinct minutes, so arrival order never decides a bucket
fn distinct_observations() -> impl Strategy<Value = Vec<Observation>> {
    prop::collection::btree_set(0i64..1_440, 1..60).prop_flat_map(|minutes: BTreeSet<i64>| {
        let n = minutes.len();
        (Just(minutes), prop::collection::vec(-10.0f64..35.0, n))
    })
    .prop_map(|(minutes, values)| {
        minutes
            .into_iter()
            .zip(values)
            .map(|(minute, value)| {
                Observation::new(if minute % 2 == 0 { "even" } else { "odd" }, at(minute))
                    .with_channel("TempC_SHT", Some(value))
            })
            .collect()
    })
}

fn sparse_series() -> impl Strategy<Value = ChannelSeries> {
    prop::collection::vec(prop::option::weighted(0.7, -20.0f64..40.0), 1..80).prop_map(|values| {
        let index = (0..values.len() as i64).map(|i| at(30 * i)).collect();
        ChannelSeries::new(index, values)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn replaying_a_batch_is_a_noop(batch in table_strategy()) {
        let mut store = MemoryStore::new();
        let scope = StoreScope::latest();

        merge_append(&mut store, &scope, &batch).unwrap();
        let before = store.read(&scope).unwrap();

        let outcome = merge_append(&mut store, &scope, &batch).unwrap();
        prop_assert_eq!(outcome, MergeOutcome::NoNewRows);
        prop_assert_eq!(store.read(&scope).unwrap(), before);
    }

    #[test]
    fn merged_tables_only_grow_at_the_end(batches in prop::collection::vec(table_strategy(), 1..6)) {
        let mut store = MemoryStore::new();
        let scope = StoreScope::latest();
        let mut previous = SeriesTable::new();

        for batch in &batches {
            merge_append(&mut store, &scope, batch).unwrap();
            let current = store.read(&scope).unwrap().unwrap_or_default();

            prop_assert!(current.len() >= previous.len());
            prop_assert_eq!(&current.rows()[..previous.len()], previous.rows());
            prop_assert!(current
                .rows()
                .windows(2)
                .all(|w| w[0].timestamp <= w[1].timestamp));

            previous = current;
        }
    }

    #[test]
    fn resampling_ignores_arrival_order(observations in distinct_observations()) {
        let interval = Duration::minutes(30);
        let forward = resample(&observations, interval).unwrap();

        let mut reversed = observations.clone();
        reversed.reverse();
        prop_assert_eq!(resample(&reversed, interval).unwrap(), forward.clone());

        for grid in &forward {
            prop_assert!(grid.index.windows(2).all(|w| w[1] - w[0] == interval));
            prop_assert!(grid.index.iter().all(|ts| (*ts - at(0)).num_minutes() % 30 == 0));
        }
    }

    #[test]
    fn outlier_rejection_only_removes(series in sparse_series()) {
        let filtered = OutlierFilter::default().apply(&series);

        prop_assert_eq!(&filtered.index, &series.index);
        for (after, before) in filtered.values.iter().zip(&series.values) {
            if let Some(v) = after {
                prop_assert_eq!(Some(*v), *before);
            }
        }
    }

    #[test]
    fn gap_filling_keeps_observed_values(series in sparse_series(), limit in 0usize..6) {
        let filled = interpolate_limited(&series, limit);

        prop_assert!(filled.present_count() >= series.present_count());
        for (after, before) in filled.values.iter().zip(&series.values) {
            if before.is_some() {
                prop_assert_eq!(after, before);
            }
        }
    }
}
