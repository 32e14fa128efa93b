//! Sources against a loopback HTTP server
//!
//! Covers the transport contract (auth, query, retries) and the runner's
//! failure isolation, without touching the network.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use loeco_connectors::config::{EcowittConfig, TtnConfig};
use loeco_connectors::http::{HttpConfig, HttpError, RetryPolicy};
use loeco_connectors::{ConnectorError, EcowittProvider, Provider, Runner, Source, TtnProvider};
use loeco_core::store::{SeriesStore, StoreScope};
use loeco_core::time::FixedTime;
use loeco_schemas::AvroFileStore;

use common::{sse_body, start, Canned, CannedServer};

fn fast_http() -> HttpConfig {
    HttpConfig::new().read_timeout_secs(5).retry(RetryPolicy {
        max_retries: 2,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    })
}

fn clock() -> Arc<FixedTime> {
    Arc::new(FixedTime::new(start() + chrono::Duration::hours(3)))
}

fn ttn(base_url: &str) -> TtnProvider {
    let config: TtnConfig = serde_json::from_value(json!({
        "token": "NNSXS.test",
        "application_id": "loeco-campus",
        "base_url": base_url
    }))
    .unwrap();
    TtnProvider::new("campus", config, fast_http()).unwrap()
}

fn ecowitt(base_url: &str) -> EcowittProvider {
    let config: EcowittConfig = serde_json::from_value(json!({
        "application_key": "app",
        "api_key": "key",
        "mac": "AA:BB:CC:DD:EE:FF",
        "base_url": base_url
    }))
    .unwrap();
    EcowittProvider::new("roof", config, fast_http(), clock()).unwrap()
}

#[test]
fn ttn_fetch_sends_token_and_lookback() {
    let server = CannedServer::start(vec![Canned::event_stream(sse_body(&["node-1", "node-2"]))]);
    let provider = ttn(&server.base_url);

    let observations = provider.fetch().unwrap();
    assert_eq!(observations.len(), 72);

    let requests = server.finish();
    assert_eq!(requests.len(), 1);
    let head = &requests[0];
    assert_eq!(
        head.lines().next(),
        Some("GET /api/v3/as/applications/loeco-campus/packages/storage/uplink_message?last=168h")
    );
    assert!(head.contains("Authorization: Bearer NNSXS.test"), "{head}");
    assert!(head.to_ascii_lowercase().contains("accept: text/event-stream"), "{head}");

    let table = provider.normalize(observations).unwrap();
    // 3 hours on a 30-minute grid, per device
    assert_eq!(table.len(), 12);
}

#[test]
fn server_errors_are_retried() {
    let server = CannedServer::start(vec![
        Canned::json(503, json!({"error": "busy"})),
        Canned::json(429, json!({"error": "slow down"})),
        Canned::json(200, json!({"code": 0, "time": "1772409600", "data": {}})),
    ]);

    let raw = ecowitt(&server.base_url).fetch().unwrap();
    assert_eq!(raw["code"], 0);
    assert_eq!(server.finish().len(), 3);
}

#[test]
fn client_errors_fail_fast() {
    let server = CannedServer::start(vec![Canned::json(401, json!({"message": "bad token"}))]);

    let err = ttn(&server.base_url).fetch().unwrap_err();
    match err {
        ConnectorError::Http(HttpError::Status { status, message }) => {
            assert_eq!(status, 401);
            assert!(message.contains("bad token"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(server.finish().len(), 1);
}

#[test]
fn ecowitt_api_errors_surface() {
    let server = CannedServer::start(vec![Canned::json(
        200,
        json!({"code": 40010, "msg": "illegal application_key"}),
    )]);

    let err = ecowitt(&server.base_url).fetch().unwrap_err();
    assert!(matches!(err, ConnectorError::Upstream(ref m) if m.contains("40010")), "{err}");
    server.finish();
}

#[test]
fn one_failing_source_does_not_stop_the_other() {
    let ttn_server = CannedServer::start(vec![Canned::event_stream(sse_body(&["node-1"]))]);
    let eco_server = CannedServer::start(vec![Canned::json(403, json!({"msg": "forbidden"}))]);
    let dir = tempfile::tempdir().unwrap();

    let report = Runner::new(dir.path(), clock())
        .with_source(Source::Ttn(ttn(&ttn_server.base_url)))
        .with_source(Source::Ecowitt(ecowitt(&eco_server.base_url)))
        .run_all();

    assert_eq!(report.summary(), "1 successful, 1 failed");
    assert_eq!(report.results[0].name, "campus");
    assert!(report.results[0].result.is_ok());
    assert!(report.results[1].result.is_err());

    let store = AvroFileStore::new(dir.path()).unwrap();
    let latest = store
        .read(&StoreScope::latest().with_source("ttn", "campus"))
        .unwrap()
        .unwrap();
    assert_eq!(latest.len(), 6);
    assert!(dir.path().join("ttn__campus/node-1.avro").is_file());
    assert!(!dir.path().join("ecowitt__roof").exists());

    ttn_server.finish();
    eco_server.finish();
}

#[test]
fn rerunning_a_source_appends_nothing_new() {
    let body = sse_body(&["node-1"]);
    let server = CannedServer::start(vec![Canned::event_stream(body.clone()), Canned::event_stream(body)]);
    let dir = tempfile::tempdir().unwrap();
    let mut store = AvroFileStore::new(dir.path()).unwrap();
    let provider = Source::Ttn(ttn(&server.base_url));
    let now = start();

    let first = provider.run(&mut store, now).unwrap();
    assert!(first > 0);
    assert_eq!(provider.run(&mut store, now).unwrap(), 0);
    server.finish();
}

#[test]
fn ecowitt_snapshot_lands_in_station_scopes() {
    let server = CannedServer::start(vec![Canned::json(
        200,
        json!({
            "code": 0,
            "time": "1772409600",
            "data": {"outdoor": {"temperature": {"unit": "ºF", "value": "41.0"}}}
        }),
    )]);
    let dir = tempfile::tempdir().unwrap();
    let mut store = AvroFileStore::new(dir.path()).unwrap();

    let rows = Source::Ecowitt(ecowitt(&server.base_url)).run(&mut store, start()).unwrap();
    // latest, monthly, weekly, station
    assert_eq!(rows, 4);

    let table = store
        .read(&StoreScope::device("roof").with_source("ecowitt", "roof"))
        .unwrap()
        .unwrap();
    let row = &table.rows()[0];
    assert!((row.values["temperature_c"].unwrap() - 5.0).abs() < 1e-9);
    assert_eq!(row.tags["provider"], "ecowitt");
    server.finish();
}
