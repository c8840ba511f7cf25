//! End-to-end dispatch tests against an in-process fake data server.

use std::sync::Arc;

use engine::{AppContext, Config, Dispatcher};
use test_utils::{FakeBackend, FakeResponse};
use viz_common::RequestParams;

const CATALOG: &[&str] = &[
    "1:AHUD EHZ HV:-155.27:19.38",
    "2:AHUD SHZ HV:-155.27:19.38",
    "3:KILA EHZ HV:-155.29:19.41",
    "4:REMOTE EHZ HV:10.0:45.0",
];

struct Harness {
    backend: FakeBackend,
    dispatcher: Dispatcher,
    ctx: Arc<AppContext>,
    _artifacts: tempfile::TempDir,
}

async fn harness(extra_source_params: &str) -> Harness {
    let backend = FakeBackend::start().await.unwrap();
    let artifacts = tempfile::tempdir().unwrap();

    let yaml = format!(
        r#"
backends:
  - name: hvo
    host: "{host}"
    port: {port}
    pool_size: 2
    acquire_timeout_secs: 5
sources:
  - name: hvo_seismic_map
    backend: hvo
    source_id: hvo_seismic
    renderer: channel_map
{params}
  - name: hvo_rsam
    backend: hvo
    source_id: hvo_rsam
    renderer: time_series
  - name: hvo_menu
    backend: hvo
    source_id: hvo_seismic
    renderer: generic_menu
artifacts:
  dir: "{dir}"
  base_url: "http://localhost/artifacts"
"#,
        host = backend.host(),
        port = backend.port(),
        dir = artifacts.path().display(),
        params = extra_source_params,
    );

    let config = Config::from_yaml(&yaml).unwrap();
    let ctx = Arc::new(AppContext::from_config(&config).unwrap());
    Harness {
        backend,
        dispatcher: Dispatcher::new(ctx.clone()),
        ctx,
        _artifacts: artifacts,
    }
}

fn map_params() -> RequestParams {
    let mut p = RequestParams::new();
    p.set("west", "-156.0")
        .set("east", "-154.5")
        .set("south", "19.0")
        .set("north", "20.0")
        .set("w", "400")
        .set("mh", "300");
    p
}

#[tokio::test]
async fn test_map_request_produces_artifact() {
    let h = harness("").await;
    h.backend.respond(
        "hvo_seismic",
        "channels",
        FakeResponse::Lines(CATALOG.iter().map(|s| s.to_string()).collect()),
    );

    let mut p = map_params();
    p.set("ch", "1,3,4");

    let out = h
        .dispatcher
        .dispatch("hvo_seismic_map", "map", &p)
        .await
        .unwrap();

    let artifact = out.as_plot().expect("map yields a plot artifact");
    assert_eq!(artifact.title, "Map: hvo_seismic_map");
    assert!(!artifact.exportable);
    assert!(!artifact.combinable);
    assert!(artifact.url.ends_with(&artifact.filename));

    let path = h.ctx.store.dir().join(&artifact.filename);
    let bytes = std::fs::read(path).unwrap();
    assert_eq!(&bytes[..8], &[137, 80, 78, 71, 13, 10, 26, 10]);

    assert_eq!(h.backend.hits("hvo_seismic", "channels"), 1);
    let pool = h.ctx.pools.resolve("hvo").unwrap();
    assert_eq!(pool.counters().acquires(), 1);
    assert_eq!(pool.counters().releases(), 1);
}

#[tokio::test]
async fn test_invalid_area_never_reaches_backend_or_pool() {
    let h = harness("").await;

    let mut p = map_params();
    p.set("south", "20.0").set("north", "19.0");

    let err = h
        .dispatcher
        .dispatch("hvo_seismic_map", "map", &p)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidArea");

    assert_eq!(h.backend.total_hits(), 0);
    let pool = h.ctx.pools.resolve("hvo").unwrap();
    assert_eq!(pool.counters().acquires(), 0);
}

#[tokio::test]
async fn test_undersized_box_never_reaches_backend_or_pool() {
    let h = harness("").await;

    let mut p = map_params();
    p.set("w", "10");
    let err = h
        .dispatcher
        .dispatch("hvo_seismic_map", "map", &p)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidParameter");

    let mut p = RequestParams::new();
    p.set("h", "10");
    let err = h.dispatcher.dispatch("hvo_rsam", "plot", &p).await.unwrap_err();
    assert_eq!(err.kind(), "InvalidParameter");

    assert_eq!(h.backend.total_hits(), 0);
    assert_eq!(h.ctx.pools.resolve("hvo").unwrap().counters().acquires(), 0);
}

#[tokio::test]
async fn test_unknown_source_and_action() {
    let h = harness("").await;

    let err = h
        .dispatcher
        .dispatch("no_such_source", "map", &map_params())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "UnknownDataSource");

    let err = h
        .dispatcher
        .dispatch("hvo_seismic_map", "plot", &map_params())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "UnknownAction");

    assert_eq!(h.backend.total_hits(), 0);
    assert_eq!(h.ctx.pools.resolve("hvo").unwrap().counters().acquires(), 0);
}

#[tokio::test]
async fn test_catalog_failure_degrades_by_default() {
    let h = harness("").await;
    h.backend.respond(
        "hvo_seismic",
        "channels",
        FakeResponse::Error("database offline".into()),
    );

    // Map still renders, just without channel labels.
    let out = h
        .dispatcher
        .dispatch("hvo_seismic_map", "map", &map_params())
        .await
        .unwrap();
    assert!(out.as_plot().is_some());
}

#[tokio::test]
async fn test_strict_catalog_failure_fails_and_releases_client() {
    let h = harness("    params:\n      catalog_failure: fail").await;
    h.backend.respond(
        "hvo_seismic",
        "channels",
        FakeResponse::Error("database offline".into()),
    );

    let err = h
        .dispatcher
        .dispatch("hvo_seismic_map", "map", &map_params())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "TransportError");

    let pool = h.ctx.pools.resolve("hvo").unwrap();
    assert_eq!(pool.counters().acquires(), pool.counters().releases());
    // A backend-level refusal leaves the connection healthy; no
    // eviction, the client goes back to the idle list.
    assert_eq!(pool.counters().evictions(), 0);
}

#[tokio::test]
async fn test_menu_passes_listing_through() {
    let h = harness("").await;
    h.backend.respond(
        "hvo_seismic",
        "channels",
        FakeResponse::Lines(CATALOG.iter().map(|s| s.to_string()).collect()),
    );

    let mut p = RequestParams::new();
    p.set("tz", "HST");

    let out = h.dispatcher.dispatch("hvo_menu", "menu", &p).await.unwrap();
    match out {
        viz_common::RenderOutput::Menu(entries) => {
            assert_eq!(entries.len(), 4);
            assert_eq!(entries[0], CATALOG[0]);
        }
        other => panic!("expected menu output, got {:?}", other),
    }

    // Caller parameters travel with the request
    let seen = h.backend.requests("hvo_seismic", "channels");
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("tz=HST"));
}

#[tokio::test]
async fn test_time_series_artifact_is_exportable() {
    let h = harness("").await;
    h.backend.respond(
        "hvo_rsam",
        "data",
        FakeResponse::Lines(vec![
            "0.0,10.5".into(),
            "60.0,11.2".into(),
            "120.0,9.8".into(),
        ]),
    );

    let mut p = RequestParams::new();
    p.set("w", "300").set("h", "200").set("st", "0").set("et", "120");

    let out = h.dispatcher.dispatch("hvo_rsam", "plot", &p).await.unwrap();
    let artifact = out.as_plot().unwrap();
    assert!(artifact.exportable);
    assert!(artifact.combinable);
    assert_eq!(artifact.title, "hvo_rsam");
    assert_eq!(h.backend.hits("hvo_rsam", "data"), 1);
}

#[tokio::test]
async fn test_pooled_clients_are_reused_across_requests() {
    let h = harness("").await;
    h.backend.respond(
        "hvo_seismic",
        "channels",
        FakeResponse::Lines(CATALOG.iter().map(|s| s.to_string()).collect()),
    );

    for _ in 0..3 {
        h.dispatcher
            .dispatch("hvo_seismic_map", "map", &map_params())
            .await
            .unwrap();
    }

    let pool = h.ctx.pools.resolve("hvo").unwrap();
    assert_eq!(pool.counters().acquires(), 3);
    assert_eq!(pool.counters().releases(), 3);
    assert_eq!(pool.counters().evictions(), 0);
    // Healthy clients go back to the idle list instead of reconnecting.
    assert!(pool.live() <= 2);
}
