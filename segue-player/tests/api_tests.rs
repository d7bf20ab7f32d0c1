//! Integration tests for the segue-player HTTP API
//!
//! Exercises the control surface over scripted playback units: health,
//! playback control, the position readout, volume persistence, and the
//! visibility feed.

mod helpers;

use axum::http::StatusCode;
use helpers::{build_engine, make_clip, test_params, TestEngine};
use segue_player::api::{create_router, AppContext};
use segue_player::audio::MasterVolume;
use segue_player::audio::PlaybackUnit;
use segue_player::db;
use segue_player::engine::VisibilityController;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Build a full application context over scripted units and a temp
/// database.
async fn setup_test_app() -> (axum::Router, TestEngine, tempfile::TempDir) {
    let engine = build_engine(30.0, test_params());

    let dir = tempfile::tempdir().expect("tempdir");
    let db_pool = db::connect(&dir.path().join("segue-test.db"))
        .await
        .expect("settings db");

    let ctx = AppContext {
        state: engine.state.clone(),
        session: engine.session.clone(),
        visibility: Arc::new(VisibilityController::new(engine.session.clone(), 0.5)),
        master_volume: Arc::new(MasterVolume::new(0.75)),
        db_pool,
    };

    (create_router(ctx), engine, dir)
}

/// Make one request against the router.
async fn make_request(
    app: &axum::Router,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Option<Value>) {
    use axum::body::Body;
    use http::{Method, Request};
    use tower::ServiceExt;

    let method = match method {
        "GET" => Method::GET,
        "POST" => Method::POST,
        _ => panic!("Unsupported method"),
    };

    let mut builder = Request::builder().method(method).uri(path);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }

    let request = match body {
        Some(json_body) => builder.body(Body::from(json_body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json_body = if bytes.is_empty() {
        None
    } else {
        serde_json::from_slice(&bytes).ok()
    };

    (status, json_body)
}

fn clip_json(name: &str) -> Value {
    serde_json::to_value(make_clip(name, 30.0)).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _engine, _dir) = setup_test_app().await;

    let (status, body) = make_request(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    let body = body.expect("response body");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "segue-player");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_select_starts_playback() {
    let (app, engine, _dir) = setup_test_app().await;

    let (status, body) = make_request(
        &app,
        "POST",
        "/playback/select",
        Some(clip_json("api-clip")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["status"], "playing");
    assert!(engine.units[0].is_playing());

    let (status, body) = make_request(&app, "GET", "/playback/state", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["state"], "playing");
}

#[tokio::test]
async fn test_toggle_pauses_then_resumes() {
    let (app, _engine, _dir) = setup_test_app().await;
    let clip = clip_json("toggler");

    let (status, body) = make_request(&app, "POST", "/playback/toggle", Some(clip.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["state"], "playing");

    let (_, body) = make_request(&app, "POST", "/playback/toggle", Some(clip.clone())).await;
    assert_eq!(body.unwrap()["state"], "paused");

    let (_, body) = make_request(&app, "POST", "/playback/toggle", Some(clip)).await;
    assert_eq!(body.unwrap()["state"], "playing");
}

#[tokio::test]
async fn test_stop_returns_to_idle() {
    let (app, _engine, _dir) = setup_test_app().await;

    make_request(
        &app,
        "POST",
        "/playback/select",
        Some(clip_json("stopped")),
    )
    .await;
    let (status, _) = make_request(&app, "POST", "/playback/stop", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = make_request(&app, "GET", "/playback/state", None).await;
    assert_eq!(body.unwrap()["state"], "idle");
}

#[tokio::test]
async fn test_position_readout_shape() {
    let (app, _engine, _dir) = setup_test_app().await;

    // Idle: empty readout
    let (status, body) = make_request(&app, "GET", "/playback/position", None).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert!(body["clip_id"].is_null());
    assert_eq!(body["position_ms"], 0);
    assert_eq!(body["state"], "idle");

    let clip = clip_json("positioned");
    let clip_id = clip["clip_id"].as_str().unwrap().to_string();
    make_request(&app, "POST", "/playback/select", Some(clip)).await;

    let (_, body) = make_request(&app, "GET", "/playback/position", None).await;
    let body = body.unwrap();
    assert_eq!(body["clip_id"].as_str().unwrap(), clip_id);
    assert_eq!(body["duration_ms"], 30_000);
    assert_eq!(body["state"], "playing");
}

#[tokio::test]
async fn test_seek_validation() {
    let (app, _engine, _dir) = setup_test_app().await;

    make_request(&app, "POST", "/playback/select", Some(clip_json("seeky"))).await;

    let (status, _) = make_request(
        &app,
        "POST",
        "/playback/seek",
        Some(json!({ "position_seconds": 10.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = make_request(
        &app,
        "POST",
        "/playback/seek",
        Some(json!({ "position_seconds": -3.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_select_unloadable_source_is_bad_gateway() {
    let (app, engine, _dir) = setup_test_app().await;

    engine.units[0].fail_next_load();
    let (status, _) = make_request(
        &app,
        "POST",
        "/playback/select",
        Some(clip_json("cursed")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (_, body) = make_request(&app, "GET", "/playback/state", None).await;
    assert_eq!(body.unwrap()["state"], "idle");
}

#[tokio::test]
async fn test_volume_roundtrip_and_persistence() {
    let (app, _engine, _dir) = setup_test_app().await;

    let (status, body) = make_request(&app, "GET", "/audio/volume", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["volume"], 75);

    let (status, body) = make_request(
        &app,
        "POST",
        "/audio/volume",
        Some(json!({ "volume": 40 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["volume"], 40);

    let (_, body) = make_request(&app, "GET", "/audio/volume", None).await;
    assert_eq!(body.unwrap()["volume"], 40);

    // Out of range rejected
    let (status, _) = make_request(
        &app,
        "POST",
        "/audio/volume",
        Some(json!({ "volume": 150 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_visibility_feed_switches_items() {
    let (app, engine, _dir) = setup_test_app().await;

    let item_a = Uuid::new_v4();
    let item_b = Uuid::new_v4();

    let (status, body) = make_request(
        &app,
        "POST",
        "/feed/visibility",
        Some(json!({
            "item_id": item_a,
            "ratio": 0.8,
            "clip": clip_json("feed-a"),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["switched"], true);
    assert!(engine.units[0].is_playing());

    // Same item above threshold again: idempotent
    let (_, body) = make_request(
        &app,
        "POST",
        "/feed/visibility",
        Some(json!({
            "item_id": item_a,
            "ratio": 0.9,
            "clip": clip_json("feed-a"),
        })),
    )
    .await;
    assert_eq!(body.unwrap()["switched"], false);

    // A different item crossing the threshold takes over
    let (_, body) = make_request(
        &app,
        "POST",
        "/feed/visibility",
        Some(json!({
            "item_id": item_b,
            "ratio": 0.6,
            "clip": clip_json("feed-b"),
        })),
    )
    .await;
    assert_eq!(body.unwrap()["switched"], true);
}
