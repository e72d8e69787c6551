//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::TimeZone;
use http_body_util::BodyExt;
use tower::ServiceExt;

use moot_api::routes;
use moot_api::state::AppState;
use moot_engine::Engine;
use moot_test_support::{FixedClock, FixedSeed, MemoryStore, RecordingNotifier};

/// Build the full app router over the in-memory store with a fixed
/// clock and seed. Uses the same route structure as `main.rs`.
pub fn build_test_app() -> Router {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock(
        chrono::Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
    ));
    let engine = Arc::new(Engine::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store,
        clock,
        Box::new(FixedSeed(7)),
        Arc::new(RecordingNotifier::new()),
    ));
    let app_state = AppState::new(engine);

    Router::new()
        .merge(routes::health::router())
        .nest(
            "/api/v1/games",
            routes::games::router().merge(routes::actions::propose_router()),
        )
        .nest("/api/v1/actions", routes::actions::router())
        .nest("/api/v1/arguments", routes::actions::arguments_router())
        .with_state(app_state)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
