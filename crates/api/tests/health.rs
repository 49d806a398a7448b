//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, build_test_app, get, test_render_config, wait_for_in_flight, BlockingRunner};
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Test: GET /health returns 200 with expected JSON fields
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok_with_json() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = build_test_app(test_render_config(dir.path(), 2), BlockingRunner::new());

    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["render_capacity"], 2);
    assert_eq!(json["renders_in_flight"], 0);
}

// ---------------------------------------------------------------------------
// Test: health reports renders in flight
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_in_flight_renders() {
    let dir = tempfile::tempdir().unwrap();
    let runner = BlockingRunner::new();
    let (app, dispatcher) = build_test_app(test_render_config(dir.path(), 2), runner.clone());

    let pending = tokio::spawn({
        let app = app.clone();
        async move {
            common::post_json(app, "/generate", serde_json::json!({ "prompt": "x" })).await
        }
    });
    wait_for_in_flight(dispatcher.gate(), 1).await;

    let json = body_json(get(app, "/health").await).await;
    assert_eq!(json["renders_in_flight"], 1);

    runner.release.add_permits(1);
    assert_eq!(pending.await.unwrap().status(), StatusCode::FOUND);
}

// ---------------------------------------------------------------------------
// Test: Unknown route returns 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = build_test_app(test_render_config(dir.path(), 2), BlockingRunner::new());

    let response = get(app, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: x-request-id header is present in response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = build_test_app(test_render_config(dir.path(), 2), BlockingRunner::new());

    let response = get(app, "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(
        request_id.to_str().unwrap().len(),
        36,
        "x-request-id should be a UUID string"
    );
}

// ---------------------------------------------------------------------------
// Test: CORS preflight OPTIONS request returns correct headers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cors_preflight_allows_post_from_configured_origin() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = build_test_app(test_render_config(dir.path(), 2), BlockingRunner::new());

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/generate")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers["access-control-allow-origin"],
        "http://localhost:5173"
    );
    let allow_methods = headers["access-control-allow-methods"].to_str().unwrap();
    assert!(
        allow_methods.contains("POST"),
        "Allow-Methods should contain POST, got: {allow_methods}"
    );
}
