#![allow(dead_code)]

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use imagegen_core::admission::AdmissionGate;
use imagegen_core::config::RenderConfig;
use imagegen_core::job::JobSpec;
use imagegen_render::{JobDispatcher, ProcessExit, ProcessRunner};
use tokio::sync::Semaphore;
use tower::ServiceExt;

use imagegen_api::config::ServerConfig;
use imagegen_api::router::build_app_router;
use imagegen_api::state::AppState;

/// Bytes every fake renderer writes as its artifact.
pub const FAKE_PNG: &[u8] = b"0123456789";

/// Build a test `ServerConfig` with safe defaults and retention disabled.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: None,
        shutdown_timeout_secs: 30,
        render_config_path: "config.json".into(),
        artifact_retention_secs: 0,
        artifact_cleanup_interval_secs: 600,
    }
}

/// Render config writing into `output_dir` with the given capacity.
pub fn test_render_config(output_dir: &Path, capacity: usize) -> RenderConfig {
    RenderConfig {
        executable_path: "/opt/sd/sd".into(),
        models_path: "/opt/sd/models".into(),
        output_dir: output_dir.to_path_buf(),
        max_concurrent_renders: capacity,
        render_timeout_secs: 5,
        ..Default::default()
    }
}

/// Build the full application router around a dispatcher using `runner`.
///
/// Returns the dispatcher too so tests can observe the admission gate.
pub fn build_test_app(
    render_config: RenderConfig,
    runner: Arc<dyn ProcessRunner>,
) -> (Router, Arc<JobDispatcher>) {
    let dispatcher = Arc::new(JobDispatcher::new(Arc::new(render_config), runner));
    let config = test_config();
    let state = AppState {
        config: Arc::new(config.clone()),
        dispatcher: Arc::clone(&dispatcher),
    };
    let app = build_app_router(state, &config).expect("test config is valid");
    (app, dispatcher)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: String) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn location(response: &Response<Body>) -> String {
    response.headers()["location"].to_str().unwrap().to_string()
}

/// Poll until `expected` slots are held, failing after ~5 seconds.
pub async fn wait_for_in_flight(gate: &AdmissionGate, expected: usize) {
    for _ in 0..500 {
        if gate.in_flight() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("in_flight never reached {expected}");
}

// ---------------------------------------------------------------------------
// Fake renderers
// ---------------------------------------------------------------------------

/// Writes [`FAKE_PNG`] to the output path and exits 0.
pub struct WritingRunner;

#[async_trait]
impl ProcessRunner for WritingRunner {
    async fn run(&self, job: &JobSpec, _timeout: Duration) -> io::Result<ProcessExit> {
        tokio::fs::write(&job.output_path, FAKE_PNG).await?;
        Ok(ProcessExit::Exited { code: Some(0) })
    }
}

/// Returns a fixed exit without writing anything.
pub struct FixedExitRunner(pub ProcessExit);

#[async_trait]
impl ProcessRunner for FixedExitRunner {
    async fn run(&self, _job: &JobSpec, _timeout: Duration) -> io::Result<ProcessExit> {
        Ok(self.0)
    }
}

/// Holds every render until a permit is added to `release`, then behaves
/// like [`WritingRunner`].
pub struct BlockingRunner {
    pub release: Semaphore,
}

impl BlockingRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            release: Semaphore::new(0),
        })
    }
}

#[async_trait]
impl ProcessRunner for BlockingRunner {
    async fn run(&self, job: &JobSpec, timeout: Duration) -> io::Result<ProcessExit> {
        match tokio::time::timeout(timeout, self.release.acquire()).await {
            Ok(permit) => {
                permit.expect("semaphore closed").forget();
                tokio::fs::write(&job.output_path, FAKE_PNG).await?;
                Ok(ProcessExit::Exited { code: Some(0) })
            }
            Err(_) => Ok(ProcessExit::TimedOut),
        }
    }
}
