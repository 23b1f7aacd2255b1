use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use crewline_api::config::ServerConfig;
use crewline_api::router::build_app_router;
use crewline_api::state::AppState;
use crewline_events::MemoryBackend;

/// Build a test `ServerConfig` with safe defaults and background jobs off.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: None,
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        background_jobs: false,
        scheduler_interval_secs: 3600,
        dispatch_poll_secs: 60,
        dispatch_batch_size: 100,
    }
}

/// Build the full application router over `backend`.
///
/// Uses the same [`build_app_router`] as `main.rs`, so tests exercise the
/// production middleware stack.
pub fn build_test_app(backend: &MemoryBackend) -> Router {
    let state = AppState::with_backend(None, test_config(), Arc::new(backend.clone()));
    build_app_router(state)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri).await
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri).await
}

async fn send(app: Router, method: Method, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
