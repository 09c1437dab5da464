// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Frontend: the HTTP surface — `register`/`heartbeat` for workers,
//! `submit`/`status`/`health` for clients, and `/ws` for push observers.
//! This is the only component that talks to the outside world; it is a thin
//! translation layer over [`crate::coordinator::Coordinator`].

mod handlers;
pub mod websocket;

use crate::coordinator::Coordinator;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler: just the coordinator. Cloning an
/// `Arc` is the only per-request cost.
pub type AppState = Arc<Coordinator>;

/// Build the full router. Split out from `serve` so tests can exercise routes
/// in-process with `tower::ServiceExt::oneshot` without binding a socket.
pub fn router(coordinator: Arc<Coordinator>) -> Router {
    Router::new()
        .route("/api/register", post(handlers::register))
        .route("/api/heartbeat", post(handlers::heartbeat))
        .route("/api/submit", post(handlers::submit))
        .route("/api/status", get(handlers::status))
        .route("/health", get(handlers::health))
        .route("/ws", get(websocket::upgrade))
        .layer(TraceLayer::new_for_http())
        .with_state(coordinator)
}

/// Bind and serve the Frontend on `coordinator.config.port` until the process
/// is killed. Startup failures are wrapped with context; everything after
/// that is handled per-request by `handlers`.
pub async fn serve(coordinator: Arc<Coordinator>) -> anyhow::Result<()> {
    let port = coordinator.config.port;
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {addr}: {e}"))?;
    tracing::info!(%addr, "frontend listening");
    axum::serve(listener, router(coordinator))
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker_client::MockOutcome;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_router() -> Router {
        router(Coordinator::new_for_test(MockOutcome::Success(serde_json::json!({}))))
    }

    #[tokio::test]
    async fn health_reports_zero_nodes_online_initially() {
        let app = test_router();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["nodes_online"], 0);
        assert_eq!(value["status"], "healthy");
    }

    #[tokio::test]
    async fn heartbeat_for_unknown_node_returns_400() {
        let app = test_router();
        let body = serde_json::json!({"node_id": "ghost", "load_score": 0.2}).to_string();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/heartbeat")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_then_submit_returns_queued_job() {
        let app = test_router();
        let register_body = serde_json::json!({
            "node_id": "n1",
            "address": "n1:8080",
            "capabilities": [],
            "gpu_enabled": false,
            "worker_threads": 4,
            "node_type": "worker"
        })
        .to_string();
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/register")
                    .header("content-type", "application/json")
                    .body(Body::from(register_body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let submit_body = serde_json::json!({
            "type": "thread",
            "priority": "normal",
            "parameters": {"n": 1},
            "gpu_preferred": false
        })
        .to_string();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/submit")
                    .header("content-type", "application/json")
                    .body(Body::from(submit_body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["status"], "queued");
        assert!(value["job_id"].is_string());
    }
}
