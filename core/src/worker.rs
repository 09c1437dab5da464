// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Worker node glue: self-registration with retry, a fixed-cadence heartbeat,
//! and the worker's own `/api/execute`, `/api/status`, `/health` surface.
//!
//! Hardware detection and system metric sampling are out of scope; the
//! `load_score` computed here is a documented stand-in (active jobs vs.
//! thread count, with the GPU bias the coordinator's node-selection policy
//! expects) rather than real CPU/memory telemetry.

use crate::config::{GpuMode, WorkerConfig};
use crate::executor::JobExecutor;
use crate::model::Job;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Running counters a worker reports on its own `/api/status` and folds into
/// its heartbeat's `load_score`.
#[derive(Default)]
struct WorkerStats {
    active_jobs: AtomicU32,
    jobs_completed: AtomicU64,
    jobs_failed: AtomicU64,
}

/// A worker node: owns its config, its executor, and the HTTP client it talks
/// to the coordinator with.
pub struct Worker {
    config: WorkerConfig,
    executor: Arc<dyn JobExecutor>,
    http: reqwest::Client,
    stats: WorkerStats,
}

impl Worker {
    pub fn new(config: WorkerConfig, executor: Arc<dyn JobExecutor>) -> Arc<Self> {
        let http = reqwest::Client::builder()
            .build()
            .expect("reqwest client with default TLS config");
        Arc::new(Self { config, executor, http, stats: WorkerStats::default() })
    }

    fn gpu_enabled(&self) -> bool {
        match self.config.gpu_mode {
            GpuMode::ForceOn => true,
            GpuMode::ForceOff | GpuMode::Auto => false,
        }
    }

    /// Worker-authored load score: combines utilization with a
    /// negative bias for GPU-capable nodes so the coordinator prefers them
    /// even at modestly higher load.
    fn load_score(&self) -> f64 {
        let active = self.stats.active_jobs.load(Ordering::Relaxed) as f64;
        let capacity = self.config.worker_threads.max(1) as f64;
        let utilization = active / capacity;
        if self.gpu_enabled() {
            (utilization - 0.2).max(0.0)
        } else {
            utilization
        }
    }

    /// The host:port the coordinator should dial to reach this worker's
    /// `/api/execute`. Built from `advertise_host`, never the `0.0.0.0` bind
    /// wildcard this worker actually listens on.
    fn advertise_address(&self) -> String {
        format!("{}:{}", self.config.advertise_host, self.config.port)
    }

    /// Register with the coordinator, retrying with a fixed back-off until it
    /// succeeds. A worker that can't register has nothing else useful to do.
    async fn register_with_retry(&self) {
        let url = format!("{}/api/register", self.config.coordinator_url);
        let body = serde_json::json!({
            "node_id": self.config.node_id,
            "address": self.advertise_address(),
            "capabilities": [] as [String; 0],
            "gpu_enabled": self.gpu_enabled(),
            "worker_threads": self.config.worker_threads,
            "node_type": self.config.node_type,
        });

        loop {
            match self
                .http
                .post(&url)
                .json(&body)
                .timeout(Duration::from_secs(10))
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    info!(node_id = %self.config.node_id, "registered with coordinator");
                    return;
                }
                Ok(response) => {
                    warn!(status = %response.status(), "registration rejected, retrying");
                }
                Err(err) => {
                    warn!(error = %err, "registration request failed, retrying");
                }
            }
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
    }

    /// Runs until the process exits; a failed heartbeat is logged and
    /// retried on the next tick rather than terminating the loop.
    async fn heartbeat_loop(self: Arc<Self>) {
        let url = format!("{}/api/heartbeat", self.config.coordinator_url);
        let mut ticker = tokio::time::interval(self.config.heartbeat_interval);
        loop {
            ticker.tick().await;
            let body = serde_json::json!({
                "node_id": self.config.node_id,
                "load_score": self.load_score(),
            });
            match self.http.post(&url).json(&body).send().await {
                Ok(response) if response.status().is_success() => {}
                Ok(response) => warn!(status = %response.status(), "heartbeat rejected"),
                Err(err) => warn!(error = %err, "heartbeat request failed"),
            }
        }
    }

    /// Register, start the heartbeat loop, and serve this worker's own HTTP
    /// surface until the process exits.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        self.register_with_retry().await;

        let heartbeat_worker = self.clone();
        tokio::spawn(async move { heartbeat_worker.heartbeat_loop().await });

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow::anyhow!("failed to bind {addr}: {e}"))?;
        info!(%addr, node_id = %self.config.node_id, "worker listening");
        axum::serve(listener, router(self))
            .await
            .map_err(|e| anyhow::anyhow!("worker server error: {e}"))?;
        Ok(())
    }
}

fn router(worker: Arc<Worker>) -> Router {
    Router::new()
        .route("/api/execute", post(execute))
        .route("/api/status", get(status))
        .route("/health", get(health))
        .with_state(worker)
}

async fn execute(
    State(worker): State<Arc<Worker>>,
    Json(job): Json<Job>,
) -> Result<Json<serde_json::Value>, axum::http::StatusCode> {
    worker.stats.active_jobs.fetch_add(1, Ordering::Relaxed);
    let result = worker.executor.execute(&job).await;
    worker.stats.active_jobs.fetch_sub(1, Ordering::Relaxed);

    match result {
        Ok(value) => {
            worker.stats.jobs_completed.fetch_add(1, Ordering::Relaxed);
            Ok(Json(value))
        }
        Err(err) => {
            worker.stats.jobs_failed.fetch_add(1, Ordering::Relaxed);
            error!(job_id = %job.id, error = %err, "job execution failed");
            Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn status(State(worker): State<Arc<Worker>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "node_id": worker.config.node_id,
        "active_jobs": worker.stats.active_jobs.load(Ordering::Relaxed),
        "jobs_completed": worker.stats.jobs_completed.load(Ordering::Relaxed),
        "jobs_failed": worker.stats.jobs_failed.load(Ordering::Relaxed),
        "load_score": worker.load_score(),
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy"}))
}
