// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Request/response bodies and handler functions for every route the frontend exposes.

use super::AppState;
use crate::coordinator::StatusSnapshot;
use crate::error::{CoordinatorError, CoordinatorResult};
use crate::model::{JobPriority, JobType};
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub node_id: String,
    pub address: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub gpu_enabled: bool,
    pub worker_threads: u32,
    /// Accepted but not interpreted by the coordinator; workers send it for
    /// their own operator tooling's benefit.
    #[serde(default)]
    pub node_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub status: &'static str,
    pub node_id: String,
}

pub async fn register(
    State(coordinator): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> CoordinatorResult<Json<RegisterResponse>> {
    if req.node_id.trim().is_empty() {
        return Err(CoordinatorError::MalformedRequest("node_id must not be empty".into()));
    }
    coordinator.register_node(
        req.node_id.clone(),
        req.address,
        req.capabilities,
        req.gpu_enabled,
        req.worker_threads,
    );
    Ok(Json(RegisterResponse { status: "registered", node_id: req.node_id }))
}

#[derive(Debug, Deserialize)]
pub struct HeartbeatRequest {
    pub node_id: String,
    pub load_score: f64,
}

#[derive(Debug, Serialize)]
pub struct HeartbeatResponse {
    pub status: &'static str,
}

pub async fn heartbeat(
    State(coordinator): State<AppState>,
    Json(req): Json<HeartbeatRequest>,
) -> CoordinatorResult<Json<HeartbeatResponse>> {
    if coordinator.heartbeat(&req.node_id, req.load_score) {
        Ok(Json(HeartbeatResponse { status: "acknowledged" }))
    } else {
        Err(CoordinatorError::UnknownNode)
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(rename = "type")]
    pub job_type: JobType,
    #[serde(default)]
    pub priority: JobPriority,
    #[serde(default = "serde_json::Value::default")]
    pub parameters: serde_json::Value,
    /// Defaults to `false` when absent: a client opts into GPU placement
    /// explicitly rather than it being assumed.
    #[serde(default)]
    pub gpu_preferred: bool,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub status: &'static str,
    pub estimated_wait_time: f64,
}

pub async fn submit(
    State(coordinator): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> CoordinatorResult<Json<SubmitResponse>> {
    let (job_id, estimated_wait_time) =
        coordinator.submit_job(req.job_type, req.priority, req.parameters, req.gpu_preferred);
    Ok(Json(SubmitResponse { job_id, status: "queued", estimated_wait_time }))
}

pub async fn status(State(coordinator): State<AppState>) -> Json<StatusSnapshot> {
    Json(coordinator.status_snapshot())
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub nodes_online: usize,
}

pub async fn health(State(coordinator): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy", nodes_online: coordinator.nodes_online() })
}
