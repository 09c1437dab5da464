// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Core data model: jobs, nodes, and cluster-wide statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a job, stable for the lifetime of the coordinator process.
pub type JobId = String;

/// Client-provided identifier for a node. Re-registration under the same id replaces
/// the existing record.
pub type NodeId = String;

/// The two job kinds the core dispatches. The actual compute kernels are out of scope;
/// workers treat these as opaque labels routing to a queue class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Thread-walk simulation job.
    Thread,
    /// Collatz-sequence calculation job.
    Collatz,
}

impl JobType {
    /// The queue class this job type drains from when priority is not `high`.
    pub fn default_class(self) -> QueueClass {
        match self {
            JobType::Thread => QueueClass::Thread,
            JobType::Collatz => QueueClass::Collatz,
        }
    }
}

/// Client-requested priority. `High` routes to the priority queue regardless of job type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobPriority {
    Low,
    #[default]
    Normal,
    High,
}

/// Which of the three strict-order FIFO queues a job lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueClass {
    /// Drained first; bypasses type-based ordering entirely.
    Priority,
    Collatz,
    Thread,
}

/// Mutable lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Assigned,
    Completed,
    Failed,
}

/// A unit of computation accepted from a client and tracked through its lifecycle.
///
/// Submission fields (`id`, `job_type`, `priority`, `parameters`, `gpu_preferred`,
/// `submitted_at`) are immutable. Scheduling fields are mutated in place as the job
/// moves through `queued -> assigned -> {completed | failed}`; a terminal status is
/// never overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub priority: JobPriority,
    pub parameters: serde_json::Value,
    pub gpu_preferred: bool,
    pub submitted_at: DateTime<Utc>,

    pub status: JobStatus,
    pub assigned_node: Option<NodeId>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub execution_time: Option<f64>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl Job {
    /// Build a freshly submitted job in the `queued` state.
    pub fn new(id: JobId, job_type: JobType, priority: JobPriority, parameters: serde_json::Value, gpu_preferred: bool) -> Self {
        Self {
            id,
            job_type,
            priority,
            parameters,
            gpu_preferred,
            submitted_at: Utc::now(),
            status: JobStatus::Queued,
            assigned_node: None,
            assigned_at: None,
            completed_at: None,
            failed_at: None,
            execution_time: None,
            result: None,
            error: None,
        }
    }

    /// The queue class this job was, or would be, placed into on submission.
    pub fn queue_class(&self) -> QueueClass {
        if self.priority == JobPriority::High {
            QueueClass::Priority
        } else {
            self.job_type.default_class()
        }
    }

    /// Transition `queued -> assigned`. No-op guard: callers must only call this once.
    pub fn mark_assigned(&mut self, node_id: NodeId) {
        self.status = JobStatus::Assigned;
        self.assigned_node = Some(node_id);
        self.assigned_at = Some(Utc::now());
    }

    /// Transition `assigned -> completed`.
    pub fn mark_completed(&mut self, result: serde_json::Value) {
        let now = Utc::now();
        self.completed_at = Some(now);
        if let Some(assigned_at) = self.assigned_at {
            self.execution_time = Some((now - assigned_at).num_milliseconds() as f64 / 1000.0);
        }
        self.result = Some(result);
        self.status = JobStatus::Completed;
    }

    /// Transition `assigned -> failed`.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.failed_at = Some(Utc::now());
        self.error = Some(error.into());
        self.status = JobStatus::Failed;
    }

    /// True once the job has reached `completed` or `failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Failed)
    }

    /// The timestamp the retention sweeper measures eviction age against.
    pub fn terminal_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at.or(self.failed_at)
    }
}

/// Health status of a node as tracked by the node registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Online,
    Offline,
}

/// A record of one registered worker node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub address: String,
    pub capabilities: Vec<String>,
    pub gpu_enabled: bool,
    pub worker_threads: u32,
    pub status: NodeStatus,
    pub last_heartbeat: DateTime<Utc>,
    pub jobs_completed: u64,
    pub average_job_time: f64,
    pub load_score: f64,
}

impl Node {
    /// Build a record from a registration payload. `status` always starts `online`;
    /// a fresh registration is, by definition, a live node.
    pub fn from_registration(
        id: NodeId,
        address: String,
        capabilities: Vec<String>,
        gpu_enabled: bool,
        worker_threads: u32,
    ) -> Self {
        Self {
            id,
            address,
            capabilities,
            gpu_enabled,
            worker_threads,
            status: NodeStatus::Online,
            last_heartbeat: Utc::now(),
            jobs_completed: 0,
            average_job_time: 0.0,
            load_score: 0.0,
        }
    }

    /// Refresh liveness and load from a heartbeat payload. Last-writer-wins.
    pub fn apply_heartbeat(&mut self, load_score: f64) {
        self.last_heartbeat = Utc::now();
        self.load_score = load_score;
        self.status = NodeStatus::Online;
    }

    /// Record a successful job completion, recomputing the incremental mean.
    pub fn record_completion(&mut self, execution_time: f64) {
        let n = self.jobs_completed as f64;
        self.average_job_time = (self.average_job_time * n + execution_time) / (n + 1.0);
        self.jobs_completed += 1;
    }

    /// Whether this node's last heartbeat is still within the liveness window.
    pub fn is_alive(&self, liveness_timeout: chrono::Duration) -> bool {
        Utc::now() - self.last_heartbeat <= liveness_timeout
    }
}

/// Cluster-wide counters, recomputed incrementally as jobs complete and nodes
/// transition. Cheap to snapshot under a single lock since every field is a plain
/// numeric total.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClusterStats {
    pub total_calculations: u64,
    pub gpu_calculations: u64,
    pub cpu_calculations: u64,
    pub average_response_time: f64,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub start_time: Option<DateTime<Utc>>,
    pub nodes_online: usize,
}

impl ClusterStats {
    pub fn new() -> Self {
        Self {
            start_time: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Fold in one freshly completed job, attributed to whether the executing node
    /// is GPU-enabled *at completion time*.
    pub fn record_completion(&mut self, execution_time: f64, node_gpu_enabled: bool) {
        let n = self.total_calculations as f64;
        self.average_response_time = (self.average_response_time * n + execution_time) / (n + 1.0);
        self.total_calculations += 1;
        if node_gpu_enabled {
            self.gpu_calculations += 1;
        } else {
            self.cpu_calculations += 1;
        }
    }
}

/// Process-lifetime monotonic job id generator. A plain atomic counter is sufficient:
/// ids only need to be unique for this coordinator's lifetime, not globally.
#[derive(Debug, Default)]
pub struct JobIdGenerator {
    next: AtomicU64,
}

impl JobIdGenerator {
    pub fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    pub fn next_id(&self) -> JobId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("job-{n}")
    }
}

/// Depths of the three queues, reported on `/api/status`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct QueueDepths {
    pub priority: usize,
    pub collatz: usize,
    pub thread: usize,
}

/// A terminal job's final classification, used by the unified terminal-job store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalKind {
    Completed,
    Failed,
}

impl Job {
    /// Classify a terminal job as completed or failed. Panics if the job is not
    /// terminal; callers only invoke this after `mark_completed`/`mark_failed`.
    pub fn terminal_kind(&self) -> TerminalKind {
        match self.status {
            JobStatus::Completed => TerminalKind::Completed,
            JobStatus::Failed => TerminalKind::Failed,
            _ => unreachable!("terminal_kind called on a non-terminal job"),
        }
    }
}
