// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Node Registry: one record per known node, plus the health state machine and
//! node-selection policy.

use crate::model::{Node, NodeId, NodeStatus};
use chrono::Duration;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// The outcome of a registration or heartbeat, used by the coordinator to decide
/// which events to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The node is new, or was previously known and is being re-registered.
    Registered { recovered: bool },
    /// A heartbeat refreshed an already-online node; no transition occurred.
    HeartbeatOk,
    /// A heartbeat re-promoted a previously offline node to online.
    HeartbeatRecovered,
    /// A heartbeat was rejected because the node id is unknown.
    UnknownNode,
}

/// Holds one record per registered node. Uses a concurrent map rather than a
/// single lock around a `HashMap` so that registration, heartbeat, and read-heavy
/// status/selection paths don't serialize behind each other.
#[derive(Default)]
pub struct NodeRegistry {
    nodes: DashMap<NodeId, Node>,
    nodes_online: AtomicUsize,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `unknown -> online` (fresh) or idempotent re-registration, replacing the
    /// prior record for this id entirely.
    pub fn register(&self, node: Node) -> Transition {
        let recovered = self
            .nodes
            .get(&node.id)
            .map(|existing| existing.status == NodeStatus::Offline)
            .unwrap_or(false);

        self.nodes.insert(node.id.clone(), node);
        self.recompute_online_count();
        Transition::Registered { recovered }
    }

    /// Apply a heartbeat payload. Rejects unknown node ids without creating a
    /// record: heartbeats never implicitly register.
    pub fn heartbeat(&self, node_id: &str, load_score: f64) -> Transition {
        let Some(mut entry) = self.nodes.get_mut(node_id) else {
            return Transition::UnknownNode;
        };
        let was_offline = entry.status == NodeStatus::Offline;
        entry.apply_heartbeat(load_score);
        self.recompute_online_count();
        if was_offline {
            Transition::HeartbeatRecovered
        } else {
            Transition::HeartbeatOk
        }
    }

    /// Demote every node whose last heartbeat exceeds `liveness_timeout`, returning
    /// the ids that were newly demoted (so the caller can emit `node_offline` for
    /// exactly those).
    pub fn sweep_liveness(&self, liveness_timeout: Duration) -> Vec<NodeId> {
        let mut demoted = Vec::new();
        for mut entry in self.nodes.iter_mut() {
            if entry.status == NodeStatus::Online && !entry.is_alive(liveness_timeout) {
                entry.status = NodeStatus::Offline;
                demoted.push(entry.id.clone());
            }
        }
        if !demoted.is_empty() {
            self.recompute_online_count();
        }
        demoted
    }

    /// Record a successful completion against the node's running stats.
    pub fn record_completion(&self, node_id: &str, execution_time: f64) {
        if let Some(mut entry) = self.nodes.get_mut(node_id) {
            entry.record_completion(execution_time);
        }
    }

    pub fn get(&self, node_id: &str) -> Option<Node> {
        self.nodes.get(node_id).map(|e| e.clone())
    }

    /// Snapshot of every known node, for `/api/status` and `initial_status` events.
    pub fn snapshot(&self) -> Vec<Node> {
        self.nodes.iter().map(|e| e.clone()).collect()
    }

    pub fn nodes_online(&self) -> usize {
        self.nodes_online.load(Ordering::Relaxed)
    }

    fn recompute_online_count(&self) {
        let count = self.nodes.iter().filter(|e| e.status == NodeStatus::Online).count();
        self.nodes_online.store(count, Ordering::Relaxed);
    }

    /// Node-selection policy: among online nodes, narrow to GPU-enabled
    /// candidates if the job prefers GPU and any exist, then pick the candidate
    /// with the lowest `load_score`.
    pub fn select_node(&self, gpu_preferred: bool) -> Option<Node> {
        let online: Vec<Node> = self
            .nodes
            .iter()
            .filter(|e| e.status == NodeStatus::Online)
            .map(|e| e.clone())
            .collect();

        let gpu_candidates: Vec<&Node> = online.iter().filter(|n| n.gpu_enabled).collect();
        let candidates: Vec<&Node> = if gpu_preferred && !gpu_candidates.is_empty() {
            gpu_candidates
        } else {
            online.iter().collect()
        };

        candidates
            .into_iter()
            .min_by(|a, b| a.load_score.total_cmp(&b.load_score))
            .cloned()
    }

    /// Mean `average_job_time` over online candidates (GPU-filtered if preferred),
    /// used for the submit-time wait estimate. `None` if no candidates.
    pub fn mean_job_time(&self, gpu_preferred: bool) -> Option<f64> {
        let online: Vec<Node> = self
            .nodes
            .iter()
            .filter(|e| e.status == NodeStatus::Online)
            .map(|e| e.clone())
            .collect();

        let gpu_candidates: Vec<&Node> = online.iter().filter(|n| n.gpu_enabled).collect();
        let candidates: Vec<&Node> = if gpu_preferred && !gpu_candidates.is_empty() {
            gpu_candidates
        } else {
            online.iter().collect()
        };

        if candidates.is_empty() {
            return None;
        }
        let sum: f64 = candidates.iter().map(|n| n.average_job_time).sum();
        Some(sum / candidates.len() as f64)
    }

    /// Whether any online node is GPU-enabled (used for the wait-time floor).
    pub fn has_online_gpu_node(&self) -> bool {
        self.nodes.iter().any(|e| e.status == NodeStatus::Online && e.gpu_enabled)
    }
}
