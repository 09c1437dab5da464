// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The coordinator value: the single root of mutable state, shared by every
//! cooperating task.

use crate::config::CoordinatorConfig;
use crate::events::{ClusterEvent, EventBus};
use crate::jobstore::JobStore;
use crate::model::{ClusterStats, Job, JobIdGenerator, JobPriority, JobType, Node, QueueDepths};
use crate::queue::QueueSet;
use crate::registry::{NodeRegistry, Transition};
use crate::worker_client::WorkerClient;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// Full cluster snapshot backing `GET /api/status` and the `initial_status` event.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StatusSnapshot {
    pub nodes: Vec<Node>,
    pub stats: ClusterStats,
    pub active_jobs: usize,
    pub completed_jobs: usize,
    pub queue_depths: QueueDepths,
}

/// The coordinator: owns every piece of shared state and is handed by `Arc` to the
/// Dispatcher, Liveness Monitor, Retention Sweeper, and every HTTP handler.
pub struct Coordinator {
    pub config: CoordinatorConfig,
    pub queues: QueueSet,
    pub jobs: JobStore,
    pub nodes: NodeRegistry,
    pub events: EventBus,
    pub stats: RwLock<ClusterStats>,
    job_ids: JobIdGenerator,
    pub worker_client: Arc<dyn WorkerClient>,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig, worker_client: Arc<dyn WorkerClient>) -> Arc<Self> {
        Arc::new(Self {
            config,
            queues: QueueSet::new(),
            jobs: JobStore::new(),
            nodes: NodeRegistry::new(),
            events: EventBus::new(),
            stats: RwLock::new(ClusterStats::new()),
            job_ids: JobIdGenerator::new(),
            worker_client,
        })
    }

    /// Spawn the Dispatcher, Liveness Monitor, and Retention Sweeper as independent
    /// tokio tasks sharing this coordinator. Fire-and-forget: the returned handles
    /// are intentionally dropped by callers that don't need to join them, since
    /// these loops run for the lifetime of the process.
    pub fn spawn_background_tasks(self: &Arc<Self>) {
        let dispatcher = self.clone();
        tokio::spawn(async move { crate::dispatcher::run(dispatcher).await });

        let liveness = self.clone();
        tokio::spawn(async move { crate::liveness::run(liveness).await });

        let retention = self.clone();
        tokio::spawn(async move { crate::retention::run(retention).await });
    }

    /// `POST /api/register`. Idempotent on `node_id`; emits `node_registered`
    /// always, plus `node_online` if this registration recovers a previously
    /// offline node.
    pub fn register_node(
        &self,
        node_id: String,
        address: String,
        capabilities: Vec<String>,
        gpu_enabled: bool,
        worker_threads: u32,
    ) {
        let node = Node::from_registration(node_id, address, capabilities, gpu_enabled, worker_threads);
        let transition = self.nodes.register(node.clone());
        info!(node_id = %node.id, "node registered");
        self.events.publish(ClusterEvent::NodeRegistered { node: node.clone() });
        if let Transition::Registered { recovered: true } = transition {
            self.events.publish(ClusterEvent::NodeOnline { node });
        }
    }

    /// `POST /api/heartbeat`. Returns `false` if the node is unknown (caller
    /// maps this to the `unknown_node` 400 response).
    pub fn heartbeat(&self, node_id: &str, load_score: f64) -> bool {
        match self.nodes.heartbeat(node_id, load_score) {
            Transition::UnknownNode => false,
            Transition::HeartbeatRecovered => {
                if let Some(node) = self.nodes.get(node_id) {
                    self.events.publish(ClusterEvent::NodeOnline { node });
                }
                true
            }
            Transition::HeartbeatOk | Transition::Registered { .. } => true,
        }
    }

    /// `POST /api/submit`. Returns the job id and the estimated wait time in
    /// seconds; the estimate is a hint, never a commitment.
    pub fn submit_job(
        &self,
        job_type: JobType,
        priority: JobPriority,
        parameters: serde_json::Value,
        gpu_preferred: bool,
    ) -> (String, f64) {
        let id = self.job_ids.next_id();
        let job = Job::new(id.clone(), job_type, priority, parameters, gpu_preferred);
        let class = job.queue_class();
        self.jobs.insert(job);
        self.queues.push(class, id.clone());

        let wait_estimate = self.estimate_wait_time(gpu_preferred);
        (id, wait_estimate)
    }

    /// Wait-time estimate: mean `average_job_time` over GPU-filtered
    /// candidates, floored at 10s when the job prefers GPU and a GPU candidate
    /// exists (the same condition that narrowed the candidate set), 30s
    /// otherwise, or 300s if no node is online at all.
    fn estimate_wait_time(&self, gpu_preferred: bool) -> f64 {
        match self.nodes.mean_job_time(gpu_preferred) {
            None => 300.0,
            Some(mean) => {
                let floor = if gpu_preferred && self.nodes.has_online_gpu_node() { 10.0 } else { 30.0 };
                mean.max(floor)
            }
        }
    }

    /// `GET /api/status`.
    pub fn status_snapshot(&self) -> StatusSnapshot {
        let mut stats = self.stats.read().clone();
        stats.nodes_online = self.nodes.nodes_online();
        StatusSnapshot {
            nodes: self.nodes.snapshot(),
            stats,
            active_jobs: self.jobs.active_count(),
            completed_jobs: self.jobs.terminal_count(),
            queue_depths: self.queues.depths(),
        }
    }

    /// `GET /health`.
    pub fn nodes_online(&self) -> usize {
        self.nodes.nodes_online()
    }
}

#[cfg(test)]
impl Coordinator {
    /// Test-only constructor wiring a mock worker client so dispatcher behavior
    /// can be exercised without a real worker process.
    pub fn new_for_test(outcome: crate::worker_client::MockOutcome) -> Arc<Self> {
        let mut config = CoordinatorConfig::from_env();
        config.dispatch_backoff = std::time::Duration::from_millis(10);
        config.dispatch_poll_interval = std::time::Duration::from_millis(10);
        Self::new(config, Arc::new(crate::worker_client::MockWorkerClient::new(outcome)))
    }

    pub fn submit_thread_job(&self) -> String {
        self.submit_job(JobType::Thread, JobPriority::Normal, serde_json::json!({"n": 1}), false).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeStatus;
    use crate::worker_client::MockOutcome;

    #[test]
    fn register_then_reregister_after_offline_emits_node_online() {
        let coordinator = Coordinator::new_for_test(MockOutcome::Success(serde_json::json!({})));
        let mut rx = coordinator.events.subscribe();

        coordinator.register_node("n1".into(), "n1:8080".into(), vec![], false, 4);
        // force-demote to simulate a liveness sweep having fired
        coordinator
            .nodes
            .sweep_liveness(chrono::Duration::seconds(-1));
        assert_eq!(coordinator.nodes.get("n1").unwrap().status, NodeStatus::Offline);

        coordinator.register_node("n1".into(), "n1:8080".into(), vec![], false, 4);

        let mut saw_registered = 0;
        let mut saw_online = 0;
        while let Ok(event) = rx.try_recv() {
            match event {
                ClusterEvent::NodeRegistered { .. } => saw_registered += 1,
                ClusterEvent::NodeOnline { .. } => saw_online += 1,
                _ => {}
            }
        }
        assert_eq!(saw_registered, 2);
        assert_eq!(saw_online, 1);
    }

    #[test]
    fn submit_without_online_nodes_floors_wait_at_300s() {
        let coordinator = Coordinator::new_for_test(MockOutcome::Success(serde_json::json!({})));
        let (_, wait) = coordinator.submit_job(JobType::Thread, JobPriority::Normal, serde_json::json!({}), false);
        assert_eq!(wait, 300.0);
    }

    #[test]
    fn heartbeat_for_unknown_node_returns_false() {
        let coordinator = Coordinator::new_for_test(MockOutcome::Success(serde_json::json!({})));
        assert!(!coordinator.heartbeat("ghost", 0.1));
    }

    #[test]
    fn non_gpu_job_uses_30s_floor_even_with_a_gpu_node_online() {
        let coordinator = Coordinator::new_for_test(MockOutcome::Success(serde_json::json!({})));
        coordinator.register_node("n1".into(), "n1:8080".into(), vec![], true, 4);
        let (_, wait) = coordinator.submit_job(JobType::Thread, JobPriority::Normal, serde_json::json!({}), false);
        assert_eq!(wait, 30.0);
    }

    #[test]
    fn gpu_preferred_job_uses_10s_floor_when_a_gpu_node_is_online() {
        let coordinator = Coordinator::new_for_test(MockOutcome::Success(serde_json::json!({})));
        coordinator.register_node("n1".into(), "n1:8080".into(), vec![], true, 4);
        let (_, wait) = coordinator.submit_job(JobType::Thread, JobPriority::Normal, serde_json::json!({}), true);
        assert_eq!(wait, 10.0);
    }
}
