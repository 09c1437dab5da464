// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! End-to-end scenarios, grounded in the literal values of the dispatch
//! pipeline's testable properties: job submission through a real HTTP worker
//! mock, across the happy path, GPU preference, priority-class ordering,
//! liveness demotion, and worker failure.

use async_trait::async_trait;
use cluster_core::config::CoordinatorConfig;
use cluster_core::coordinator::Coordinator;
use cluster_core::events::ClusterEvent;
use cluster_core::model::{Job, JobPriority, JobStatus, JobType};
use cluster_core::worker_client::{HttpWorkerClient, WorkerClient};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config() -> CoordinatorConfig {
    let mut config = CoordinatorConfig::from_env();
    config.dispatch_poll_interval = Duration::from_millis(10);
    config.dispatch_backoff = Duration::from_millis(20);
    config.liveness_timeout = Duration::from_millis(150);
    config.liveness_sweep_interval = Duration::from_millis(30);
    config
}

async fn wait_until<F: Fn() -> bool>(f: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if f() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Records the order jobs were sent to `/api/execute`, then always succeeds.
/// Stands in for a real worker so priority ordering can be asserted without
/// racing a real HTTP mock.
#[derive(Clone, Default)]
struct RecordingWorkerClient {
    order: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl WorkerClient for RecordingWorkerClient {
    async fn execute(&self, _address: &str, job: &Job, _timeout: Duration) -> anyhow::Result<serde_json::Value> {
        self.order.lock().unwrap().push(job.id.clone());
        Ok(serde_json::json!({"ok": true}))
    }
}

#[tokio::test]
async fn scenario_1_happy_path_updates_stats_and_execution_time() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/execute"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(100))
                .set_body_json(serde_json::json!({"ok": true, "value": 42})),
        )
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(fast_config(), Arc::new(HttpWorkerClient::new()));
    coordinator.spawn_background_tasks();
    coordinator.register_node("n1".into(), server.uri(), vec![], false, 4);

    let (job_id, _wait) =
        coordinator.submit_job(JobType::Thread, JobPriority::Normal, serde_json::json!({"n": 1}), false);

    let completed = wait_until(
        || matches!(coordinator.jobs.get(&job_id).map(|j| j.status), Some(JobStatus::Completed)),
        Duration::from_secs(3),
    )
    .await;
    assert!(completed, "job never completed");

    let job = coordinator.jobs.get(&job_id).unwrap();
    assert!(job.execution_time.unwrap() >= 0.0);
    assert_eq!(job.result.unwrap()["value"], 42);

    let snapshot = coordinator.status_snapshot();
    assert_eq!(snapshot.stats.total_calculations, 1);
    assert_eq!(snapshot.stats.cpu_calculations, 1);
    assert_eq!(snapshot.stats.gpu_calculations, 0);
}

#[tokio::test]
async fn scenario_2_gpu_preference_picks_gpu_node_despite_higher_load() {
    let coordinator = Coordinator::new(fast_config(), Arc::new(RecordingWorkerClient::default()));
    coordinator.register_node("n1".into(), "n1:8080".into(), vec![], false, 4);
    coordinator.register_node("n2".into(), "n2:8080".into(), vec![], true, 4);
    coordinator.heartbeat("n1", 0.1);
    coordinator.heartbeat("n2", 0.5);

    let selected = coordinator.nodes.select_node(true).unwrap();
    assert_eq!(selected.id, "n2");
}

#[tokio::test]
async fn scenario_3_no_gpu_available_falls_back_to_cpu_node() {
    let coordinator = Coordinator::new(fast_config(), Arc::new(RecordingWorkerClient::default()));
    coordinator.register_node("n1".into(), "n1:8080".into(), vec![], false, 4);

    let selected = coordinator.nodes.select_node(true).unwrap();
    assert_eq!(selected.id, "n1");
}

#[tokio::test]
async fn scenario_4_priority_preempts_class_order() {
    let client = RecordingWorkerClient::default();
    let coordinator = Coordinator::new(fast_config(), Arc::new(client.clone()));

    // No node registered yet: all three jobs sit in their queues untouched.
    let (t1, _) = coordinator.submit_job(JobType::Thread, JobPriority::Normal, serde_json::json!({}), false);
    let (p1, _) = coordinator.submit_job(JobType::Thread, JobPriority::High, serde_json::json!({}), false);
    let (c1, _) = coordinator.submit_job(JobType::Collatz, JobPriority::Normal, serde_json::json!({}), false);

    coordinator.spawn_background_tasks();
    coordinator.register_node("n1".into(), "n1:8080".into(), vec![], false, 4);

    let all_dispatched = wait_until(|| client.order.lock().unwrap().len() == 3, Duration::from_secs(3)).await;
    assert!(all_dispatched, "not all three jobs dispatched");

    let order = client.order.lock().unwrap().clone();
    assert_eq!(order, vec![p1, c1, t1]);
}

#[tokio::test]
async fn scenario_5_liveness_demotion_emits_exactly_one_node_offline() {
    let coordinator = Coordinator::new(fast_config(), Arc::new(RecordingWorkerClient::default()));
    let mut rx = coordinator.events.subscribe();
    coordinator.spawn_background_tasks();

    coordinator.register_node("n1".into(), "n1:8080".into(), vec![], false, 4);

    let demoted = wait_until(
        || coordinator.nodes.get("n1").map(|n| n.status == cluster_core::model::NodeStatus::Offline).unwrap_or(false),
        Duration::from_secs(2),
    )
    .await;
    assert!(demoted, "node was never demoted");

    let mut offline_events = 0;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, ClusterEvent::NodeOffline { ref node_id } if node_id == "n1") {
            offline_events += 1;
        }
    }
    assert_eq!(offline_events, 1);
}

#[tokio::test]
async fn scenario_6_worker_failure_marks_job_failed_without_demoting_node() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/execute"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(fast_config(), Arc::new(HttpWorkerClient::new()));
    coordinator.spawn_background_tasks();
    coordinator.register_node("n1".into(), server.uri(), vec![], false, 4);

    let (job_id, _) = coordinator.submit_job(JobType::Thread, JobPriority::Normal, serde_json::json!({}), false);

    let failed = wait_until(
        || matches!(coordinator.jobs.get(&job_id).map(|j| j.status), Some(JobStatus::Failed)),
        Duration::from_secs(3),
    )
    .await;
    assert!(failed, "job never failed");

    let job = coordinator.jobs.get(&job_id).unwrap();
    assert!(job.error.is_some());
    assert_eq!(coordinator.status_snapshot().stats.total_calculations, 0);
    assert_eq!(coordinator.nodes.get("n1").unwrap().status, cluster_core::model::NodeStatus::Online);
}
