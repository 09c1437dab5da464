// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Dispatcher: the long-running control loop that drains the queue set, selects a
//! node, issues the worker execute RPC, and resolves completion/failure.

use crate::coordinator::Coordinator;
use crate::events::ClusterEvent;
use crate::model::QueueClass;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Runs the dispatch loop until the process exits. Never returns on its own;
/// internal errors are logged and the loop continues: a background loop must
/// never terminate the process.
pub async fn run(coordinator: Arc<Coordinator>) {
    loop {
        match coordinator.queues.pop_next() {
            Some((class, job_id)) => {
                if let Err(err) = dispatch_one(&coordinator, class, &job_id).await {
                    error!(job_id = %job_id, error = %err, "dispatch iteration failed, continuing");
                }
            }
            None => {
                tokio::time::sleep(coordinator.config.dispatch_poll_interval).await;
            }
        }
    }
}

async fn dispatch_one(coordinator: &Arc<Coordinator>, class: QueueClass, job_id: &str) -> anyhow::Result<()> {
    let Some(job) = coordinator.jobs.get(job_id) else {
        warn!(job_id, "dequeued job id missing from job store, dropping");
        return Ok(());
    };

    let Some(node) = coordinator.nodes.select_node(job.gpu_preferred) else {
        debug!(job_id, "no eligible node, re-enqueuing after backoff");
        coordinator.queues.requeue(class, job_id.to_string());
        tokio::time::sleep(coordinator.config.dispatch_backoff).await;
        return Ok(());
    };

    coordinator.jobs.update_active(job_id, |j| j.mark_assigned(node.id.clone()));
    info!(job_id, node_id = %node.id, "job assigned");

    let job = coordinator.jobs.get(job_id).expect("just updated");
    match coordinator.worker_client.execute(&node.address, &job, coordinator.config.worker_rpc_timeout).await {
        Ok(result) => handle_completion(coordinator, job_id, &node.id, result),
        Err(err) => handle_failure(coordinator, job_id, err.to_string()),
    }

    Ok(())
}

fn handle_completion(coordinator: &Arc<Coordinator>, job_id: &str, node_id: &str, result: serde_json::Value) {
    coordinator.jobs.update_active(job_id, |j| j.mark_completed(result));
    let Some(job) = coordinator.jobs.move_to_terminal(job_id) else {
        return;
    };
    let execution_time = job.execution_time.unwrap_or(0.0);
    coordinator.nodes.record_completion(node_id, execution_time);
    let node_gpu_enabled = coordinator.nodes.get(node_id).map(|n| n.gpu_enabled).unwrap_or(false);
    coordinator.stats.write().record_completion(execution_time, node_gpu_enabled);

    info!(job_id, node_id, execution_time, "job completed");
    coordinator.events.publish(ClusterEvent::JobCompleted { job });
}

fn handle_failure(coordinator: &Arc<Coordinator>, job_id: &str, error: String) {
    coordinator.jobs.update_active(job_id, |j| j.mark_failed(error.clone()));
    let Some(job) = coordinator.jobs.move_to_terminal(job_id) else {
        return;
    };

    warn!(job_id, error = %error, "job failed");
    coordinator.events.publish(ClusterEvent::JobFailed { job });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker_client::MockOutcome;

    #[tokio::test]
    async fn failure_moves_job_to_terminal_store_not_left_active() {
        let coordinator = Coordinator::new_for_test(MockOutcome::Fail("boom".into()));
        let job_id = coordinator.submit_thread_job();
        coordinator.nodes.register(crate::model::Node::from_registration(
            "n1".into(),
            "n1:8080".into(),
            vec![],
            false,
            4,
        ));

        let (class, id) = coordinator.queues.pop_next().unwrap();
        dispatch_one(&coordinator, class, &id).await.unwrap();

        assert_eq!(coordinator.jobs.active_count(), 0);
        let job = coordinator.jobs.get(&job_id).unwrap();
        assert_eq!(job.status, crate::model::JobStatus::Failed);
    }

    #[tokio::test]
    async fn no_eligible_node_requeues_to_same_class() {
        let coordinator = Coordinator::new_for_test(MockOutcome::Success(serde_json::json!({})));
        coordinator.submit_thread_job();

        let (class, id) = coordinator.queues.pop_next().unwrap();
        tokio::time::pause();
        dispatch_one(&coordinator, class, &id).await.unwrap();
        tokio::time::advance(coordinator.config.dispatch_backoff).await;

        assert_eq!(coordinator.queues.depths().thread, 1);
    }
}
