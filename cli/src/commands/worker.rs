//! `cluster worker`: run a worker node against a coordinator.

use clap::Args;
use cluster_core::config::WorkerConfig;
use cluster_core::executor::ReferenceExecutor;
use cluster_core::worker::Worker;
use std::sync::Arc;

#[derive(Args)]
pub struct WorkerArgs {
    /// Override `NODE_ID` for this run.
    #[arg(long)]
    node_id: Option<String>,

    /// Override `COORDINATOR_URL` for this run.
    #[arg(long)]
    coordinator_url: Option<String>,

    /// Override `WORKER_PORT` for this run.
    #[arg(long)]
    port: Option<u16>,
}

pub async fn execute(args: WorkerArgs) -> anyhow::Result<()> {
    let mut config = WorkerConfig::from_env();
    if let Some(node_id) = args.node_id {
        config.node_id = node_id;
    }
    if let Some(coordinator_url) = args.coordinator_url {
        config.coordinator_url = coordinator_url;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    tracing::info!(node_id = %config.node_id, coordinator_url = %config.coordinator_url, "starting worker");
    let worker = Worker::new(config, Arc::new(ReferenceExecutor::new()));
    worker.run().await
}
