//! `cluster coordinator`: run the coordinator process.

use clap::Args;
use cluster_core::config::CoordinatorConfig;
use cluster_core::coordinator::Coordinator;
use cluster_core::worker_client::HttpWorkerClient;
use std::sync::Arc;

#[derive(Args)]
pub struct CoordinatorArgs {
    /// Override `COORDINATOR_PORT` for this run.
    #[arg(long)]
    port: Option<u16>,
}

pub async fn execute(args: CoordinatorArgs) -> anyhow::Result<()> {
    let mut config = CoordinatorConfig::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }

    tracing::info!(port = config.port, "starting coordinator");
    let coordinator = Coordinator::new(config, Arc::new(HttpWorkerClient::new()));
    coordinator.spawn_background_tasks();
    cluster_core::api::serve(coordinator).await
}
