// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Liveness Monitor: demotes nodes whose last heartbeat has aged past the timeout.

use crate::coordinator::Coordinator;
use crate::events::ClusterEvent;
use chrono::Duration as ChronoDuration;
use std::sync::Arc;
use tracing::info;

/// Runs the liveness sweep on the configured cadence until the process exits.
pub async fn run(coordinator: Arc<Coordinator>) {
    let mut ticker = tokio::time::interval(coordinator.config.liveness_sweep_interval);
    let timeout = ChronoDuration::from_std(coordinator.config.liveness_timeout).unwrap_or(ChronoDuration::seconds(60));
    loop {
        ticker.tick().await;
        let demoted = coordinator.nodes.sweep_liveness(timeout);
        if !demoted.is_empty() {
            info!(count = demoted.len(), "liveness sweep demoted nodes");
        }
        for node_id in demoted {
            coordinator.events.publish(ClusterEvent::NodeOffline { node_id });
        }
    }
}
