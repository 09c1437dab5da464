// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Retention Sweeper: bounds coordinator memory by evicting terminal job records
//! older than the retention horizon.

use crate::coordinator::Coordinator;
use chrono::Duration as ChronoDuration;
use std::sync::Arc;
use tracing::debug;

/// Runs the retention sweep on the configured cadence until the process exits.
pub async fn run(coordinator: Arc<Coordinator>) {
    let mut ticker = tokio::time::interval(coordinator.config.retention_sweep_interval);
    let max_age =
        ChronoDuration::from_std(coordinator.config.retention_max_age).unwrap_or(ChronoDuration::seconds(3600));
    loop {
        ticker.tick().await;
        let evicted = coordinator.jobs.sweep_retention(max_age);
        if evicted > 0 {
            debug!(evicted, "retention sweep evicted terminal job records");
        }
    }
}
