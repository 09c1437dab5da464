// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The worker's side of the "execute job" contract.
//!
//! The actual compute kernels (thread-walk simulation, Collatz iteration) are
//! explicitly out of scope: this crate only defines the trait a worker
//! dispatches to and a reference executor that can stand in for them in
//! tests and demos.

use crate::model::Job;
use async_trait::async_trait;
use std::time::Duration;

/// Executes one job and returns its opaque result payload, or an error the
/// worker's HTTP layer turns into a non-2xx response.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(&self, job: &Job) -> anyhow::Result<serde_json::Value>;
}

/// Reference executor standing in for the real thread-walk/Collatz kernels.
/// Echoes the submitted parameters back as the result after a short simulated
/// delay, so the dispatch pipeline has something concrete to exercise
/// end-to-end without pulling in a real numeric kernel.
#[derive(Debug, Default)]
pub struct ReferenceExecutor {
    simulated_latency: Duration,
}

impl ReferenceExecutor {
    pub fn new() -> Self {
        Self { simulated_latency: Duration::from_millis(50) }
    }

    pub fn with_latency(simulated_latency: Duration) -> Self {
        Self { simulated_latency }
    }
}

#[async_trait]
impl JobExecutor for ReferenceExecutor {
    async fn execute(&self, job: &Job) -> anyhow::Result<serde_json::Value> {
        tokio::time::sleep(self.simulated_latency).await;
        Ok(serde_json::json!({
            "ok": true,
            "job_type": job.job_type,
            "echo": job.parameters,
        }))
    }
}
