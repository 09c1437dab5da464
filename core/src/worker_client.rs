// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The coordinator's side of the worker execute RPC: `POST /api/execute`.
//!
//! Abstracted behind a trait so the dispatcher can be exercised against a mock in
//! tests without a real worker process; production code talks over `reqwest`.

use crate::model::Job;
use async_trait::async_trait;
use std::time::Duration;

/// Issues the `POST /api/execute` call against a worker's address and interprets
/// the response: any 2xx with a well-formed body is success,
/// anything else (non-2xx, network error, timeout, malformed body) is failure.
#[async_trait]
pub trait WorkerClient: Send + Sync {
    async fn execute(&self, address: &str, job: &Job, timeout: Duration) -> anyhow::Result<serde_json::Value>;
}

/// Production implementation: a real HTTP POST to the worker's `/api/execute`.
pub struct HttpWorkerClient {
    client: reqwest::Client,
}

impl HttpWorkerClient {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl Default for HttpWorkerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkerClient for HttpWorkerClient {
    async fn execute(&self, address: &str, job: &Job, timeout: Duration) -> anyhow::Result<serde_json::Value> {
        let url = worker_execute_url(address);
        let response = self
            .client
            .post(&url)
            .json(job)
            .timeout(timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("worker returned status {}", response.status());
        }

        let body: serde_json::Value = response.json().await?;
        if !body.is_object() {
            anyhow::bail!("worker returned a malformed result payload");
        }
        Ok(body)
    }
}

fn worker_execute_url(address: &str) -> String {
    if address.starts_with("http://") || address.starts_with("https://") {
        format!("{address}/api/execute")
    } else {
        format!("http://{address}/api/execute")
    }
}

/// Canned outcome for the mock client used in dispatcher unit tests.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Success(serde_json::Value),
    Fail(String),
}

/// Test double standing in for a real worker process.
pub struct MockWorkerClient {
    outcome: MockOutcome,
}

impl MockWorkerClient {
    pub fn new(outcome: MockOutcome) -> Self {
        Self { outcome }
    }
}

#[async_trait]
impl WorkerClient for MockWorkerClient {
    async fn execute(&self, _address: &str, _job: &Job, _timeout: Duration) -> anyhow::Result<serde_json::Value> {
        match &self.outcome {
            MockOutcome::Success(value) => Ok(value.clone()),
            MockOutcome::Fail(msg) => anyhow::bail!("{msg}"),
        }
    }
}
