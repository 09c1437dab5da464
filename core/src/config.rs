// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Environment-driven configuration.
//!
//! There is no config file and no persisted state; every knob is a single
//! environment variable read once at startup. This is intentionally lighter than a
//! layered `config`-crate loader — four env vars per process don't warrant one.

use std::env;
use std::time::Duration;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key).ok().as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}

/// Coordinator process configuration, sourced entirely from the environment.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Advisory expected cluster size; not enforced anywhere, surfaced for operators.
    pub cluster_size: u32,
    /// Advisory default for whether the cluster is expected to have GPU nodes.
    pub gpu_enabled: bool,
    /// Port the HTTP frontend binds to.
    pub port: u16,
    /// Reserved for a future metrics exporter; unused today.
    pub metrics_port: u16,
    /// Node liveness timeout. Default 60s.
    pub liveness_timeout: Duration,
    /// Liveness Monitor sweep cadence. Default 30s.
    pub liveness_sweep_interval: Duration,
    /// Retention horizon for terminal jobs. Default 1h.
    pub retention_max_age: Duration,
    /// Retention Sweeper cadence. Default 5m.
    pub retention_sweep_interval: Duration,
    /// Dispatcher poll interval when all queues are empty. Default 1s.
    pub dispatch_poll_interval: Duration,
    /// Dispatcher back-off after a failed node-selection attempt. Default 5s.
    pub dispatch_backoff: Duration,
    /// Worker execute RPC deadline. Default 300s.
    pub worker_rpc_timeout: Duration,
}

impl CoordinatorConfig {
    /// Load from environment variables, falling back to the documented defaults.
    pub fn from_env() -> Self {
        Self {
            cluster_size: env_or("CLUSTER_SIZE", 3),
            gpu_enabled: env_bool("GPU_ENABLED", true),
            port: env_or("COORDINATOR_PORT", 3000),
            metrics_port: env_or("METRICS_PORT", 9090),
            liveness_timeout: Duration::from_secs(60),
            liveness_sweep_interval: Duration::from_secs(30),
            retention_max_age: Duration::from_secs(3600),
            retention_sweep_interval: Duration::from_secs(300),
            dispatch_poll_interval: Duration::from_secs(1),
            dispatch_backoff: Duration::from_secs(5),
            worker_rpc_timeout: Duration::from_secs(300),
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Worker-side GPU detection mode, mirroring the `auto`/`true`/`false` tri-state
/// from the reference worker implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuMode {
    Auto,
    ForceOn,
    ForceOff,
}

/// Worker process configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub node_id: String,
    pub node_type: String,
    pub coordinator_url: String,
    pub worker_threads: u32,
    pub gpu_mode: GpuMode,
    pub port: u16,
    pub heartbeat_interval: Duration,
    /// Host the coordinator should dial to reach this worker's `/api/execute`.
    /// Defaults to `node_id`, which is resolvable on the cluster network;
    /// `0.0.0.0` (the bind address) is never a valid value here since it is a
    /// wildcard, not a destination.
    pub advertise_host: String,
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        let gpu_mode = match env::var("GPU_ENABLED").ok().as_deref() {
            Some("true") => GpuMode::ForceOn,
            Some("false") => GpuMode::ForceOff,
            _ => GpuMode::Auto,
        };
        let node_id = env::var("NODE_ID").unwrap_or_else(|_| "worker-1".to_string());
        let advertise_host = env::var("ADVERTISE_HOST").unwrap_or_else(|_| node_id.clone());
        Self {
            node_id,
            node_type: env::var("NODE_TYPE").unwrap_or_else(|_| "worker".to_string()),
            coordinator_url: env::var("COORDINATOR_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            worker_threads: env_or("WORKER_THREADS", num_cpus::get() as u32),
            gpu_mode,
            port: env_or("WORKER_PORT", 8080),
            heartbeat_interval: Duration::from_secs(30),
            advertise_host,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinator_defaults_use_documented_values() {
        let cfg = CoordinatorConfig {
            cluster_size: 3,
            gpu_enabled: true,
            port: 3000,
            metrics_port: 9090,
            ..CoordinatorConfig::from_env()
        };
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.liveness_timeout, Duration::from_secs(60));
        assert_eq!(cfg.retention_max_age, Duration::from_secs(3600));
    }

    #[test]
    fn worker_port_defaults_to_8080() {
        let cfg = WorkerConfig::from_env();
        assert_eq!(cfg.port, 8080);
    }
}
