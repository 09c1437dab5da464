// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Job Store: the authoritative id -> job mapping, split into an active map and a
//! bounded terminal (completed-or-failed) map with disjoint keyspaces.
//!
//! Completed and failed jobs both land in the terminal map so the retention
//! sweeper can bound both the same way, rather than leaving failures to
//! accumulate in the active map forever.

use crate::model::{Job, JobId};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct JobStore {
    active: RwLock<HashMap<JobId, Job>>,
    terminal: RwLock<HashMap<JobId, Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly submitted job into the active map.
    pub fn insert(&self, job: Job) {
        self.active.write().insert(job.id.clone(), job);
    }

    /// Look up a job by id, checking active then terminal.
    pub fn get(&self, job_id: &str) -> Option<Job> {
        if let Some(job) = self.active.read().get(job_id) {
            return Some(job.clone());
        }
        self.terminal.read().get(job_id).cloned()
    }

    /// Mutate an active job in place. No-op if the job is not active (e.g. already
    /// terminal) — terminal jobs are immutable except for eviction.
    pub fn update_active(&self, job_id: &str, f: impl FnOnce(&mut Job)) {
        if let Some(job) = self.active.write().get_mut(job_id) {
            f(job);
        }
    }

    /// Move a job from active to terminal. Returns the moved job, or `None` if it
    /// was not present in the active map.
    pub fn move_to_terminal(&self, job_id: &str) -> Option<Job> {
        let job = self.active.write().remove(job_id)?;
        self.terminal.write().insert(job_id.to_string(), job.clone());
        Some(job)
    }

    /// Evict terminal jobs whose `terminal_at()` is older than `max_age`. Active
    /// and assigned jobs are never touched.
    pub fn sweep_retention(&self, max_age: chrono::Duration) -> usize {
        let now = chrono::Utc::now();
        let mut terminal = self.terminal.write();
        let before = terminal.len();
        terminal.retain(|_, job| match job.terminal_at() {
            Some(at) => now - at <= max_age,
            None => true,
        });
        before - terminal.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.read().len()
    }

    pub fn terminal_count(&self) -> usize {
        self.terminal.read().len()
    }

    /// Snapshot of every active job, for diagnostics and tests.
    pub fn list_active(&self) -> Vec<Job> {
        self.active.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JobPriority, JobType};

    fn job(id: &str) -> Job {
        Job::new(id.into(), JobType::Thread, JobPriority::Normal, serde_json::json!({}), false)
    }

    #[test]
    fn active_and_terminal_keyspaces_are_disjoint() {
        let store = JobStore::new();
        store.insert(job("job-1"));
        store.update_active("job-1", |j| j.mark_completed(serde_json::json!({"ok": true})));
        let moved = store.move_to_terminal("job-1").unwrap();
        assert!(moved.is_terminal());
        assert_eq!(store.active_count(), 0);
        assert_eq!(store.terminal_count(), 1);
        assert!(store.get("job-1").is_some());
    }

    #[test]
    fn retention_sweep_evicts_only_old_terminal_jobs() {
        let store = JobStore::new();
        let mut j = job("job-1");
        j.mark_completed(serde_json::json!({}));
        j.completed_at = Some(chrono::Utc::now() - chrono::Duration::hours(2));
        store.terminal.write().insert("job-1".into(), j);

        let mut j2 = job("job-2");
        j2.mark_completed(serde_json::json!({}));
        store.terminal.write().insert("job-2".into(), j2);

        let evicted = store.sweep_retention(chrono::Duration::seconds(3600));
        assert_eq!(evicted, 1);
        assert!(store.get("job-1").is_none());
        assert!(store.get("job-2").is_some());
    }

    #[test]
    fn failed_jobs_move_to_terminal_store_too() {
        let store = JobStore::new();
        store.insert(job("job-1"));
        store.update_active("job-1", |j| {
            j.mark_assigned("n1".into());
            j.mark_failed("boom");
        });
        let moved = store.move_to_terminal("job-1").unwrap();
        assert_eq!(moved.terminal_kind(), crate::model::TerminalKind::Failed);
        assert_eq!(store.active_count(), 0);
    }
}
