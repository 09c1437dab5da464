// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The three strict-order FIFO queues.
//!
//! Unlike a single priority heap, these queues never reorder jobs within a class:
//! `priority` is drained first, then `collatz`, then `thread`, and each is plain
//! submission-order FIFO. A dequeued job that finds no eligible node is re-enqueued
//! at the tail of its own class rather than dropped or promoted.

use crate::model::{JobId, QueueClass, QueueDepths};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Three independent FIFO queues, one per class, drained in strict class order.
#[derive(Default)]
pub struct QueueSet {
    priority: Mutex<VecDeque<JobId>>,
    collatz: Mutex<VecDeque<JobId>>,
    thread: Mutex<VecDeque<JobId>>,
}

impl QueueSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue_for(&self, class: QueueClass) -> &Mutex<VecDeque<JobId>> {
        match class {
            QueueClass::Priority => &self.priority,
            QueueClass::Collatz => &self.collatz,
            QueueClass::Thread => &self.thread,
        }
    }

    /// Push a job id to the tail of its class queue.
    pub fn push(&self, class: QueueClass, job_id: JobId) {
        self.queue_for(class).lock().push_back(job_id);
    }

    /// Inspect `priority`, then `collatz`, then `thread`, popping the first
    /// non-empty queue's head. Returns the class it came from alongside the id so
    /// the caller can re-enqueue to the same class on a failed dispatch attempt.
    pub fn pop_next(&self) -> Option<(QueueClass, JobId)> {
        for class in [QueueClass::Priority, QueueClass::Collatz, QueueClass::Thread] {
            if let Some(id) = self.queue_for(class).lock().pop_front() {
                return Some((class, id));
            }
        }
        None
    }

    /// Re-enqueue at the tail of the given class (used when node selection fails).
    pub fn requeue(&self, class: QueueClass, job_id: JobId) {
        self.push(class, job_id);
    }

    /// Current depth of each queue, for `/api/status`.
    pub fn depths(&self) -> QueueDepths {
        QueueDepths {
            priority: self.priority.lock().len(),
            collatz: self.collatz.lock().len(),
            thread: self.thread.lock().len(),
        }
    }
}
