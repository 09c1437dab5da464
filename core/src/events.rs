// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Event Bus: in-process fan-out of state-change events to push subscribers.
//!
//! Built on a bounded `tokio::sync::broadcast` channel. A slow subscriber that falls
//! behind the channel's capacity silently misses the oldest unread events rather
//! than blocking the publisher (the Dispatcher and monitors must never stall on a
//! slow observer); a subscriber whose socket write actually fails is dropped by its
//! own connection task rather than retried.

use crate::model::{ClusterStats, Job, Node};
use serde::Serialize;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 1024;

/// One state-change notification pushed to every subscriber.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClusterEvent {
    /// Sent once, immediately on subscription, with the full cluster snapshot.
    InitialStatus {
        nodes: Vec<Node>,
        stats: ClusterStats,
    },
    /// A node registered (first time or idempotent re-registration).
    NodeRegistered { node: Node },
    /// A node transitioned `offline -> online`.
    NodeOnline { node: Node },
    /// A node transitioned `online -> offline` via the Liveness Monitor.
    NodeOffline { node_id: String },
    /// A job reached `completed`.
    JobCompleted { job: Job },
    /// A job reached `failed`.
    JobFailed { job: Job },
}

/// Broadcast handle shared by every task that can emit or observe cluster events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ClusterEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an event to all current subscribers. No-op (not an error) if there
    /// are none — emission must never block on consumers.
    pub fn publish(&self, event: ClusterEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to the stream. Callers should immediately send an `InitialStatus`
    /// snapshot before forwarding further events — the bus itself doesn't know the
    /// current state to construct one.
    pub fn subscribe(&self) -> broadcast::Receiver<ClusterEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Job, JobPriority, JobType};

    #[tokio::test]
    async fn subscriber_receives_published_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        let job = Job::new("job-1".into(), JobType::Thread, JobPriority::Normal, serde_json::json!({}), false);
        bus.publish(ClusterEvent::JobCompleted { job });

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ClusterEvent::JobCompleted { .. }));
    }

    #[test]
    fn publish_without_subscribers_does_not_error() {
        let bus = EventBus::new();
        bus.publish(ClusterEvent::NodeOffline { node_id: "n1".into() });
    }
}
