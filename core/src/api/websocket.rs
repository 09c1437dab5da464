// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `GET /ws`: push channel delivering `initial_status` followed by
//! the live event stream. At-most-once, best-effort: a subscriber that falls
//! behind the broadcast channel's capacity silently misses the oldest unread
//! events, and one whose socket write fails is dropped without retry.

use super::AppState;
use crate::events::ClusterEvent;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use tracing::debug;

pub async fn upgrade(ws: WebSocketUpgrade, State(coordinator): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, coordinator))
}

async fn handle_socket(mut socket: WebSocket, coordinator: AppState) {
    let mut events = coordinator.events.subscribe();

    let snapshot = coordinator.status_snapshot();
    let initial = ClusterEvent::InitialStatus { nodes: snapshot.nodes, stats: snapshot.stats };
    if send(&mut socket, &initial).await.is_err() {
        return;
    }

    loop {
        match events.recv().await {
            Ok(event) => {
                if send(&mut socket, &event).await.is_err() {
                    debug!("subscriber socket write failed, dropping");
                    return;
                }
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "subscriber lagged, oldest events dropped");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
        }
    }
}

async fn send(socket: &mut WebSocket, event: &ClusterEvent) -> Result<(), axum::Error> {
    let text = serde_json::to_string(event).expect("ClusterEvent always serializes");
    socket.send(Message::Text(text)).await
}
