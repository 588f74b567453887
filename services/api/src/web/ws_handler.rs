//! services/api/src/web/ws_handler.rs
//!
//! The event stream: a WebSocket that mirrors the store to the client.
//! It pushes a snapshot on connect, another after every commit, and every
//! toast as it is emitted.

use crate::web::{protocol::ServerMessage, state::AppState};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New event stream connection established");

    let (mut sender, mut receiver) = socket.split();
    let mut state_rx = app_state.store.subscribe();
    let mut toast_rx = app_state.notifier.subscribe();

    // --- 1. Initial State ---
    let initial = ServerMessage::Snapshot {
        state: state_rx.borrow_and_update().clone(),
    };
    if send(&mut sender, &initial).await.is_err() {
        warn!("Client disconnected before the initial snapshot was sent.");
        return;
    }

    // --- 2. Main Loop ---
    loop {
        let outgoing = tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                ServerMessage::Snapshot { state }
            }
            toast = toast_rx.recv() => match toast {
                Ok(notification) => ServerMessage::Notification { notification },
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream lagged, {} toasts dropped", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    warn!("Event stream receive error: {}", e);
                    break;
                }
            },
        };

        if send(&mut sender, &outgoing).await.is_err() {
            break;
        }
    }

    info!("Event stream connection closed");
}

async fn send(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            return Ok(());
        }
    };
    sender.send(Message::Text(json.into())).await
}
