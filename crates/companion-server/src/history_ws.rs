//! Live history feed over WebSocket.
//!
//! Each client gets the full history on connect and again after every change
//! to the interaction store. Intermediate snapshots may be skipped when
//! changes arrive faster than the client reads; the latest always arrives.

use crate::state::AppState;
use anyhow::Result;
use axum::extract::ws::{Message, WebSocket};
use companion_types::{Interaction, WsServerMessage};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;

fn encode(msg: &WsServerMessage) -> Result<Message> {
    Ok(Message::Text(serde_json::to_string(msg)?.into()))
}

fn snapshot_message(interactions: Vec<Interaction>) -> Result<Message> {
    encode(&WsServerMessage::HistorySnapshot { interactions })
}

fn error_message(code: &str, message: impl Into<String>) -> Result<Message> {
    encode(&WsServerMessage::Error {
        code: code.to_string(),
        message: message.into(),
    })
}

/// Handle a history WebSocket connection until either side closes.
pub async fn handle_history_websocket(socket: WebSocket, state: Arc<AppState>) -> Result<()> {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut snapshot_rx = state.interactions.subscribe();

    tracing::info!(target: "companion::ws", "History WebSocket client connected");

    let mut send_task = tokio::spawn(async move {
        loop {
            let snapshot = snapshot_rx.borrow_and_update().clone();
            let msg = match snapshot_message(snapshot) {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!(target: "companion::ws", "Failed to encode snapshot: {}", e);
                    if let Ok(msg) = error_message("snapshot_failed", e.to_string()) {
                        let _ = ws_tx.send(msg).await;
                    }
                    break;
                }
            };
            if ws_tx.send(msg).await.is_err() {
                tracing::debug!(target: "companion::ws", "History WebSocket client disconnected");
                break;
            }
            // Store dropped: nothing more will arrive
            if snapshot_rx.changed().await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            match msg {
                Message::Close(_) => {
                    tracing::debug!(target: "companion::ws", "History WebSocket client closed connection");
                    break;
                }
                Message::Ping(_) => {
                    tracing::trace!(target: "companion::ws", "Received ping");
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    tracing::info!(target: "companion::ws", "History WebSocket client disconnected");
    Ok(())
}
