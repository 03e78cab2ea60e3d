//! WebSocket message protocol for the live history feed.

use serde::{Deserialize, Serialize};

use crate::Interaction;

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsServerMessage {
    /// Full history, newest first. Sent on connect and after every change.
    HistorySnapshot { interactions: Vec<Interaction> },
    /// Error notification.
    Error { code: String, message: String },
}
