// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket handler for conversational sessions.
//!
//! Client -> Server (JSON):
//! ```json
//! {"content": "any jazz concerts this weekend?"}
//! ```
//!
//! Server -> Client (JSON):
//! ```json
//! {"type": "text_delta", "text": "partial..."}
//! {"type": "message_complete", "content": "full reply"}
//! ```
//!
//! Each connection gets its own [`ConversationSession`]; the greeting is
//! pushed as soon as the socket upgrades, before any client frame arrives.

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use usher_core::{ReplySink, UsherError};

use crate::serve::AppState;

/// WebSocket message from client.
#[derive(Debug, Deserialize)]
struct WsIncoming {
    content: String,
}

/// WebSocket message type constants for server -> client messages.
pub mod message_types {
    /// Partial text content.
    pub const TEXT_DELTA: &str = "text_delta";
    /// Complete message.
    pub const MESSAGE_COMPLETE: &str = "message_complete";
}

/// Sends reply frames to one WebSocket client through an mpsc channel.
///
/// A dedicated task owns the socket's write half; this sink only serializes
/// frames and queues them, so the session never blocks on a slow client
/// beyond the channel's buffer.
struct WsSink {
    tx: mpsc::Sender<String>,
}

impl WsSink {
    async fn send(&self, frame: serde_json::Value) -> Result<(), UsherError> {
        self.tx
            .send(frame.to_string())
            .await
            .map_err(|_| UsherError::Internal("websocket client disconnected".to_string()))
    }
}

#[async_trait]
impl ReplySink for WsSink {
    async fn send_chunk(&self, text: &str) -> Result<(), UsherError> {
        self.send(serde_json::json!({
            "type": message_types::TEXT_DELTA,
            "text": text,
        }))
        .await
    }

    async fn send_complete(&self, content: &str) -> Result<(), UsherError> {
        self.send(serde_json::json!({
            "type": message_types::MESSAGE_COMPLETE,
            "content": content,
        }))
        .await
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection.
///
/// Spawns a sender task that forwards queued frames to the socket's write
/// half, then drives one conversation session from the read loop.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (tx, mut rx) = mpsc::channel::<String>(64);
    let sender_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    let sink = std::sync::Arc::new(WsSink { tx });
    let mut session =
        usher_agent::ConversationSession::new(state.deps.clone(), state.opts.clone(), sink);

    debug!("websocket connected");
    if session.open().await.is_err() {
        sender_task.abort();
        return;
    }

    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => {
                let text_str: &str = &text;
                let incoming: WsIncoming = match serde_json::from_str(text_str) {
                    Ok(v) => v,
                    Err(e) => {
                        warn!("invalid websocket message: {e}");
                        continue;
                    }
                };

                if let Err(e) = session.handle_message(&incoming.content).await {
                    warn!(error = %e, "session turn failed");
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {} // Ignore binary, ping (handled by tungstenite layer)
        }
    }

    session.close();
    sender_task.abort();
    debug!("websocket disconnected");
}
