//! WebSocket transport: one `PostureSession` per connection.
//!
//! ```text
//!   socket ──split──▶ WsSource ─▶ ProcessingLoop ─▶ WsSink ─▶ mpsc ─▶ writer task ─▶ socket
//! ```
//!
//! The outbound queue is bounded; a client that stops reading backs up its
//! own session and nobody else's.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::atomic::Ordering;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::envelope::ApiErrorResponse;
use super::ApiState;
use crate::config::defaults::WS_OUTBOUND_BUFFER;
use crate::pipeline::source::parse_message;
use crate::pipeline::{
    MessageEvent, MessageSink, MessageSource, PostureSession, ProcessingLoop, SessionSettings,
};
use crate::protocol::ServerMessage;

/// GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ApiState>) -> Response {
    if state.cancel_token.is_cancelled() {
        return ApiErrorResponse::service_unavailable("Server is shutting down");
    }
    ws.on_upgrade(move |socket| run_connection(socket, state))
}

/// Drive one session over `socket` until either side closes.
pub async fn run_connection(socket: WebSocket, state: ApiState) {
    let (sender, receiver) = socket.split();
    let (tx, rx) = mpsc::channel(WS_OUTBOUND_BUFFER);
    let writer = tokio::spawn(write_outbound(sender, rx));

    let session = PostureSession::new(SessionSettings::from_config(&state.config));
    let session_id = session.id();
    let active = state.active_sessions.fetch_add(1, Ordering::Relaxed) + 1;
    info!(session = %session_id, active_sessions = active, "[WebSocket] Client connected");

    let mut source = WsSource { receiver };
    let mut sink = WsSink { tx };
    let summary = ProcessingLoop::new(session, state.cancel_token.child_token())
        .run(&mut source, &mut sink)
        .await;

    // Closing the queue lets the writer flush and close the socket.
    drop(sink);
    if let Err(e) = writer.await {
        warn!(session = %session_id, "[WebSocket] Writer task failed: {}", e);
    }

    let active = state.active_sessions.fetch_sub(1, Ordering::Relaxed) - 1;
    info!(
        session = %session_id,
        frames = summary.frames_processed,
        active_sessions = active,
        "[WebSocket] Client disconnected"
    );
}

async fn write_outbound(
    mut sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<ServerMessage>,
) {
    while let Some(message) = rx.recv().await {
        let text = match message.to_json() {
            Ok(text) => text,
            Err(e) => {
                warn!("[WebSocket] Failed to encode reply: {}", e);
                continue;
            }
        };
        if sender.send(Message::Text(text)).await.is_err() {
            return;
        }
    }
    let _ = sender.close().await;
}

// ============================================================================
// Source / Sink
// ============================================================================

struct WsSource {
    receiver: SplitStream<WebSocket>,
}

#[async_trait]
impl MessageSource for WsSource {
    async fn next_message(&mut self) -> Result<MessageEvent> {
        loop {
            let message = match self.receiver.next().await {
                None => return Ok(MessageEvent::Eof),
                Some(Err(e)) => return Err(anyhow!("WebSocket receive error: {}", e)),
                Some(Ok(message)) => message,
            };
            match message {
                Message::Text(text) => return Ok(parse_message(&text)),
                Message::Binary(bytes) => {
                    return Ok(match std::str::from_utf8(&bytes) {
                        Ok(text) => parse_message(text),
                        Err(e) => MessageEvent::Invalid(format!("binary frame is not UTF-8: {e}")),
                    });
                }
                Message::Close(_) => return Ok(MessageEvent::Eof),
                // axum answers pings itself
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    }

    fn source_name(&self) -> &str {
        "ws"
    }
}

struct WsSink {
    tx: mpsc::Sender<ServerMessage>,
}

#[async_trait]
impl MessageSink for WsSink {
    async fn send(&mut self, message: &ServerMessage) -> Result<()> {
        self.tx
            .send(message.clone())
            .await
            .map_err(|_| anyhow!("WebSocket writer closed"))
    }
}
