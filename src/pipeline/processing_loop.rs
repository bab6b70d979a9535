//! Message processing loop shared by every transport.
//!
//! Stdin mode and each WebSocket connection run the same
//! source -> session -> sink loop; only the source and sink differ.

use chrono::Utc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::session::PostureSession;
use super::source::{MessageEvent, MessageSink, MessageSource};
use crate::protocol::ServerMessage;
use crate::types::PostureStatistics;

/// Final counters of a finished loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub messages_handled: u64,
    pub invalid_messages: u64,
    pub frames_processed: u64,
    pub statistics: PostureStatistics,
}

/// Owns one session for the lifetime of one input stream.
pub struct ProcessingLoop {
    session: PostureSession,
    cancel_token: CancellationToken,
}

impl ProcessingLoop {
    pub fn new(session: PostureSession, cancel_token: CancellationToken) -> Self {
        Self {
            session,
            cancel_token,
        }
    }

    /// Run until the source is exhausted, the sink fails, or cancellation.
    pub async fn run<S, K>(mut self, source: &mut S, sink: &mut K) -> SessionSummary
    where
        S: MessageSource + ?Sized,
        K: MessageSink + ?Sized,
    {
        let mut messages_handled = 0u64;
        let mut invalid_messages = 0u64;

        info!(
            session = %self.session.id(),
            "[ProcessingLoop] Reading messages from {}",
            source.source_name()
        );

        loop {
            let event = tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => {
                    info!("[ProcessingLoop] Shutdown signal received");
                    break;
                }
                result = source.next_message() => {
                    match result {
                        Ok(ev) => ev,
                        Err(e) => {
                            warn!("[ProcessingLoop] Source error: {}", e);
                            break;
                        }
                    }
                }
            };

            let reply = match event {
                MessageEvent::Message(message) => {
                    messages_handled += 1;
                    self.session.handle(message, Utc::now())
                }
                MessageEvent::Invalid(reason) => {
                    invalid_messages += 1;
                    warn!("[ProcessingLoop] Skipping malformed message: {}", reason);
                    ServerMessage::error(format!("Invalid message: {}", reason))
                }
                MessageEvent::Eof => {
                    debug!("[ProcessingLoop] {} reached end of input", source.source_name());
                    break;
                }
            };

            if let Err(e) = sink.send(&reply).await {
                warn!("[ProcessingLoop] Sink error, closing session: {}", e);
                break;
            }
        }

        let summary = SessionSummary {
            session_id: self.session.id(),
            messages_handled,
            invalid_messages,
            frames_processed: self.session.frames_processed(),
            statistics: self.session.statistics(),
        };
        info!(
            session = %summary.session_id,
            messages = summary.messages_handled,
            invalid = summary.invalid_messages,
            frames = summary.frames_processed,
            total_bad_secs = summary.statistics.total_bad_duration,
            "[ProcessingLoop] Session finished"
        );
        summary
    }
}
