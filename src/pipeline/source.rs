//! Message source and sink abstractions.
//!
//! A session is driven by a stream of [`ClientMessage`]s and answers with
//! [`ServerMessage`]s. Where they come from (stdin JSON lines, a WebSocket,
//! a scripted replay) is hidden behind [`MessageSource`] / [`MessageSink`].

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt};

use crate::protocol::{ClientMessage, ServerMessage};

/// Events produced by a message source.
#[derive(Debug)]
pub enum MessageEvent {
    /// A well-formed client message.
    Message(ClientMessage),
    /// Input that could not be parsed; carries the parse error text.
    Invalid(String),
    /// No more input (EOF, or the peer closed the connection).
    Eof,
}

/// Where client messages come from.
///
/// The processing loop calls [`next_message`](MessageSource::next_message)
/// inside a `select!` with cancellation; a read interrupted by shutdown may
/// drop a partially received message.
#[async_trait]
pub trait MessageSource: Send {
    async fn next_message(&mut self) -> Result<MessageEvent>;

    /// Human-readable name for logging (e.g. "stdin", "ws").
    fn source_name(&self) -> &str;
}

/// Where server replies go.
#[async_trait]
pub trait MessageSink: Send {
    async fn send(&mut self, message: &ServerMessage) -> Result<()>;
}

/// Parse one JSON text message into an event.
pub fn parse_message(line: &str) -> MessageEvent {
    match serde_json::from_str::<ClientMessage>(line) {
        Ok(message) => MessageEvent::Message(message),
        Err(e) => MessageEvent::Invalid(e.to_string()),
    }
}

// ============================================================================
// Stdin Source (JSON messages, one per line)
// ============================================================================

/// Reads JSON client messages from stdin, one per line.
///
/// Used with the simulation harness:
/// `cargo run --bin simulation | posture-guard --stdin`
pub struct StdinSource {
    reader: tokio::io::BufReader<tokio::io::Stdin>,
    line_buffer: String,
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

impl StdinSource {
    pub fn new() -> Self {
        Self {
            reader: tokio::io::BufReader::new(tokio::io::stdin()),
            line_buffer: String::with_capacity(8192),
        }
    }
}

#[async_trait]
impl MessageSource for StdinSource {
    async fn next_message(&mut self) -> Result<MessageEvent> {
        loop {
            self.line_buffer.clear();
            let bytes = self.reader.read_line(&mut self.line_buffer).await?;
            if bytes == 0 {
                return Ok(MessageEvent::Eof);
            }
            let line = self.line_buffer.trim();
            if line.is_empty() {
                continue;
            }
            return Ok(parse_message(line));
        }
    }

    fn source_name(&self) -> &str {
        "stdin"
    }
}

// ============================================================================
// Replay Source (pre-built messages)
// ============================================================================

/// Replays pre-built messages with an optional inter-message delay.
pub struct ReplaySource {
    messages: std::vec::IntoIter<ClientMessage>,
    delay_ms: u64,
    yielded_first: bool,
}

impl ReplaySource {
    pub fn new(messages: Vec<ClientMessage>, delay_ms: u64) -> Self {
        Self {
            messages: messages.into_iter(),
            delay_ms,
            yielded_first: false,
        }
    }
}

#[async_trait]
impl MessageSource for ReplaySource {
    async fn next_message(&mut self) -> Result<MessageEvent> {
        if self.yielded_first && self.delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.delay_ms)).await;
        }
        match self.messages.next() {
            Some(m) => {
                self.yielded_first = true;
                Ok(MessageEvent::Message(m))
            }
            None => Ok(MessageEvent::Eof),
        }
    }

    fn source_name(&self) -> &str {
        "replay"
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Writes each reply as one JSON line on stdout.
pub struct StdoutSink {
    stdout: tokio::io::Stdout,
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self {
            stdout: tokio::io::stdout(),
        }
    }
}

#[async_trait]
impl MessageSink for StdoutSink {
    async fn send(&mut self, message: &ServerMessage) -> Result<()> {
        let mut line = message.to_json()?;
        line.push('\n');
        self.stdout.write_all(line.as_bytes()).await?;
        self.stdout.flush().await?;
        Ok(())
    }
}

/// Collects replies in memory.
#[derive(Debug, Default)]
pub struct VecSink {
    pub messages: Vec<ServerMessage>,
}

#[async_trait]
impl MessageSink for VecSink {
    async fn send(&mut self, message: &ServerMessage) -> Result<()> {
        self.messages.push(message.clone());
        Ok(())
    }
}
