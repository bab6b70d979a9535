//! Processing Pipeline Module
//!
//! ```text
//! MessageSource ─▶ ProcessingLoop ─▶ PostureSession::handle ─▶ MessageSink
//!   (stdin / ws)        │                 │
//!                  cancellation      estimate → smooth → classify
//!                                    → debounce → warn
//! ```
//!
//! One [`PostureSession`] per input stream; sessions share nothing.

pub mod processing_loop;
mod session;
pub mod source;

pub use processing_loop::{ProcessingLoop, SessionSummary};
pub use session::{PostureSession, SessionSettings};
pub use source::{MessageEvent, MessageSink, MessageSource};
