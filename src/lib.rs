//! Posture Guard: real-time sitting posture monitoring
//!
//! Turns per-frame facial and shoulder landmarks (from an external detector)
//! into posture verdicts and timed warnings.
//!
//! ## Architecture
//!
//! - **Estimation**: head pose from a perspective solve against a generic 3D
//!   face model, viewing distance from pupil separation, shoulder tilt
//! - **Baseline**: the user's own upright posture, captured on request
//! - **Classifier**: baseline-relative deviations against thresholds
//! - **Stability**: median smoothing and good/bad debouncing
//! - **Warning**: bad-run timing, warning schedule, streak statistics
//! - **Pipeline / API**: one session per stream, over stdin or WebSocket

pub mod api;
pub mod baseline;
pub mod classifier;
pub mod config;
pub mod estimation;
pub mod pipeline;
pub mod protocol;
pub mod stability;
pub mod synthetic;
pub mod types;
pub mod warning;

// Re-export commonly used types
pub use types::{
    FrameInput, FrameResult, IssueKind, Landmark, LandmarkSet, PoseMeasurement, PostureError,
    PostureStatistics, PostureStatus, PostureVerdict, Thresholds,
};

pub use baseline::{Baseline, BaselineCalibrator, BaselineError};
pub use classifier::{PostureClassifier, ThresholdHandle};
pub use config::PostureConfig;
pub use estimation::PoseEstimator;
pub use pipeline::{PostureSession, ProcessingLoop, SessionSettings};
pub use protocol::{ClientMessage, ServerMessage};
pub use warning::WarningStateMachine;
