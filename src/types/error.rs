//! Per-frame error taxonomy
//!
//! Every variant is local to one frame and one estimator. None of them stop
//! the pipeline: the affected dimension is reported as "no measurement" and
//! the next frame starts from scratch.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PostureError {
    /// Required landmark points were not delivered by the detector.
    #[error("Missing landmarks: {what}")]
    MissingLandmarks { what: String },

    /// The perspective pose solve did not produce a usable rotation.
    #[error("Pose solve failed: {0}")]
    PoseSolveFailed(String),

    /// A zero or near-zero denominator in a geometric calculation.
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Classification requested before any successful calibration.
    #[error("No baseline: calibrate good posture first")]
    NoBaseline,
}

impl PostureError {
    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingLandmarks { what: what.into() }
    }
}
