//! Shared data structures for landmark-based posture monitoring
//!
//! This module defines the core types flowing through the per-frame pipeline:
//! - Input: `FrameInput` carrying facial and (optional) body `LandmarkSet`s
//! - Estimation: `PoseMeasurement` (pitch / yaw / roll / distance / shoulder tilt)
//! - Classification: `Thresholds`, `IssueKind`, `PostureVerdict`
//! - Output: `FrameResult` and the `PostureStatistics` snapshot

mod error;
mod landmarks;
mod measurement;
mod result;
pub mod thresholds;
mod verdict;

pub use error::*;
pub use landmarks::*;
pub use measurement::*;
pub use result::*;
pub use thresholds::*;
pub use verdict::*;
