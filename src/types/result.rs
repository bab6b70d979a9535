use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AdjustedMeasurement, IssueKind, PoseMeasurement, PostureStatus};

/// Per-frame output record handed to the transport / UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    /// Frame time used for all duration bookkeeping
    pub timestamp: DateTime<Utc>,
    /// Debounced status fed to the warning state machine
    pub status: PostureStatus,
    pub is_bad: bool,
    /// Why the frame could not be fully evaluated, if it couldn't
    pub error: Option<String>,

    pub pitch: Option<f64>,
    pub yaw: Option<f64>,
    pub roll: Option<f64>,
    pub distance: Option<f64>,
    pub shoulder_tilt: Option<f64>,

    pub adjusted_pitch: Option<f64>,
    pub adjusted_roll: Option<f64>,
    pub adjusted_distance: Option<f64>,
    pub adjusted_shoulder_tilt: Option<f64>,

    /// Whole seconds of the current bad run
    pub bad_duration: u64,
    pub should_warn: bool,
    pub message: Option<String>,
    /// Violated dimensions detected this frame
    pub issues: Vec<IssueKind>,
}

impl FrameResult {
    pub fn measurement(&self) -> PoseMeasurement {
        PoseMeasurement {
            pitch: self.pitch,
            yaw: self.yaw,
            roll: self.roll,
            distance: self.distance,
            shoulder_tilt: self.shoulder_tilt,
        }
    }

    pub fn adjusted(&self) -> AdjustedMeasurement {
        AdjustedMeasurement {
            pitch: self.adjusted_pitch,
            roll: self.adjusted_roll,
            distance: self.adjusted_distance,
            shoulder_tilt: self.adjusted_shoulder_tilt,
        }
    }
}

/// Read-only snapshot of session-long posture bookkeeping (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PostureStatistics {
    pub total_bad_duration: f64,
    pub longest_bad_streak: f64,
    pub longest_good_streak: f64,
    pub current_bad_duration: u64,
}
