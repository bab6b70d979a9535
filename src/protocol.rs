//! Wire protocol: JSON messages tagged by `"type"`.
//!
//! Client → server: `frame`, `calibrate`, `set_thresholds`, `set_sensitivity`,
//! `get_statistics`, `reset`. Server → client: `result`, `calibrated`,
//! `thresholds_updated`, `statistics`, `reset_done`, `error`.

use serde::{Deserialize, Serialize};

use crate::baseline::Baseline;
use crate::config::SensitivityLevels;
use crate::types::{FrameInput, FrameResult, PostureStatistics, Thresholds};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// One frame of detector output
    Frame { frame: FrameInput },
    /// Capture the baseline from `frame`, or from the last measured frame
    Calibrate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        frame: Option<FrameInput>,
    },
    SetThresholds { thresholds: Thresholds },
    SetSensitivity { levels: SensitivityLevels },
    GetStatistics,
    /// Restart timing and statistics; baseline and thresholds are kept
    Reset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Result(FrameResult),
    Calibrated {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        baseline: Option<Baseline>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    ThresholdsUpdated { thresholds: Thresholds },
    Statistics(PostureStatistics),
    ResetDone,
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
