//! Baseline Module - the user's reference "good posture"
//!
//! A `Baseline` is captured once from a single `PoseMeasurement` when the user
//! asks to calibrate. It is replaced as a whole or not at all: a capture that
//! lacks pitch or distance is refused and leaves the previous baseline intact.
//!
//! ## Usage
//!
//! ```ignore
//! let baseline = BaselineCalibrator::capture(&measurement, Utc::now())?;
//! let adjusted = baseline.adjust(&next_measurement);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{AdjustedMeasurement, PoseMeasurement};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BaselineError {
    #[error("Cannot calibrate: head pitch not measured (is a face visible?)")]
    MissingPitch,

    #[error("Cannot calibrate: distance not measured (are both pupils visible?)")]
    MissingDistance,

    #[error("Cannot calibrate: no frame has been measured yet")]
    NoMeasurement,
}

/// Absolute measurements at calibration time. All four fields are always set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub pitch: f64,
    pub roll: f64,
    pub distance: f64,
    pub shoulder_tilt: f64,
    pub calibrated_at: DateTime<Utc>,
}

impl Baseline {
    /// Express `m` relative to this baseline, dimension by dimension.
    pub fn adjust(&self, m: &PoseMeasurement) -> AdjustedMeasurement {
        AdjustedMeasurement {
            pitch: m.pitch.map(|p| p - self.pitch),
            roll: m.roll.map(|r| r - self.roll),
            distance: m.distance.map(|d| d - self.distance),
            shoulder_tilt: m.shoulder_tilt.map(|s| s - self.shoulder_tilt),
        }
    }
}

/// Turns a measurement into a `Baseline`, or refuses.
pub struct BaselineCalibrator;

impl BaselineCalibrator {
    /// Pitch and distance are required. Roll and shoulder tilt default to 0.
    pub fn capture(m: &PoseMeasurement, at: DateTime<Utc>) -> Result<Baseline, BaselineError> {
        let pitch = m.pitch.ok_or(BaselineError::MissingPitch)?;
        let distance = m.distance.ok_or(BaselineError::MissingDistance)?;
        Ok(Baseline {
            pitch,
            roll: m.roll.unwrap_or(0.0),
            distance,
            shoulder_tilt: m.shoulder_tilt.unwrap_or(0.0),
            calibrated_at: at,
        })
    }
}
