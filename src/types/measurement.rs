use serde::{Deserialize, Serialize};

/// One frame's raw estimate. Each field is `None` when its estimator had no
/// usable input this frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseMeasurement {
    /// Head pitch relative to looking straight ahead (degrees, negative = down)
    pub pitch: Option<f64>,
    /// Head yaw (degrees)
    pub yaw: Option<f64>,
    /// Head roll (degrees)
    pub roll: Option<f64>,
    /// Eye-to-camera distance (cm)
    pub distance: Option<f64>,
    /// Shoulder line angle (degrees, positive = image-right shoulder higher,
    /// which is the subject's left in an unmirrored frame)
    pub shoulder_tilt: Option<f64>,
}

impl PoseMeasurement {
    /// True when any face-derived dimension is present.
    pub fn has_face(&self) -> bool {
        self.pitch.is_some() || self.distance.is_some()
    }
}

/// Measurement expressed as `current - baseline` per dimension.
///
/// A negative `distance` means the user is closer than at calibration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AdjustedMeasurement {
    pub pitch: Option<f64>,
    pub roll: Option<f64>,
    pub distance: Option<f64>,
    pub shoulder_tilt: Option<f64>,
}
