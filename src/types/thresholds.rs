//! Classification thresholds and their default values

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default sensitivity for each posture dimension
pub mod posture_thresholds {
    /// Pitch below baseline that counts as looking down (deg, one-sided)
    pub const PITCH_DEG: f64 = -10.0;
    /// Distance closer than baseline that counts as leaning in (cm, one-sided)
    pub const DISTANCE_CM: f64 = 10.0;
    /// Head roll away from baseline in either direction (deg)
    pub const ROLL_DEG: f64 = 15.0;
    /// Shoulder tilt away from baseline in either direction (deg)
    pub const SHOULDER_TILT_DEG: f64 = 10.0;
}

/// Sensitivity configuration applied on every classification call.
///
/// Pitch and distance are one-sided (only looking down / only leaning closer
/// count). Roll and shoulder tilt are symmetric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Adjusted pitch below this is bad (deg, normally negative)
    pub pitch: f64,
    /// Baseline distance minus current distance above this is bad (cm)
    pub distance: f64,
    /// Absolute adjusted roll above this is bad (deg)
    pub roll: f64,
    /// Absolute adjusted shoulder tilt above this is bad (deg)
    pub shoulder_tilt: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            pitch: posture_thresholds::PITCH_DEG,
            distance: posture_thresholds::DISTANCE_CM,
            roll: posture_thresholds::ROLL_DEG,
            shoulder_tilt: posture_thresholds::SHOULDER_TILT_DEG,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("Threshold '{0}' must be a finite number (got {1})")]
    NonFinite(&'static str, f64),
}

impl Thresholds {
    /// Only finiteness is enforced; any finite value is accepted as-is.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        for (name, value) in [
            ("pitch", self.pitch),
            ("distance", self.distance),
            ("roll", self.roll),
            ("shoulder_tilt", self.shoulder_tilt),
        ] {
            if !value.is_finite() {
                return Err(ThresholdError::NonFinite(name, value));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let t = Thresholds::default();
        assert_eq!(t.pitch, -10.0);
        assert_eq!(t.distance, 10.0);
        assert_eq!(t.roll, 15.0);
        assert_eq!(t.shoulder_tilt, 10.0);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn test_non_finite_rejected() {
        let t = Thresholds {
            roll: f64::INFINITY,
            ..Thresholds::default()
        };
        assert_eq!(
            t.validate(),
            Err(ThresholdError::NonFinite("roll", f64::INFINITY))
        );
    }

    #[test]
    fn test_unusual_but_finite_values_accepted() {
        let t = Thresholds {
            pitch: 5.0,
            distance: -3.0,
            roll: 0.0,
            shoulder_tilt: 1000.0,
        };
        assert!(t.validate().is_ok());
    }
}
