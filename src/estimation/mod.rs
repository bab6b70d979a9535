//! Landmark-to-measurement estimators
//!
//! Three independent estimators run on every frame:
//! - `HeadPoseEstimator` - pitch/yaw/roll from a perspective pose solve
//! - `DistanceEstimator` - camera distance from pupil separation
//! - `ShoulderTiltEstimator` - shoulder line angle (optional body input)
//!
//! Each one fails on its own. A failed estimator leaves its dimensions empty
//! in the `PoseMeasurement` and the others still report.

mod camera;
mod distance;
pub mod euler;
mod face_model;
mod head_pose;
pub mod pnp;
mod shoulder;

pub use camera::{CameraIntrinsics, IntrinsicsCache};
pub use distance::{DistanceEstimator, AVERAGE_IPD_CM};
pub use euler::{normalize_pitch, rotation_to_euler, EulerAngles};
pub use face_model::{FaceModel3D, MODEL_LANDMARKS};
pub use head_pose::{HeadPose, HeadPoseEstimator};
pub use pnp::{solve_pnp, PnpOptions, PnpSolution};
pub use shoulder::{ShoulderTiltEstimator, MIN_SHOULDER_VISIBILITY};

use tracing::debug;

use crate::types::{FrameInput, PoseMeasurement, PostureError};

/// One frame's measurement plus the reasons for any missing dimensions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameEstimate {
    pub measurement: PoseMeasurement,
    /// First failure among the face estimators (head pose, distance)
    pub face_error: Option<PostureError>,
    /// Shoulder failure; expected whenever no body model is running
    pub shoulder_error: Option<PostureError>,
}

/// Runs all estimators for a frame, caching intrinsics across frames.
#[derive(Debug, Clone, Default)]
pub struct PoseEstimator {
    head: HeadPoseEstimator,
    distance: DistanceEstimator,
    shoulder: ShoulderTiltEstimator,
    intrinsics: IntrinsicsCache,
}

impl PoseEstimator {
    pub fn new(min_shoulder_visibility: f64) -> Self {
        Self {
            shoulder: ShoulderTiltEstimator::new(min_shoulder_visibility),
            ..Self::default()
        }
    }

    pub fn estimate(&mut self, frame: &FrameInput) -> FrameEstimate {
        let camera = match self.intrinsics.get(frame.width, frame.height) {
            Ok(camera) => camera,
            Err(e) => {
                return FrameEstimate {
                    measurement: PoseMeasurement::default(),
                    face_error: Some(e.clone()),
                    shoulder_error: Some(e),
                }
            }
        };

        let mut measurement = PoseMeasurement::default();
        let mut face_error = None;

        match frame.face.as_ref() {
            Some(face) => {
                match self.head.estimate(face, &camera) {
                    Ok(pose) => {
                        measurement.pitch = Some(pose.pitch);
                        measurement.yaw = Some(pose.yaw);
                        measurement.roll = Some(pose.roll);
                    }
                    Err(e) => face_error = Some(e),
                }
                match self.distance.estimate(face, &camera) {
                    Ok(d) => measurement.distance = Some(d),
                    Err(e) => {
                        face_error.get_or_insert(e);
                    }
                }
            }
            None => face_error = Some(PostureError::missing("no face detected")),
        }

        let shoulder_error = match self.shoulder.estimate(frame.body.as_ref(), &camera) {
            Ok(tilt) => {
                measurement.shoulder_tilt = Some(tilt);
                None
            }
            Err(e) => Some(e),
        };

        if let Some(e) = &face_error {
            debug!(error = %e, "Face estimate incomplete");
        }

        FrameEstimate {
            measurement,
            face_error,
            shoulder_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{SyntheticFrameBuilder, SyntheticPose};

    #[test]
    fn test_missing_body_still_measures_face() {
        let frame = SyntheticFrameBuilder::new(640, 480).build(&SyntheticPose::upright(60.0));
        let estimate = PoseEstimator::default().estimate(&frame);

        assert!(estimate.face_error.is_none());
        assert!(estimate.measurement.pitch.is_some());
        assert!((estimate.measurement.distance.unwrap() - 60.0).abs() < 1e-6);
        assert!(estimate.measurement.shoulder_tilt.is_none());
        assert!(matches!(
            estimate.shoulder_error,
            Some(PostureError::MissingLandmarks { .. })
        ));
    }

    #[test]
    fn test_no_face_is_reported() {
        let frame = FrameInput {
            width: 640,
            height: 480,
            ..FrameInput::default()
        };
        let estimate = PoseEstimator::default().estimate(&frame);
        assert!(!estimate.measurement.has_face());
        assert!(estimate.face_error.is_some());
    }

    #[test]
    fn test_zero_sized_frame_is_degenerate() {
        let estimate = PoseEstimator::default().estimate(&FrameInput::default());
        assert!(matches!(
            estimate.face_error,
            Some(PostureError::DegenerateGeometry(_))
        ));
    }
}
