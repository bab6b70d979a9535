use super::camera::CameraIntrinsics;
use crate::types::{face_mesh, LandmarkSet, PostureError};

/// Average adult interpupillary distance (cm).
pub const AVERAGE_IPD_CM: f64 = 6.3;

/// Pupil separation (px) below which the distance is undefined.
const MIN_PIXEL_SEPARATION: f64 = 1e-6;

/// Eye-to-camera distance from pupil separation, by similar triangles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceEstimator {
    pub ipd_cm: f64,
}

impl Default for DistanceEstimator {
    fn default() -> Self {
        Self {
            ipd_cm: AVERAGE_IPD_CM,
        }
    }
}

impl DistanceEstimator {
    /// Distance in cm: `focal_length / pixel_separation * ipd`.
    pub fn estimate(
        &self,
        face: &LandmarkSet,
        camera: &CameraIntrinsics,
    ) -> Result<f64, PostureError> {
        let (Some(right), Some(left)) = (
            face.get(face_mesh::RIGHT_PUPIL),
            face.get(face_mesh::LEFT_PUPIL),
        ) else {
            return Err(PostureError::missing("pupil landmarks"));
        };

        let separation = (camera.to_pixels(left) - camera.to_pixels(right)).norm();
        if separation < MIN_PIXEL_SEPARATION {
            return Err(PostureError::DegenerateGeometry(
                "pupil landmarks coincide".to_string(),
            ));
        }

        Ok(camera.focal_length / separation * self.ipd_cm)
    }
}
