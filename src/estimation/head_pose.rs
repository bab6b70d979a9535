use nalgebra::Point2;

use super::camera::CameraIntrinsics;
use super::euler::{normalize_pitch, rotation_to_euler};
use super::face_model::FaceModel3D;
use super::pnp::{solve_pnp, PnpOptions};
use crate::types::{LandmarkSet, PostureError};

/// Head orientation in degrees. Negative pitch is looking down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadPose {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

/// Pitch/yaw/roll from six facial landmarks and a fixed face model.
#[derive(Debug, Clone, Default)]
pub struct HeadPoseEstimator {
    model: FaceModel3D,
    options: PnpOptions,
}

impl HeadPoseEstimator {
    pub fn new(model: FaceModel3D, options: PnpOptions) -> Self {
        Self { model, options }
    }

    pub fn estimate(
        &self,
        face: &LandmarkSet,
        camera: &CameraIntrinsics,
    ) -> Result<HeadPose, PostureError> {
        let indices = self.model.landmark_indices();
        let missing: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| face.get(i).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(PostureError::missing(format!("face points {:?}", missing)));
        }

        let image: Vec<Point2<f64>> = indices
            .iter()
            .filter_map(|&i| face.get(i))
            .map(|lm| camera.to_pixels(lm))
            .collect();

        let solution = solve_pnp(self.model.points(), &image, camera, &self.options)?;
        let raw = rotation_to_euler(solution.rotation.matrix());

        Ok(HeadPose {
            pitch: normalize_pitch(raw.pitch),
            yaw: raw.yaw,
            roll: raw.roll,
        })
    }
}
