use super::camera::CameraIntrinsics;
use crate::types::{body_pose, Landmark, LandmarkSet, PostureError};

/// Default minimum shoulder landmark visibility.
pub const MIN_SHOULDER_VISIBILITY: f64 = 0.4;

/// Lateral shoulder-line angle from the two shoulder landmarks.
///
/// The angle is measured from the image-left shoulder to the image-right one
/// with y pointing up, so level shoulders read 0° and a raised image-right
/// shoulder reads positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShoulderTiltEstimator {
    pub min_visibility: f64,
}

impl Default for ShoulderTiltEstimator {
    fn default() -> Self {
        Self {
            min_visibility: MIN_SHOULDER_VISIBILITY,
        }
    }
}

impl ShoulderTiltEstimator {
    pub fn new(min_visibility: f64) -> Self {
        Self { min_visibility }
    }

    pub fn estimate(
        &self,
        body: Option<&LandmarkSet>,
        camera: &CameraIntrinsics,
    ) -> Result<f64, PostureError> {
        let body = body.ok_or_else(|| PostureError::missing("body landmarks"))?;
        let (Some(left), Some(right)) = (
            body.get(body_pose::LEFT_SHOULDER),
            body.get(body_pose::RIGHT_SHOULDER),
        ) else {
            return Err(PostureError::missing("shoulder landmarks"));
        };
        if !self.is_visible(left) || !self.is_visible(right) {
            return Err(PostureError::missing("shoulders below visibility threshold"));
        }

        let (a, b) = {
            let (l, r) = (camera.to_pixels(left), camera.to_pixels(right));
            if l.x <= r.x {
                (l, r)
            } else {
                (r, l)
            }
        };
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
            return Err(PostureError::DegenerateGeometry(
                "shoulder landmarks coincide".to_string(),
            ));
        }

        Ok((-dy).atan2(dx).to_degrees())
    }

    /// Points without a visibility score count as visible.
    fn is_visible(&self, landmark: &Landmark) -> bool {
        landmark.visibility.map_or(true, |v| v >= self.min_visibility)
    }
}
