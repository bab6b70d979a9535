//! Synthetic landmark frames
//!
//! Projects the face model through a known head pose so the whole pipeline can
//! be driven without a camera or detector. Used by the `simulation` binary and
//! by tests that need frames with exact ground truth.

use nalgebra::{Point2, Point3, Rotation3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::estimation::{CameraIntrinsics, FaceModel3D, AVERAGE_IPD_CM};
use crate::types::{body_pose, face_mesh, FrameInput, Landmark, LandmarkSet};

/// Face model units per centimeter of camera distance.
const MODEL_UNITS_PER_CM: f64 = 45.0;

/// Shoulder midpoint in normalized coordinates.
const SHOULDER_CENTER: (f64, f64) = (0.5, 0.8);

/// Half the shoulder span as a fraction of frame width.
const SHOULDER_HALF_SPAN: f64 = 0.2;

const SHOULDER_VISIBILITY: f64 = 0.99;

/// Ground-truth pose for a generated frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyntheticPose {
    /// Degrees, negative = looking down
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
    pub distance_cm: f64,
    /// Degrees; `None` generates a frame without body landmarks
    pub shoulder_tilt: Option<f64>,
}

impl SyntheticPose {
    /// Looking straight at the camera from `distance_cm`, no body landmarks.
    pub fn upright(distance_cm: f64) -> Self {
        Self {
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            distance_cm,
            shoulder_tilt: None,
        }
    }

    pub fn with_shoulders(mut self, tilt: f64) -> Self {
        self.shoulder_tilt = Some(tilt);
        self
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticFrameBuilder {
    camera: CameraIntrinsics,
    model: FaceModel3D,
}

impl SyntheticFrameBuilder {
    /// Frames of `width` x `height`. Zero dimensions are bumped to 1.
    pub fn new(width: u32, height: u32) -> Self {
        let camera = CameraIntrinsics {
            width: width.max(1),
            height: height.max(1),
            focal_length: f64::from(width.max(1)),
            cx: f64::from(width.max(1)) / 2.0,
            cy: f64::from(height.max(1)) / 2.0,
        };
        Self {
            camera,
            model: FaceModel3D::default(),
        }
    }

    pub fn build(&self, pose: &SyntheticPose) -> FrameInput {
        let mut face = LandmarkSet::with_len(face_mesh::LANDMARK_COUNT);

        let rotation = Rotation3::from_euler_angles(
            std::f64::consts::PI - pose.pitch.to_radians(),
            pose.yaw.to_radians(),
            pose.roll.to_radians(),
        );
        let translation = Vector3::new(0.0, 0.0, pose.distance_cm * MODEL_UNITS_PER_CM);

        let mut projected = Vec::with_capacity(self.model.points().len());
        for (point, &index) in self
            .model
            .points()
            .iter()
            .zip(self.model.landmark_indices())
        {
            let cam: Point3<f64> = rotation * point + translation;
            let px = self.camera.project(&cam).unwrap_or_else(|| {
                Point2::new(self.camera.cx, self.camera.cy)
            });
            face.set(index, self.normalize(px));
            projected.push((index, px));
        }

        let eye = |wanted: usize| {
            projected
                .iter()
                .find(|(i, _)| *i == wanted)
                .map_or(Point2::new(self.camera.cx, self.camera.cy), |(_, p)| *p)
        };
        let image_left = eye(face_mesh::RIGHT_EYE_OUTER);
        let image_right = eye(face_mesh::LEFT_EYE_OUTER);
        let middle = nalgebra::center(&image_left, &image_right);
        let axis = (image_right - image_left)
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector2::x);
        let half_separation =
            self.camera.focal_length * AVERAGE_IPD_CM / pose.distance_cm.max(f64::EPSILON) / 2.0;
        face.set(
            face_mesh::RIGHT_PUPIL,
            self.normalize(middle - axis * half_separation),
        );
        face.set(
            face_mesh::LEFT_PUPIL,
            self.normalize(middle + axis * half_separation),
        );

        FrameInput {
            timestamp_ms: None,
            width: self.camera.width,
            height: self.camera.height,
            face: Some(face),
            body: pose.shoulder_tilt.map(|tilt| self.shoulders(tilt)),
        }
    }

    /// Same as `build`, stamped with `timestamp_ms`.
    pub fn build_at(&self, pose: &SyntheticPose, timestamp_ms: i64) -> FrameInput {
        FrameInput {
            timestamp_ms: Some(timestamp_ms),
            ..self.build(pose)
        }
    }

    fn shoulders(&self, tilt: f64) -> LandmarkSet {
        let width = f64::from(self.camera.width);
        let height = f64::from(self.camera.height);
        let center = Point2::new(SHOULDER_CENTER.0 * width, SHOULDER_CENTER.1 * height);
        let half = SHOULDER_HALF_SPAN * width;
        let offset = Vector2::new(tilt.to_radians().cos(), -tilt.to_radians().sin()) * half;

        let mut body = LandmarkSet::with_len(body_pose::LANDMARK_COUNT);
        // Unmirrored image: the subject's left shoulder is on the image right.
        body.set(
            body_pose::LEFT_SHOULDER,
            self.normalize(center + offset)
                .with_visibility(SHOULDER_VISIBILITY),
        );
        body.set(
            body_pose::RIGHT_SHOULDER,
            self.normalize(center - offset)
                .with_visibility(SHOULDER_VISIBILITY),
        );
        body
    }

    fn normalize(&self, px: Point2<f64>) -> Landmark {
        Landmark::new(
            px.x / f64::from(self.camera.width),
            px.y / f64::from(self.camera.height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontal_face_is_centered() {
        let frame = SyntheticFrameBuilder::new(640, 480).build(&SyntheticPose::upright(60.0));
        let face = frame.face.unwrap();
        let nose = face.get(face_mesh::NOSE_TIP).unwrap();
        assert!((nose.x - 0.5).abs() < 1e-12);
        assert!((nose.y - 0.5).abs() < 1e-12);
        assert!(frame.body.is_none());
    }

    #[test]
    fn test_pupils_are_symmetric_about_eyes() {
        let frame = SyntheticFrameBuilder::new(640, 480).build(&SyntheticPose::upright(63.0));
        let face = frame.face.unwrap();
        let r = face.get(face_mesh::RIGHT_PUPIL).unwrap();
        let l = face.get(face_mesh::LEFT_PUPIL).unwrap();
        // 640 / 63 * 6.3 = 64 px apart
        assert!(((l.x - r.x) * 640.0 - 64.0).abs() < 1e-9);
        assert!((l.y - r.y).abs() < 1e-12);
    }

    #[test]
    fn test_shoulders_only_when_requested() {
        let builder = SyntheticFrameBuilder::new(640, 480);
        let frame = builder.build(&SyntheticPose::upright(60.0).with_shoulders(5.0));
        let body = frame.body.unwrap();
        let left = body.get(body_pose::LEFT_SHOULDER).unwrap();
        let right = body.get(body_pose::RIGHT_SHOULDER).unwrap();
        assert!(left.x > right.x);
        assert!(left.y < right.y);
        assert_eq!(left.visibility, Some(SHOULDER_VISIBILITY));
    }
}
