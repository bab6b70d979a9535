//! Fixed anthropometric face model

use nalgebra::Point3;

use crate::types::face_mesh;

/// Face-mesh index for each model point, in model-point order.
pub const MODEL_LANDMARKS: [usize; 6] = [
    face_mesh::NOSE_TIP,
    face_mesh::CHIN,
    face_mesh::RIGHT_EYE_OUTER,
    face_mesh::LEFT_EYE_OUTER,
    face_mesh::RIGHT_MOUTH_CORNER,
    face_mesh::LEFT_MOUTH_CORNER,
];

/// Six reference points of an average face, in model units (~0.2 mm).
///
/// The model frame is x to the image's right, y up, z out of the face toward
/// the camera, with the nose tip at the origin. The camera frame has y down
/// and z into the scene, so a face looking straight at the camera sits at a
/// half-turn about x. That half-turn is why raw pitch comes out near ±180°.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceModel3D {
    points: [Point3<f64>; 6],
}

impl Default for FaceModel3D {
    fn default() -> Self {
        Self {
            points: [
                Point3::new(0.0, 0.0, 0.0),          // nose tip
                Point3::new(0.0, -330.0, -65.0),     // chin
                Point3::new(-225.0, 170.0, -135.0),  // eye corner, image left
                Point3::new(225.0, 170.0, -135.0),   // eye corner, image right
                Point3::new(-150.0, -150.0, -125.0), // mouth corner, image left
                Point3::new(150.0, -150.0, -125.0),  // mouth corner, image right
            ],
        }
    }
}

impl FaceModel3D {
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Face-mesh indices matching `points()` one to one.
    pub fn landmark_indices(&self) -> &'static [usize] {
        &MODEL_LANDMARKS
    }
}
