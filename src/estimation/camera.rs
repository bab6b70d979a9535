//! Pinhole camera approximation derived from frame dimensions

use nalgebra::{Matrix3, Point2, Point3};

use crate::types::{Landmark, PostureError};

/// Depth below which a point counts as behind the camera.
const MIN_DEPTH: f64 = 1e-9;

/// Uncalibrated pinhole intrinsics.
///
/// Focal length equals the frame width and the principal point is the frame
/// center. There is no distortion model. Every threshold downstream was tuned
/// against this approximation, so it is kept as-is rather than replaced by a
/// calibrated camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    pub width: u32,
    pub height: u32,
    /// Focal length in pixels
    pub focal_length: f64,
    pub cx: f64,
    pub cy: f64,
}

impl CameraIntrinsics {
    pub fn for_frame(width: u32, height: u32) -> Result<Self, PostureError> {
        if width == 0 || height == 0 {
            return Err(PostureError::DegenerateGeometry(format!(
                "frame dimensions {}x{} have no area",
                width, height
            )));
        }
        Ok(Self {
            width,
            height,
            focal_length: f64::from(width),
            cx: f64::from(width) / 2.0,
            cy: f64::from(height) / 2.0,
        })
    }

    /// Scale a normalized landmark to pixel coordinates.
    pub fn to_pixels(&self, landmark: &Landmark) -> Point2<f64> {
        Point2::new(
            landmark.x * f64::from(self.width),
            landmark.y * f64::from(self.height),
        )
    }

    /// Project a camera-frame point onto the image plane.
    ///
    /// Returns `None` for points at or behind the camera center.
    pub fn project(&self, point: &Point3<f64>) -> Option<Point2<f64>> {
        if point.z <= MIN_DEPTH {
            return None;
        }
        Some(Point2::new(
            self.focal_length * point.x / point.z + self.cx,
            self.focal_length * point.y / point.z + self.cy,
        ))
    }

    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.focal_length, 0.0, self.cx,
            0.0, self.focal_length, self.cy,
            0.0, 0.0, 1.0,
        )
    }
}

/// Keeps the intrinsics for the last seen frame size.
#[derive(Debug, Clone, Default)]
pub struct IntrinsicsCache {
    current: Option<CameraIntrinsics>,
}

impl IntrinsicsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intrinsics for `width` x `height`, recomputed only when the size changes.
    pub fn get(&mut self, width: u32, height: u32) -> Result<CameraIntrinsics, PostureError> {
        match self.current {
            Some(camera) if camera.width == width && camera.height == height => Ok(camera),
            _ => {
                let camera = CameraIntrinsics::for_frame(width, height)?;
                self.current = Some(camera);
                Ok(camera)
            }
        }
    }
}
