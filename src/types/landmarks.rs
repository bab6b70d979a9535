//! Landmark input types and the semantic indices the estimators read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Face-mesh indices (478-point topology with refined iris landmarks).
///
/// "Left" and "right" are the subject's sides. In an unmirrored camera image
/// the subject's right eye appears on the image's left.
pub mod face_mesh {
    pub const NOSE_TIP: usize = 1;
    pub const CHIN: usize = 152;
    pub const RIGHT_EYE_OUTER: usize = 33;
    pub const LEFT_EYE_OUTER: usize = 263;
    pub const RIGHT_MOUTH_CORNER: usize = 61;
    pub const LEFT_MOUTH_CORNER: usize = 291;
    pub const RIGHT_PUPIL: usize = 468;
    pub const LEFT_PUPIL: usize = 473;
    /// Number of points emitted per face.
    pub const LANDMARK_COUNT: usize = 478;
}

/// Body-pose indices (33-point topology).
pub mod body_pose {
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    /// Number of points emitted per body.
    pub const LANDMARK_COUNT: usize = 33;
}

/// A single detected point in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position in [0, 1] of the frame width
    pub x: f64,
    /// Vertical position in [0, 1] of the frame height (downwards)
    pub y: f64,
    /// Relative depth, when the detector provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    /// Detector confidence that the point is visible (0.0-1.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, visibility: f64) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// A point with NaN/Inf coordinates counts as not detected.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One frame's detected points, addressed by stable semantic index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    /// A set of `len` placeholder points, for filling selected indices.
    pub fn with_len(len: usize) -> Self {
        Self {
            points: vec![Landmark::default(); len],
        }
    }

    /// Point at `index`, or `None` when absent or non-finite.
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.points.get(index).filter(|p| p.is_finite())
    }

    pub fn set(&mut self, index: usize, landmark: Landmark) {
        if index >= self.points.len() {
            self.points.resize(index + 1, Landmark::default());
        }
        self.points[index] = landmark;
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [Landmark] {
        &mut self.points
    }
}

/// Everything the detector delivers for one video frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameInput {
    /// Capture time in Unix milliseconds; absent means "now"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Facial landmarks; `None` when no face was detected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face: Option<LandmarkSet>,
    /// Body landmarks; `None` when the body model is not running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<LandmarkSet>,
}

impl FrameInput {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp_ms.and_then(DateTime::<Utc>::from_timestamp_millis)
    }
}
