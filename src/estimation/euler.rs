//! Rotation matrix to Euler angle decomposition

use nalgebra::Matrix3;

/// Below this `sy` the decomposition is in gimbal lock.
pub const GIMBAL_LOCK_EPSILON: f64 = 1e-6;

/// Euler angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    /// Rotation about the horizontal (x) axis
    pub pitch: f64,
    /// Rotation about the vertical (y) axis
    pub yaw: f64,
    /// Rotation about the depth (z) axis
    pub roll: f64,
}

/// Decompose `R = Rz(roll) * Ry(yaw) * Rx(pitch)` into degrees.
///
/// In gimbal lock (yaw at ±90°) roll is fixed at zero and the whole in-plane
/// rotation is attributed to pitch.
pub fn rotation_to_euler(r: &Matrix3<f64>) -> EulerAngles {
    let sy = (r[(0, 0)] * r[(0, 0)] + r[(1, 0)] * r[(1, 0)]).sqrt();

    let (pitch, yaw, roll) = if sy < GIMBAL_LOCK_EPSILON {
        ((-r[(1, 2)]).atan2(r[(1, 1)]), (-r[(2, 0)]).atan2(sy), 0.0)
    } else {
        (
            r[(2, 1)].atan2(r[(2, 2)]),
            (-r[(2, 0)]).atan2(sy),
            r[(1, 0)].atan2(r[(0, 0)]),
        )
    };

    EulerAngles {
        pitch: pitch.to_degrees(),
        yaw: yaw.to_degrees(),
        roll: roll.to_degrees(),
    }
}

/// Re-express raw pitch relative to looking straight at the camera.
///
/// The face model sits at a half-turn about x when frontal, so raw pitch is
/// near ±180°. Negative results mean the head is tilted down.
pub fn normalize_pitch(raw: f64) -> f64 {
    if raw > 0.0 {
        180.0 - raw
    } else {
        -180.0 - raw
    }
}
