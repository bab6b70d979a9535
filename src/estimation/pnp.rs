//! Iterative perspective-n-point pose solve
//!
//! Finds the rigid transform (rotation + translation) that maps a set of 3D
//! model points onto their observed 2D image positions, by Levenberg-Marquardt
//! minimization of the squared reprojection error. The rotation is updated
//! multiplicatively through an axis-angle increment so it stays orthonormal.

use nalgebra::{DMatrix, DVector, Point2, Point3, Rotation3, Vector3};
use std::f64::consts::PI;

use super::camera::CameraIntrinsics;
use crate::types::PostureError;

/// Parameters per pose: 3 rotation + 3 translation.
const POSE_DOF: usize = 6;

/// Reprojection cost (px²) treated as an exact fit.
const COST_FLOOR: f64 = 1e-14;

const INITIAL_LAMBDA: f64 = 1e-3;
const MIN_LAMBDA: f64 = 1e-12;
const MAX_LAMBDA: f64 = 1e12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PnpOptions {
    /// Outer iterations before the solve is declared non-convergent
    pub max_iterations: usize,
    /// Step norm, relative to the parameter norm, that counts as converged
    pub step_tolerance: f64,
    /// Relative cost decrease that counts as converged
    pub cost_tolerance: f64,
    /// Largest gradient component that counts as converged
    pub gradient_tolerance: f64,
    /// Minimum ratio of the image points' principal spreads. Below this the
    /// points are too close to a line for the rotation to be observable.
    pub min_spread_ratio: f64,
}

impl Default for PnpOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            step_tolerance: 1e-12,
            cost_tolerance: 1e-10,
            gradient_tolerance: 1e-9,
            min_spread_ratio: 1e-4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PnpSolution {
    /// Model-to-camera rotation
    pub rotation: Rotation3<f64>,
    /// Model origin in camera coordinates (model units)
    pub translation: Vector3<f64>,
    pub iterations: usize,
    /// Root-mean-square reprojection error (px)
    pub rms_error: f64,
}

fn solve_failed(reason: impl Into<String>) -> PostureError {
    PostureError::PoseSolveFailed(reason.into())
}

/// Solve for the pose of `model` given its projections `image` (pixels).
pub fn solve_pnp(
    model: &[Point3<f64>],
    image: &[Point2<f64>],
    camera: &CameraIntrinsics,
    options: &PnpOptions,
) -> Result<PnpSolution, PostureError> {
    if model.len() != image.len() {
        return Err(solve_failed(format!(
            "{} model points but {} image points",
            model.len(),
            image.len()
        )));
    }
    if model.len() < 4 {
        return Err(solve_failed(format!(
            "need at least 4 correspondences, got {}",
            model.len()
        )));
    }
    check_spread(image, options.min_spread_ratio)?;

    let (mut rotation, mut translation) = initial_guess(model, image, camera)?;
    let mut residual = residuals(model, image, camera, &rotation, &translation)
        .ok_or_else(|| solve_failed("initial guess places the model behind the camera"))?;
    let mut cost = 0.5 * residual.norm_squared();
    let mut lambda = INITIAL_LAMBDA;

    for iteration in 1..=options.max_iterations {
        if cost <= COST_FLOOR {
            return finish(rotation, translation, cost, model.len(), iteration);
        }

        let jacobian = numeric_jacobian(model, image, camera, &rotation, &translation)?;
        let jt = jacobian.transpose();
        let gradient = &jt * &residual;
        if gradient.amax() <= options.gradient_tolerance {
            return finish(rotation, translation, cost, model.len(), iteration);
        }
        let normal = &jt * &jacobian;

        loop {
            let mut damped = normal.clone();
            for i in 0..POSE_DOF {
                damped[(i, i)] += lambda * normal[(i, i)].max(f64::EPSILON);
            }

            let candidate = damped.cholesky().and_then(|chol| {
                let step = chol.solve(&(-&gradient));
                let (r, t) = apply_step(&rotation, &translation, &step);
                let res = residuals(model, image, camera, &r, &t)?;
                let c = 0.5 * res.norm_squared();
                (c.is_finite() && c < cost).then_some((step, r, t, res, c))
            });

            match candidate {
                Some((step, r, t, res, new_cost)) => {
                    let decrease = (cost - new_cost) / cost;
                    rotation = r;
                    translation = t;
                    residual = res;
                    cost = new_cost;
                    lambda = (lambda * 0.1).max(MIN_LAMBDA);

                    let scale = translation.norm() + PI;
                    if step.norm() <= options.step_tolerance * scale
                        || decrease <= options.cost_tolerance
                    {
                        return finish(rotation, translation, cost, model.len(), iteration);
                    }
                    break;
                }
                None => {
                    lambda *= 10.0;
                    if lambda > MAX_LAMBDA {
                        // No downhill step exists at any damping: local minimum.
                        return finish(rotation, translation, cost, model.len(), iteration);
                    }
                }
            }
        }
    }

    Err(solve_failed(format!(
        "did not converge within {} iterations",
        options.max_iterations
    )))
}

fn finish(
    rotation: Rotation3<f64>,
    translation: Vector3<f64>,
    cost: f64,
    n_points: usize,
    iterations: usize,
) -> Result<PnpSolution, PostureError> {
    let finite = rotation.matrix().iter().all(|v| v.is_finite())
        && translation.iter().all(|v| v.is_finite())
        && cost.is_finite();
    if !finite {
        return Err(solve_failed("solution is not finite"));
    }
    if translation.z <= 0.0 {
        return Err(solve_failed("solution places the model behind the camera"));
    }
    Ok(PnpSolution {
        rotation,
        translation,
        iterations,
        rms_error: (2.0 * cost / n_points as f64).sqrt(),
    })
}

/// Rejects point sets whose 2D covariance is (nearly) rank-deficient.
fn check_spread(image: &[Point2<f64>], min_ratio: f64) -> Result<(), PostureError> {
    let n = image.len() as f64;
    let mean = image.iter().fold(Vector3::zeros(), |acc, p| {
        acc + Vector3::new(p.x, p.y, 0.0)
    }) / n;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for p in image {
        let dx = p.x - mean.x;
        let dy = p.y - mean.y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    sxx /= n;
    syy /= n;
    sxy /= n;

    let half_trace = (sxx + syy) / 2.0;
    let spread = (((sxx - syy) / 2.0).powi(2) + sxy * sxy).sqrt();
    let major = half_trace + spread;
    let minor = half_trace - spread;

    if !(major.is_finite() && major > f64::EPSILON) || minor / major < min_ratio {
        return Err(solve_failed("landmarks are nearly collinear"));
    }
    Ok(())
}

/// Frontal starting pose: half-turn about x, depth from the model/image size ratio.
fn initial_guess(
    model: &[Point3<f64>],
    image: &[Point2<f64>],
    camera: &CameraIntrinsics,
) -> Result<(Rotation3<f64>, Vector3<f64>), PostureError> {
    let n = model.len() as f64;
    let model_centroid = model.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / n;
    let image_centroid = image.iter().fold(Vector3::zeros(), |acc, p| {
        acc + Vector3::new(p.x, p.y, 0.0)
    }) / n;

    let model_rms = (model
        .iter()
        .map(|p| (p.x - model_centroid.x).powi(2) + (p.y - model_centroid.y).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();
    let image_rms = (image
        .iter()
        .map(|p| (p.x - image_centroid.x).powi(2) + (p.y - image_centroid.y).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();
    if image_rms <= f64::EPSILON {
        return Err(solve_failed("image points coincide"));
    }

    let rotation = Rotation3::from_axis_angle(&Vector3::x_axis(), PI);
    let depth = camera.focal_length * model_rms / image_rms;
    let anchor = Vector3::new(
        (image_centroid.x - camera.cx) * depth / camera.focal_length,
        (image_centroid.y - camera.cy) * depth / camera.focal_length,
        depth,
    );
    let translation = anchor - rotation * model_centroid;
    Ok((rotation, translation))
}

fn apply_step(
    rotation: &Rotation3<f64>,
    translation: &Vector3<f64>,
    step: &DVector<f64>,
) -> (Rotation3<f64>, Vector3<f64>) {
    let omega = Vector3::new(step[0], step[1], step[2]);
    let dt = Vector3::new(step[3], step[4], step[5]);
    (Rotation3::new(omega) * rotation, translation + dt)
}

/// Stacked `[du0, dv0, du1, dv1, ...]` reprojection residuals.
fn residuals(
    model: &[Point3<f64>],
    image: &[Point2<f64>],
    camera: &CameraIntrinsics,
    rotation: &Rotation3<f64>,
    translation: &Vector3<f64>,
) -> Option<DVector<f64>> {
    let mut out = DVector::zeros(model.len() * 2);
    for (i, (m, obs)) in model.iter().zip(image).enumerate() {
        let cam = rotation * m + translation;
        let projected = camera.project(&cam)?;
        out[2 * i] = projected.x - obs.x;
        out[2 * i + 1] = projected.y - obs.y;
    }
    Some(out)
}

/// Central-difference Jacobian of the residuals w.r.t. the pose increment.
fn numeric_jacobian(
    model: &[Point3<f64>],
    image: &[Point2<f64>],
    camera: &CameraIntrinsics,
    rotation: &Rotation3<f64>,
    translation: &Vector3<f64>,
) -> Result<DMatrix<f64>, PostureError> {
    let rows = model.len() * 2;
    let mut jacobian = DMatrix::zeros(rows, POSE_DOF);
    let translation_step = 1e-6 * translation.norm().max(1.0);

    for k in 0..POSE_DOF {
        let h = if k < 3 { 1e-7 } else { translation_step };
        let mut delta = DVector::zeros(POSE_DOF);

        delta[k] = h;
        let (r_plus, t_plus) = apply_step(rotation, translation, &delta);
        delta[k] = -h;
        let (r_minus, t_minus) = apply_step(rotation, translation, &delta);

        let plus = residuals(model, image, camera, &r_plus, &t_plus);
        let minus = residuals(model, image, camera, &r_minus, &t_minus);
        let (Some(plus), Some(minus)) = (plus, minus) else {
            return Err(solve_failed("pose drifted behind the camera"));
        };
        jacobian.set_column(k, &((plus - minus) / (2.0 * h)));
    }
    Ok(jacobian)
}
