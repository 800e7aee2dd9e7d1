//! Enhanced correlation coefficient (ECC) image registration.
//!
//! Finds the warp `W` maximising the zero-mean normalised correlation between
//! a template `T(x)` and the warped input `I(W(x))`, following Evangelidis &
//! Psarakis (2008). Each iteration linearises the warped input around the
//! current parameters and solves the closed-form ECC update. All statistics are
//! accumulated in one pass over the template, so no per-pixel buffers are
//! kept.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;
use tracing::trace;

use crate::calibration::alignment::transform::{MotionModel, Transform};
use crate::calibration::common::raster::Raster;

#[derive(Debug, Clone, Copy)]
pub struct EccParams {
    pub motion_model: MotionModel,
    pub max_iterations: usize,
    /// Stop once the correlation changes by less than this between iterations
    pub epsilon: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Registration {
    pub transform: Transform,
    pub correlation: f64,
    pub iterations: usize,
    /// `false` when the iteration cap was hit before the correlation settled
    pub converged: bool,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistrationError {
    #[error("only {0} template pixels overlap the warped input")]
    InsufficientOverlap(usize),

    #[error("image has no intensity variation in the overlap")]
    FlatImage,

    #[error("Hessian is singular")]
    DegenerateHessian,

    #[error("correlation would be minimised; images may be uncorrelated")]
    NotMaximised,

    #[error("non-finite warp parameters")]
    NonFinite,
}

/// Minimum number of overlapping pixels per warp parameter.
const MIN_PIXELS_PER_PARAMETER: usize = 16;

/// Refines `initial` so that `input(W(x))` matches `template(x)`.
pub fn register(
    template: &Raster,
    input: &Raster,
    initial: Transform,
    params: &EccParams,
) -> Result<Registration, RegistrationError> {
    let model = params.motion_model;
    let n_params = model.parameter_count();
    let (gx, gy) = input.gradients();

    let mut p = model.parameters(&initial);
    let mut last_rho = f64::NAN;
    let mut rho = f64::NAN;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < params.max_iterations.max(1) {
        iterations += 1;
        let stats = accumulate(template, input, &gx, &gy, model, &p)?;

        let n = stats.count as f64;
        let mean_t = stats.sum_t / n;
        let mean_i = stats.sum_i / n;
        let t_norm2 = stats.sum_tt - n * mean_t * mean_t;
        let i_norm2 = stats.sum_ii - n * mean_i * mean_i;
        if t_norm2 <= f64::EPSILON || i_norm2 <= f64::EPSILON {
            return Err(RegistrationError::FlatImage);
        }
        let correlation = stats.sum_ti - n * mean_t * mean_i;
        rho = correlation / (t_norm2 * i_norm2).sqrt();

        trace!(iteration = iterations, rho, "ECC iteration");

        if (rho - last_rho).abs() < params.epsilon {
            converged = true;
            break;
        }
        last_rho = rho;

        let hessian = DMatrix::from_row_slice(n_params, n_params, &stats.jtj);
        let hessian_inv = hessian
            .try_inverse()
            .ok_or(RegistrationError::DegenerateHessian)?;

        // Projections of the zero-mean images onto the steepest-descent images.
        let j_sum = DVector::from_column_slice(&stats.j);
        let i_proj = DVector::from_column_slice(&stats.ji) - &j_sum * mean_i;
        let t_proj = DVector::from_column_slice(&stats.jt) - &j_sum * mean_t;

        let i_proj_h = &hessian_inv * &i_proj;
        let lambda_n = i_norm2 - i_proj.dot(&i_proj_h);
        let lambda_d = correlation - t_proj.dot(&i_proj_h);
        if lambda_d <= 0.0 {
            return Err(RegistrationError::NotMaximised);
        }
        let lambda = lambda_n / lambda_d;

        let error_proj = &t_proj * lambda - &i_proj;
        let delta = &hessian_inv * error_proj;
        for (pi, d) in p.iter_mut().zip(delta.iter()) {
            *pi += d;
        }
        if p.iter().any(|v| !v.is_finite()) {
            return Err(RegistrationError::NonFinite);
        }
    }

    Ok(Registration {
        transform: model.transform(&p),
        correlation: rho,
        iterations,
        converged,
    })
}

/// Coarse-to-fine registration over `levels` pyramid levels.
///
/// `levels == 1` registers at full resolution only. The initial transform is
/// given at full resolution and the result is returned at full resolution.
pub fn register_pyramid(
    template: &Raster,
    input: &Raster,
    initial: Transform,
    params: &EccParams,
    levels: usize,
) -> Result<Registration, RegistrationError> {
    let levels = levels.max(1);
    let mut templates = vec![template.clone()];
    let mut inputs = vec![input.clone()];
    for _ in 1..levels {
        let (t, i) = match (templates.last(), inputs.last()) {
            (Some(t), Some(i)) => (t.downsample_half(), i.downsample_half()),
            _ => break,
        };
        templates.push(t);
        inputs.push(i);
    }

    let coarsest = templates.len() - 1;
    let mut transform = initial.rescaled(0.5f64.powi(coarsest as i32));
    let mut result = None;
    for level in (0..=coarsest).rev() {
        let registration = register(&templates[level], &inputs[level], transform, params)?;
        transform = if level > 0 {
            registration.transform.rescaled(2.0)
        } else {
            registration.transform
        };
        result = Some(Registration {
            transform,
            ..registration
        });
    }
    result.ok_or(RegistrationError::InsufficientOverlap(0))
}

struct EccStats {
    count: usize,
    sum_t: f64,
    sum_i: f64,
    sum_tt: f64,
    sum_ii: f64,
    sum_ti: f64,
    /// Row-major `J^T J`
    jtj: Vec<f64>,
    j: Vec<f64>,
    jt: Vec<f64>,
    ji: Vec<f64>,
}

fn accumulate(
    template: &Raster,
    input: &Raster,
    gx: &Raster,
    gy: &Raster,
    model: MotionModel,
    p: &[f64],
) -> Result<EccStats, RegistrationError> {
    let n_params = model.parameter_count();
    let warp = model.transform(p);
    let mut stats = EccStats {
        count: 0,
        sum_t: 0.0,
        sum_i: 0.0,
        sum_tt: 0.0,
        sum_ii: 0.0,
        sum_ti: 0.0,
        jtj: vec![0.0; n_params * n_params],
        j: vec![0.0; n_params],
        jt: vec![0.0; n_params],
        ji: vec![0.0; n_params],
    };
    let mut row = vec![0.0; n_params];

    for y in 0..template.height {
        for x in 0..template.width {
            let t = template.get(x, y);
            if !t.is_finite() {
                continue;
            }
            let (xf, yf) = (x as f64, y as f64);
            let Some((u, v)) = warp.apply(xf, yf) else {
                continue;
            };
            let (Some(i), Some(dx), Some(dy)) = (
                input.sample_bilinear(u, v),
                gx.sample_bilinear(u, v),
                gy.sample_bilinear(u, v),
            ) else {
                continue;
            };

            let (t, i) = (t as f64, i as f64);
            model.steepest_descent(p, xf, yf, dx as f64, dy as f64, &mut row);

            stats.count += 1;
            stats.sum_t += t;
            stats.sum_i += i;
            stats.sum_tt += t * t;
            stats.sum_ii += i * i;
            stats.sum_ti += t * i;
            for a in 0..n_params {
                let ja = row[a];
                stats.j[a] += ja;
                stats.jt[a] += ja * t;
                stats.ji[a] += ja * i;
                for b in a..n_params {
                    stats.jtj[a * n_params + b] += ja * row[b];
                }
            }
        }
    }

    for a in 0..n_params {
        for b in 0..a {
            stats.jtj[a * n_params + b] = stats.jtj[b * n_params + a];
        }
    }

    if stats.count < MIN_PIXELS_PER_PARAMETER * n_params {
        return Err(RegistrationError::InsufficientOverlap(stats.count));
    }
    Ok(stats)
}
