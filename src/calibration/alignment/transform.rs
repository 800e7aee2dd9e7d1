use std::path::Path;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::calibration::common::error::{CalibrationError, Result};

/// Projective 3x3 transform taking reference-band pixel coordinates to the
/// pixel coordinates of another band.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[[f64; 3]; 3]", into = "[[f64; 3]; 3]")]
pub struct Transform {
    pub matrix: Matrix3<f64>,
}

impl Transform {
    pub fn new(matrix: Matrix3<f64>) -> Self {
        Self { matrix }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(Matrix3::new(sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0))
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(Matrix3::new(1.0, 0.0, tx, 0.0, 1.0, ty, 0.0, 0.0, 1.0))
    }

    pub fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_row_slice(&[
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ]))
    }

    pub fn to_rows(&self) -> [[f64; 3]; 3] {
        let m = &self.matrix;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }

    /// Maps a point; `None` when it lands on the line at infinity.
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let v = self.matrix * Vector3::new(x, y, 1.0);
        if v[2].abs() < 1e-12 {
            return None;
        }
        Some((v[0] / v[2], v[1] / v[2]))
    }

    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(Self::new)
    }

    /// Re-expresses the transform for images scaled by `factor` in both axes:
    /// translations scale with `factor`, projective terms with `1 / factor`.
    pub fn rescaled(&self, factor: f64) -> Self {
        let s = Matrix3::new(factor, 0.0, 0.0, 0.0, factor, 0.0, 0.0, 0.0, 1.0);
        let s_inv = Matrix3::new(1.0 / factor, 0.0, 0.0, 0.0, 1.0 / factor, 0.0, 0.0, 0.0, 1.0);
        Self::new(s * self.matrix * s_inv)
    }

    pub fn is_identity(&self, tolerance: f64) -> bool {
        (self.matrix - Matrix3::identity()).amax() <= tolerance
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[[f64; 3]; 3]> for Transform {
    fn from(rows: [[f64; 3]; 3]) -> Self {
        Self::from_rows(rows)
    }
}

impl From<Transform> for [[f64; 3]; 3] {
    fn from(t: Transform) -> Self {
        t.to_rows()
    }
}

/// Parametrisation used by the registration solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionModel {
    Translation,
    Affine,
    #[default]
    Homography,
}

impl MotionModel {
    pub fn parameter_count(&self) -> usize {
        match self {
            MotionModel::Translation => 2,
            MotionModel::Affine => 6,
            MotionModel::Homography => 8,
        }
    }

    /// Parameter vector of `t` under this model. Terms the model cannot
    /// express are dropped.
    pub fn parameters(&self, t: &Transform) -> Vec<f64> {
        let m = t.matrix / t.matrix[(2, 2)];
        match self {
            MotionModel::Translation => vec![m[(0, 2)], m[(1, 2)]],
            MotionModel::Affine => vec![
                m[(0, 0)], m[(0, 1)], m[(0, 2)],
                m[(1, 0)], m[(1, 1)], m[(1, 2)],
            ],
            MotionModel::Homography => vec![
                m[(0, 0)], m[(0, 1)], m[(0, 2)],
                m[(1, 0)], m[(1, 1)], m[(1, 2)],
                m[(2, 0)], m[(2, 1)],
            ],
        }
    }

    pub fn transform(&self, p: &[f64]) -> Transform {
        match self {
            MotionModel::Translation => Transform::translation(p[0], p[1]),
            MotionModel::Affine => Transform::new(Matrix3::new(
                p[0], p[1], p[2], p[3], p[4], p[5], 0.0, 0.0, 1.0,
            )),
            MotionModel::Homography => Transform::new(Matrix3::new(
                p[0], p[1], p[2], p[3], p[4], p[5], p[6], p[7], 1.0,
            )),
        }
    }

    /// Writes d(intensity)/d(parameters) at template point `(x, y)` into `out`,
    /// given the input image gradient `(gx, gy)` sampled at the warped point.
    #[inline]
    pub fn steepest_descent(&self, p: &[f64], x: f64, y: f64, gx: f64, gy: f64, out: &mut [f64]) {
        match self {
            MotionModel::Translation => {
                out[0] = gx;
                out[1] = gy;
            }
            MotionModel::Affine => {
                out[0] = gx * x;
                out[1] = gx * y;
                out[2] = gx;
                out[3] = gy * x;
                out[4] = gy * y;
                out[5] = gy;
            }
            MotionModel::Homography => {
                let den = p[6] * x + p[7] * y + 1.0;
                let u = (p[0] * x + p[1] * y + p[2]) / den;
                let v = (p[3] * x + p[4] * y + p[5]) / den;
                let gxd = gx / den;
                let gyd = gy / den;
                let proj = gxd * u + gyd * v;
                out[0] = gxd * x;
                out[1] = gxd * y;
                out[2] = gxd;
                out[3] = gyd * x;
                out[4] = gyd * y;
                out[5] = gyd;
                out[6] = -proj * x;
                out[7] = -proj * y;
            }
        }
    }
}

/// One transform per band; the reference band's entry is the identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformSet {
    pub reference_band: usize,
    pub transforms: Vec<Transform>,
}

impl TransformSet {
    pub fn identity(band_count: usize, reference_band: usize) -> Self {
        Self {
            reference_band,
            transforms: vec![Transform::identity(); band_count],
        }
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn get(&self, band: usize) -> Option<&Transform> {
        self.transforms.get(band)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| CalibrationError::EncodeError(e.to_string()))?;
        std::fs::write(path, text).map_err(|e| {
            CalibrationError::OutputWriteError(format!("{}: {}", path.display(), e))
        })
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CalibrationError::InputReadError(format!("{}: {}", path.display(), e))
        })?;
        let set: Self = serde_json::from_str(&text)
            .map_err(|e| CalibrationError::MetadataError(format!("{}: {}", path.display(), e)))?;
        if set.reference_band >= set.transforms.len() {
            return Err(CalibrationError::MetadataError(format!(
                "{}: reference band {} out of range",
                path.display(),
                set.reference_band
            )));
        }
        Ok(set)
    }
}
