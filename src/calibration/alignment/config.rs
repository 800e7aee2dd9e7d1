//! Registration settings

use crate::calibration::alignment::transform::MotionModel;

#[derive(Debug, Clone)]
pub struct AlignmentConfig {
    /// Band every other band is registered onto
    pub reference_band: usize,
    /// Iteration cap per pyramid level; more iterations, better alignment, longer runs
    pub max_iterations: usize,
    /// Number of pyramid levels, 1 means full resolution only
    pub pyramid_levels: usize,
    /// Correlation change below which a level is considered converged
    pub epsilon: f64,
    pub motion_model: MotionModel,
    /// Register Sobel gradient magnitudes instead of radiance
    pub register_gradients: bool,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            reference_band: 1,
            max_iterations: 5,
            pyramid_levels: 1,
            epsilon: 1e-6,
            motion_model: MotionModel::Homography,
            register_gradients: true,
        }
    }
}
