use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::calibration::alignment::config::AlignmentConfig;
use crate::calibration::alignment::ecc::{self, EccParams, Registration, RegistrationError};
use crate::calibration::alignment::transform::{Transform, TransformSet};
use crate::calibration::capture::{BandImage, BandKind, Capture};
use crate::calibration::common::error::{CalibrationError, CalibrationWarning, Result};
use crate::calibration::common::raster::Raster;
use crate::calibration::reflectance;

/// Transforms for a flight plus whatever went wrong while estimating them.
#[derive(Debug, Clone)]
pub struct AlignmentReport {
    pub transforms: TransformSet,
    pub warnings: Vec<CalibrationWarning>,
}

impl AlignmentReport {
    /// Bands left on the identity because registration failed.
    pub fn fallback_bands(&self) -> Vec<usize> {
        self.warnings
            .iter()
            .filter_map(|w| match w {
                CalibrationWarning::AlignmentConvergence { band, .. } => Some(*band),
                _ => None,
            })
            .collect()
    }
}

pub struct AlignmentEstimator {
    config: AlignmentConfig,
}

enum BandOutcome {
    Reference,
    Scaled(Transform),
    Registered(Registration),
    Failed(RegistrationError),
}

impl AlignmentEstimator {
    pub fn new(config: AlignmentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    /// Registers every band of `capture` onto the reference band.
    ///
    /// Thermal bands get a pure scale between the two pixel grids. A band
    /// whose registration fails keeps the identity and produces an
    /// [`CalibrationWarning::AlignmentConvergence`].
    #[instrument(skip_all, fields(capture = %capture.name, reference = self.config.reference_band))]
    pub fn estimate(&self, capture: &Capture) -> Result<AlignmentReport> {
        let reference_index = self.config.reference_band;
        let reference = capture.bands.get(reference_index).ok_or_else(|| {
            CalibrationError::MetadataError(format!(
                "reference band {} not present in capture {} ({} bands)",
                reference_index,
                capture.name,
                capture.band_count()
            ))
        })?;
        if reference.calibration.kind != BandKind::Multispectral {
            return Err(CalibrationError::MetadataError(format!(
                "reference band {} must be a multispectral band",
                reference_index
            )));
        }

        let template = self.registration_image(reference)?;
        let params = EccParams {
            motion_model: self.config.motion_model,
            max_iterations: self.config.max_iterations,
            epsilon: self.config.epsilon,
        };

        let outcomes: Vec<BandOutcome> = capture
            .bands
            .par_iter()
            .enumerate()
            .map(|(index, band)| -> Result<BandOutcome> {
                if index == reference_index {
                    return Ok(BandOutcome::Reference);
                }
                if band.calibration.kind == BandKind::Thermal {
                    return Ok(BandOutcome::Scaled(Transform::scale(
                        band.width as f64 / reference.width as f64,
                        band.height as f64 / reference.height as f64,
                    )));
                }
                let input = self.registration_image(band)?;
                Ok(match ecc::register_pyramid(
                    &template,
                    &input,
                    Transform::identity(),
                    &params,
                    self.config.pyramid_levels,
                ) {
                    Ok(registration) => BandOutcome::Registered(registration),
                    Err(e) => BandOutcome::Failed(e),
                })
            })
            .collect::<Result<_>>()?;

        let mut transforms = Vec::with_capacity(outcomes.len());
        let mut warnings = Vec::new();
        for (band, outcome) in outcomes.into_iter().enumerate() {
            let transform = match outcome {
                BandOutcome::Reference => Transform::identity(),
                BandOutcome::Scaled(t) => {
                    debug!(band, "Thermal band mapped by grid scale");
                    t
                }
                BandOutcome::Registered(r) => {
                    if r.converged {
                        debug!(band, rho = r.correlation, iterations = r.iterations, "Band registered");
                    } else {
                        debug!(band, rho = r.correlation, "Band registration hit the iteration cap");
                    }
                    r.transform
                }
                BandOutcome::Failed(e) => {
                    warn!(band, "Registration failed, using identity: {}", e);
                    warnings.push(CalibrationWarning::AlignmentConvergence {
                        band,
                        reason: e.to_string(),
                    });
                    Transform::identity()
                }
            };
            transforms.push(transform);
        }

        info!(
            bands = transforms.len(),
            fallbacks = warnings.len(),
            "Alignment estimated"
        );
        Ok(AlignmentReport {
            transforms: TransformSet {
                reference_band: reference_index,
                transforms,
            },
            warnings,
        })
    }

    fn registration_image(&self, band: &BandImage) -> Result<Raster> {
        let radiance = reflectance::radiance(band)?;
        Ok(if self.config.register_gradients {
            radiance.sobel_magnitude()
        } else {
            radiance
        })
    }
}
