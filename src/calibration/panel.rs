//! Scene irradiance from reference panel captures.

use tracing::{debug, info, instrument, warn};

use crate::calibration::capture::{BandKind, Capture};
use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::reflectance::{self, REFLECTANCE_SCALE};


/// Flight irradiance, one value per multispectral band.
#[derive(Debug, Clone, PartialEq)]
pub struct IrradianceVector {
    values: Vec<f64>,
}

impl IrradianceVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn get(&self, band: usize) -> Option<f64> {
        self.values.get(band).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// Panel radiance and the panel's known albedo for one capture.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSample {
    pub radiance: Vec<f64>,
    pub albedo: Vec<Option<f64>>,
}

impl PanelSample {
    pub fn new(radiance: Vec<f64>, albedo: Vec<Option<f64>>) -> Self {
        Self { radiance, albedo }
    }

    /// Measures mean panel radiance in every multispectral band of `capture`.
    ///
    /// Returns `None` for captures without a panel reading and for captures
    /// missing any band the panel reading describes. Bands whose panel region
    /// is missing or outside the image get a `NaN` radiance, which disqualifies
    /// the sample.
    pub fn from_capture(capture: &Capture) -> Result<Option<Self>> {
        let Some(panel) = capture.panel.as_ref() else {
            return Ok(None);
        };

        let expected = panel.albedo.len();
        let complete = capture.bands.len() == expected
            && capture.bands.iter().enumerate().all(|(slot, b)| b.index == slot);
        if !complete {
            warn!(
                capture = %capture.name,
                bands = capture.bands.len(),
                expected,
                "Panel capture excluded: missing bands"
            );
            return Ok(None);
        }

        let mut radiance = Vec::new();
        let mut albedo = Vec::new();
        for band in capture
            .bands
            .iter()
            .filter(|b| b.calibration.kind == BandKind::Multispectral)
        {
            let region = panel.regions.get(band.index).copied().flatten();
            let mean = match region {
                Some(rect) => reflectance::radiance(band)?.mean_in(rect),
                None => None,
            };
            if mean.is_none() {
                debug!(capture = %capture.name, band = band.index + 1, "No usable panel region");
            }
            radiance.push(mean.unwrap_or(f64::NAN));
            albedo.push(panel.albedo.get(band.index).copied().flatten());
        }
        Ok(Some(Self { radiance, albedo }))
    }

    /// `pi * radiance / albedo` per band, or `None` if any band is unusable.
    pub fn irradiance(&self) -> Option<Vec<f64>> {
        if self.albedo.len() != self.radiance.len() || self.radiance.is_empty() {
            return None;
        }
        self.radiance
            .iter()
            .zip(&self.albedo)
            .map(|(&l, a)| match a {
                Some(a) if *a > 0.0 && l.is_finite() => Some(REFLECTANCE_SCALE * l / a),
                _ => None,
            })
            .collect()
    }
}

pub struct PanelIrradianceEstimator;

impl PanelIrradianceEstimator {
    /// Column-wise mean of the irradiance of every qualifying sample.
    ///
    /// Samples with a missing band albedo are skipped. The widest qualifying
    /// sample fixes the band count; narrower samples are skipped as well.
    #[instrument(skip_all, fields(samples = samples.len()))]
    pub fn estimate(samples: &[PanelSample]) -> Result<IrradianceVector> {
        let qualifying: Vec<(usize, Vec<f64>)> = samples
            .iter()
            .enumerate()
            .filter_map(|(i, sample)| match sample.irradiance() {
                Some(irradiance) => Some((i, irradiance)),
                None => {
                    debug!(sample = i, "Panel sample excluded: incomplete reflectance");
                    None
                }
            })
            .collect();

        let width = qualifying.iter().map(|(_, e)| e.len()).max().unwrap_or(0);
        let mut sums = vec![0.0; width];
        let mut included = 0usize;
        for (i, irradiance) in &qualifying {
            if irradiance.len() != width {
                warn!(
                    sample = i,
                    "Panel sample excluded: {} bands, expected {}",
                    irradiance.len(),
                    width
                );
                continue;
            }
            for (s, v) in sums.iter_mut().zip(irradiance) {
                *s += v;
            }
            included += 1;
        }

        if included == 0 {
            return Err(CalibrationError::InsufficientPanelData {
                examined: samples.len(),
            });
        }

        let values: Vec<f64> = sums.into_iter().map(|s| s / included as f64).collect();
        info!(included, ?values, "Panel irradiance estimated");
        Ok(IrradianceVector::new(values))
    }

    pub fn estimate_from_captures(captures: &[Capture]) -> Result<IrradianceVector> {
        let mut samples = Vec::with_capacity(captures.len());
        for capture in captures {
            match PanelSample::from_capture(capture)? {
                Some(sample) => samples.push(sample),
                None => debug!(capture = %capture.name, "Capture has no usable panel reading"),
            }
        }
        if samples.is_empty() {
            return Err(CalibrationError::InsufficientPanelData {
                examined: captures.len(),
            });
        }
        Self::estimate(&samples)
    }
}
