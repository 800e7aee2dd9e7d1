//! Raw counts to radiance and reflectance.
//!
//! Multispectral bands follow the camera's radiometric model:
//!
//! ```text
//! L(x, y) = V(x, y) * R(y) * max(p - dark, 0) / (gain * exposure) * a1 / 2^bits
//! V(x, y) = 1 / (1 + k0 r + k1 r^2 + ...)      r = distance to vignette centre
//! R(y)    = 1 / (1 + a2 y / exposure - a3 y)
//! ```
//!
//! and reflectance is `pi * L / E` for the band irradiance `E`. Thermal bands
//! carry centi-Kelvin counts and are converted to degrees Celsius instead.

use std::f64::consts::PI;

use tracing::debug;

use crate::calibration::capture::{BandCalibration, BandImage, BandKind};
use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::common::raster::Raster;
use crate::calibration::panel::IrradianceVector;

#[cfg(test)]
mod tests;

/// Scale between radiance/irradiance and reflectance for a Lambertian surface.
pub const REFLECTANCE_SCALE: f64 = PI;

const KELVIN_OFFSET_CENTI: f64 = 27315.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationMode {
    /// Pixels are reflectance
    Reflectance,
    /// No irradiance was available, pixels are radiance
    RadianceOnly,
}

impl CalibrationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalibrationMode::Reflectance => "reflectance",
            CalibrationMode::RadianceOnly => "radiance",
        }
    }
}

/// Converts decoded bands using the flight irradiance, when there is one.
#[derive(Debug, Clone, Copy)]
pub struct ReflectanceConverter<'a> {
    irradiance: Option<&'a IrradianceVector>,
}

impl<'a> ReflectanceConverter<'a> {
    pub fn new(irradiance: Option<&'a IrradianceVector>) -> Self {
        Self { irradiance }
    }

    pub fn mode(&self) -> CalibrationMode {
        match self.irradiance {
            Some(_) => CalibrationMode::Reflectance,
            None => CalibrationMode::RadianceOnly,
        }
    }

    /// Converts one band. Multispectral bands become reflectance (or radiance
    /// in [`CalibrationMode::RadianceOnly`]); thermal bands become degrees
    /// Celsius.
    pub fn convert_band(&self, band: &BandImage) -> Result<Raster> {
        match band.calibration.kind {
            BandKind::Thermal => thermal_celsius(band),
            BandKind::Multispectral => {
                let radiance = radiance(band)?;
                match self.irradiance {
                    None => Ok(radiance),
                    Some(irradiance) => {
                        let e = irradiance.get(band.index).ok_or_else(|| {
                            CalibrationError::MetadataError(format!(
                                "no irradiance for band {} ({} values)",
                                band.index,
                                irradiance.len()
                            ))
                        })?;
                        Ok(radiance_to_reflectance(&radiance, e))
                    }
                }
            }
        }
    }

    pub fn convert_all(&self, bands: &[BandImage]) -> Result<Vec<Raster>> {
        bands.iter().map(|b| self.convert_band(b)).collect()
    }
}

/// Scales a radiance raster by `pi / irradiance`.
pub fn radiance_to_reflectance(radiance: &Raster, irradiance: f64) -> Raster {
    let scale = (REFLECTANCE_SCALE / irradiance) as f32;
    radiance.map(|v| v * scale)
}

/// Spectral radiance of a multispectral band.
pub fn radiance(band: &BandImage) -> Result<Raster> {
    if band.width == 0 || band.height == 0 || band.data.len() != band.width * band.height {
        return Err(CalibrationError::InvalidDimensions(band.width, band.height));
    }
    let cal = &band.calibration;
    if cal.gain <= 0.0 || cal.exposure_time <= 0.0 {
        return Err(CalibrationError::MetadataError(format!(
            "{}: gain {} / exposure {} must be positive",
            cal.band_name, cal.gain, cal.exposure_time
        )));
    }

    let [a1, a2, a3] = cal.radiometric_calibration;
    let max_raw = 2f64.powi(cal.bits_per_pixel as i32);
    let scale = a1 / (cal.gain * cal.exposure_time * max_raw);
    let (cx, cy) = vignette_center(cal, band.width, band.height);

    debug!(band = %cal.band_name, "Computing radiance");

    let mut data = Vec::with_capacity(band.data.len());
    for y in 0..band.height {
        let yf = y as f64;
        let row = 1.0 / (1.0 + a2 * yf / cal.exposure_time - a3 * yf);
        let dy = yf - cy;
        for x in 0..band.width {
            let dx = x as f64 - cx;
            let r = (dx * dx + dy * dy).sqrt();
            let v = 1.0 / vignette_denominator(&cal.vignette_polynomial, r);
            let counts = (band.data[y * band.width + x] as f64 - cal.dark_level).max(0.0);
            data.push((v * row * counts * scale) as f32);
        }
    }
    Raster::new(band.width, band.height, data)
}

fn vignette_center(cal: &BandCalibration, width: usize, height: usize) -> (f64, f64) {
    match cal.vignette_center {
        Some([cx, cy]) => (cx, cy),
        None => (width as f64 / 2.0, height as f64 / 2.0),
    }
}

/// `1 + k0 r + k1 r^2 + ...`, evaluated with Horner's scheme.
fn vignette_denominator(poly: &[f64], r: f64) -> f64 {
    let tail = poly.iter().rev().fold(0.0, |acc, &k| acc * r + k);
    1.0 + tail * r
}

fn thermal_celsius(band: &BandImage) -> Result<Raster> {
    let data = band
        .data
        .iter()
        .map(|&p| ((p as f64 - KELVIN_OFFSET_CENTI) / 100.0) as f32)
        .collect();
    Raster::new(band.width, band.height, data)
}
