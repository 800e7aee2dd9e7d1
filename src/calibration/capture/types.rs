//! Capture data types

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calibration::common::raster::PixelRect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandKind {
    /// Reflective band converted through radiance to reflectance
    #[default]
    Multispectral,
    /// Long-wave infrared band; raw values are centi-Kelvin
    Thermal,
}

/// Per-band sensor calibration as reported by the camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandCalibration {
    pub band_name: String,
    #[serde(default)]
    pub kind: BandKind,
    /// Sensor black level in raw counts
    #[serde(default)]
    pub dark_level: f64,
    #[serde(default = "unit")]
    pub gain: f64,
    /// Exposure time in seconds
    #[serde(default = "unit")]
    pub exposure_time: f64,
    /// Radiometric coefficients `[a1, a2, a3]`
    #[serde(default = "identity_radiometric")]
    pub radiometric_calibration: [f64; 3],
    /// Vignette centre in pixels, image centre when absent
    #[serde(default)]
    pub vignette_center: Option<[f64; 2]>,
    /// Vignette polynomial `k0..kn` in radial distance, lowest order first
    #[serde(default)]
    pub vignette_polynomial: Vec<f64>,
    #[serde(default = "sixteen")]
    pub bits_per_pixel: u32,
    #[serde(default)]
    pub focal_length_mm: f64,
    #[serde(default)]
    pub focal_plane_resolution_px_per_mm: f64,
}

fn unit() -> f64 {
    1.0
}

fn identity_radiometric() -> [f64; 3] {
    [1.0, 0.0, 0.0]
}

fn sixteen() -> u32 {
    16
}

impl BandCalibration {
    /// Calibration that leaves raw counts untouched apart from bit-depth scaling.
    pub fn nominal(band_name: impl Into<String>) -> Self {
        Self {
            band_name: band_name.into(),
            kind: BandKind::Multispectral,
            dark_level: 0.0,
            gain: 1.0,
            exposure_time: 1.0,
            radiometric_calibration: identity_radiometric(),
            vignette_center: None,
            vignette_polynomial: Vec::new(),
            bits_per_pixel: 16,
            focal_length_mm: 0.0,
            focal_plane_resolution_px_per_mm: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPosition {
    /// Decimal degrees, north positive
    pub latitude: f64,
    /// Decimal degrees, east positive
    pub longitude: f64,
    /// Metres above sea level
    pub altitude: f64,
}

/// Reference panel observation attached to panel captures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelReading {
    /// Known panel reflectance per band; `None` where the panel card has no value
    pub albedo: Vec<Option<f64>>,
    /// Panel location in each band's pixel grid
    pub regions: Vec<Option<PixelRect>>,
}

/// One decoded band of a capture.
#[derive(Debug, Clone)]
pub struct BandImage {
    /// Zero-based band slot (band number minus one), stable when other band files are missing
    pub index: usize,
    pub path: PathBuf,
    pub width: usize,
    pub height: usize,
    pub data: Vec<u16>,
    pub calibration: BandCalibration,
}

#[derive(Debug, Clone)]
pub struct Capture {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub gps: GpsPosition,
    pub bands: Vec<BandImage>,
    pub panel: Option<PanelReading>,
}

impl Capture {
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Focal length and focal-plane resolution of the first band.
    pub fn optics(&self) -> (f64, f64) {
        self.bands
            .first()
            .map(|b| (b.calibration.focal_length_mm, b.calibration.focal_plane_resolution_px_per_mm))
            .unwrap_or((0.0, 0.0))
    }
}
