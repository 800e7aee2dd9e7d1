//! Synthetic captures shared by the unit tests.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use tiff::encoder::{TiffEncoder, colortype};

use crate::calibration::capture::{
    BandCalibration, BandImage, BandKind, Capture, CaptureMetadata, GpsPosition, PanelReading,
};
use crate::calibration::common::raster::PixelRect;

/// Smooth, non-periodic texture sampled at `(x - dx, y - dy)`.
pub fn pattern(x: f64, y: f64, dx: f64, dy: f64) -> f64 {
    let (x, y) = (x - dx, y - dy);
    (0.31 * x + 0.07 * y).sin() + (0.23 * y - 0.05 * x).cos() + 0.5 * (0.17 * x).sin() * (0.13 * y).cos()
}

/// Raw counts for `pattern`, centred well inside the 16-bit range.
pub fn pattern_counts(width: usize, height: usize, dx: f64, dy: f64) -> Vec<u16> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            data.push((30000.0 + 8000.0 * pattern(x as f64, y as f64, dx, dy)) as u16);
        }
    }
    data
}

pub fn band_image(index: usize, width: usize, height: usize, data: Vec<u16>) -> BandImage {
    BandImage {
        index,
        path: PathBuf::from(format!("IMG_0000_{}.tif", index + 1)),
        width,
        height,
        data,
        calibration: BandCalibration::nominal(format!("Band{}", index + 1)),
    }
}

pub fn thermal_band(index: usize, width: usize, height: usize, centi_kelvin: u16) -> BandImage {
    let mut band = band_image(index, width, height, vec![centi_kelvin; width * height]);
    band.calibration.kind = BandKind::Thermal;
    band.calibration.band_name = "LWIR".to_string();
    band
}

pub fn capture_of(name: &str, bands: Vec<BandImage>) -> Capture {
    Capture {
        name: name.to_string(),
        timestamp: Utc.with_ymd_and_hms(2022, 6, 1, 10, 21, 3).unwrap(),
        gps: GpsPosition {
            latitude: -33.5,
            longitude: 151.25,
            altitude: 120.0,
        },
        bands,
        panel: None,
    }
}

pub fn sidecar(band_count: usize, panel: Option<PanelReading>) -> CaptureMetadata {
    CaptureMetadata {
        timestamp: Utc.with_ymd_and_hms(2022, 6, 1, 10, 21, 3).unwrap(),
        gps: GpsPosition {
            latitude: -33.5,
            longitude: 151.25,
            altitude: 120.0,
        },
        panel,
        bands: (1..=band_count)
            .map(|n| {
                let mut cal = BandCalibration::nominal(format!("Band{}", n));
                cal.focal_length_mm = 5.5;
                cal.focal_plane_resolution_px_per_mm = 266.67;
                cal
            })
            .collect(),
    }
}

/// Panel reading covering `region` in every band with the same albedo.
pub fn panel_reading(band_count: usize, albedo: f64, region: PixelRect) -> PanelReading {
    PanelReading {
        albedo: vec![Some(albedo); band_count],
        regions: vec![Some(region); band_count],
    }
}

pub fn write_band_tiff(path: &Path, width: usize, height: usize, data: &[u16]) {
    let file = File::create(path).unwrap();
    let mut encoder = TiffEncoder::new(file).unwrap();
    encoder
        .write_image::<colortype::Gray16>(width as u32, height as u32, data)
        .unwrap();
}

/// Writes `<prefix>_1.tif ..= <prefix>_<bands>.tif` plus `<prefix>.json`.
/// The sidecar always describes `metadata_bands` bands.
pub fn write_capture(
    dir: &Path,
    prefix: &str,
    bands: usize,
    metadata_bands: usize,
    width: usize,
    height: usize,
    panel: Option<PanelReading>,
) {
    let data = pattern_counts(width, height, 0.0, 0.0);
    for n in 1..=bands {
        write_band_tiff(&dir.join(format!("{}_{}.tif", prefix, n)), width, height, &data);
    }
    sidecar(metadata_bands, panel)
        .write_to(&dir.join(format!("{}.json", prefix)))
        .unwrap();
}
