//! Per-capture metadata log consumed by the external tagging tool.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::calibration::capture::GpsPosition;
use crate::calibration::common::error::{CalibrationError, Result};

pub const CSV_HEADER: &str = "SourceFile,DateTimeOriginal,GPSDateStamp,GPSTimeStamp,\
GPSLatitude,GPSLatitudeRef,GPSLongitude,GPSLongitudeRef,GPSAltitude,GPSAltitudeRef,\
FocalLength,XResolution,YResolution,ResolutionUnits";

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureMetadataRecord {
    pub source_file: PathBuf,
    pub timestamp: DateTime<Utc>,
    pub gps: GpsPosition,
    pub focal_length_mm: f64,
    /// Focal plane resolution in pixels per millimetre
    pub resolution: f64,
}

/// Splits decimal degrees into whole degrees, whole minutes and seconds
/// rounded to the nearest hundredth.
/// The sign is carried by the degrees term.
pub fn decimal_to_dms(dd: f64) -> (f64, f64, f64) {
    // Rounded to hundredths of a second before splitting so seconds stay below 60.
    let centiseconds = (dd.abs() * 360_000.0).round() as u64;
    let degrees = (centiseconds / 360_000) as f64;
    let minutes = (centiseconds / 6_000 % 60) as f64;
    let seconds = (centiseconds % 6_000) as f64 / 100.0;
    (if dd < 0.0 { -degrees } else { degrees }, minutes, seconds)
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// `"33 deg 32' 9.73"" N"` style coordinate plus its reference word.
fn dms_field(dd: f64, positive: &'static str, negative: &'static str) -> (String, &'static str) {
    let (deg, min, sec) = decimal_to_dms(dd);
    let reference = if dd < 0.0 { negative } else { positive };
    let text = format!(
        "{} deg {}' {:.2}\" {}",
        deg.abs() as i64,
        min as i64,
        sec,
        &reference[..1]
    );
    (quote(&text), reference)
}

impl CaptureMetadataRecord {
    pub fn to_csv_row(&self) -> String {
        let (lat, lat_ref) = dms_field(self.gps.latitude, "North", "South");
        let (lon, lon_ref) = dms_field(self.gps.longitude, "East", "West");
        let mut row = String::new();
        let _ = write!(
            row,
            "{},{},{},{},{},{},{},{},{:.1} m Above Sea Level,Above Sea Level,{},{},{},mm",
            quote(&self.source_file.display().to_string()),
            self.timestamp.format("%Y:%m:%d %H:%M:%S"),
            self.timestamp.format("%Y:%m:%d"),
            self.timestamp.format("%H:%M:%S"),
            lat,
            lat_ref,
            lon,
            lon_ref,
            self.gps.altitude,
            self.focal_length_mm,
            self.resolution,
            self.resolution,
        );
        row
    }
}

pub fn write_metadata_log(path: &Path, records: &[CaptureMetadataRecord]) -> Result<()> {
    let mut text = String::with_capacity(CSV_HEADER.len() + 1 + records.len() * 160);
    text.push_str(CSV_HEADER);
    text.push('\n');
    for record in records {
        text.push_str(&record.to_csv_row());
        text.push('\n');
    }
    std::fs::write(path, text)
        .map_err(|e| CalibrationError::OutputWriteError(format!("{}: {}", path.display(), e)))
}
