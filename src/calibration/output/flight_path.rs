use std::path::Path;

use serde_json::json;

use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::output::metadata_log::CaptureMetadataRecord;

/// Writes the capture positions as a GeoJSON `FeatureCollection` of points.
pub fn write_flight_path(path: &Path, records: &[CaptureMetadataRecord]) -> Result<()> {
    let features: Vec<_> = records
        .iter()
        .map(|r| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [r.gps.longitude, r.gps.latitude],
                },
                "properties": {
                    "file": r.source_file.display().to_string(),
                    "timestamp": r.timestamp.to_rfc3339(),
                    "altitude": r.gps.altitude,
                },
            })
        })
        .collect();
    let collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    let text = serde_json::to_string_pretty(&collection)
        .map_err(|e| CalibrationError::EncodeError(e.to_string()))?;
    std::fs::write(path, text)
        .map_err(|e| CalibrationError::OutputWriteError(format!("{}: {}", path.display(), e)))
}
