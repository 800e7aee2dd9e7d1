//! JSON sidecar carrying the per-capture metadata extracted from the camera.
//!
//! The sidecar sits next to the band files as `<prefix>.json`:
//!
//! ```json
//! {
//!   "timestamp": "2022-06-01T10:21:03Z",
//!   "gps": { "latitude": -33.5, "longitude": 151.2, "altitude": 120.0 },
//!   "panel": { "albedo": [0.5, 0.5, 0.5, 0.5, 0.5], "regions": [...] },
//!   "bands": [ { "band_name": "Blue", "gain": 1.0, ... }, ... ]
//! }
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calibration::capture::types::{BandCalibration, GpsPosition, PanelReading};
use crate::calibration::common::error::{CalibrationError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureMetadata {
    pub timestamp: DateTime<Utc>,
    pub gps: GpsPosition,
    #[serde(default)]
    pub panel: Option<PanelReading>,
    /// Calibration for band numbers `1..=bands.len()`
    pub bands: Vec<BandCalibration>,
}

impl CaptureMetadata {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CalibrationError::InputReadError(format!("{}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text)
            .map_err(|e| CalibrationError::MetadataError(format!("{}: {}", path.display(), e)))
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| CalibrationError::MetadataError(e.to_string()))?;
        std::fs::write(path, text).map_err(|e| {
            CalibrationError::OutputWriteError(format!("{}: {}", path.display(), e))
        })
    }

    /// Calibration of a one-based band number.
    pub fn band(&self, band_number: usize) -> Option<&BandCalibration> {
        band_number.checked_sub(1).and_then(|i| self.bands.get(i))
    }
}
