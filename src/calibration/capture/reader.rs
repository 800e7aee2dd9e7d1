use crate::calibration::capture::imageset::CaptureSource;
use crate::calibration::capture::metadata::CaptureMetadata;
use crate::calibration::capture::types::Capture;
use crate::calibration::common::error::Result;

/// Decodes a capture's band images and metadata into memory.
pub trait CaptureReader {
    fn load(&self, source: &CaptureSource) -> Result<Capture>;

    /// Metadata only, without touching pixel data.
    fn load_metadata(&self, source: &CaptureSource) -> Result<CaptureMetadata>;
}
