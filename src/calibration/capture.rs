//! Capture loading module
//!
//! A capture is the set of co-timed band images from one shutter event. This
//! module enumerates captures on disk and decodes them together with their
//! calibration metadata.

mod reader;
mod tiff_reader;
mod imageset;
pub mod metadata;
pub mod types;

#[cfg(test)]
mod tests;

pub use reader::CaptureReader;
pub use tiff_reader::TiffCaptureReader;
pub use imageset::{CaptureSource, ImageSet};
pub use metadata::CaptureMetadata;
pub use types::{BandCalibration, BandImage, BandKind, Capture, GpsPosition, PanelReading};
