//! Radiometric calibration of multispectral captures
//!
//! Panel irradiance, band registration, reflectance conversion and the
//! flight-level orchestration that ties them together.

pub mod common;
pub mod capture;
pub mod panel;
pub mod alignment;
pub mod reflectance;
pub mod aligner;
pub mod output;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod test_utils;

pub use common::{
    CalibrationError,
    CalibrationWarning,
    Result,
    Raster,
    PixelRect,
};

pub use capture::{
    BandCalibration,
    BandImage,
    BandKind,
    Capture,
    CaptureReader,
    CaptureSource,
    GpsPosition,
    ImageSet,
    PanelReading,
    TiffCaptureReader,
};

pub use panel::{IrradianceVector, PanelIrradianceEstimator, PanelSample};

pub use alignment::{
    AlignmentConfig,
    AlignmentEstimator,
    AlignmentReport,
    MotionModel,
    Transform,
    TransformSet,
};

pub use reflectance::{CalibrationMode, ReflectanceConverter};

pub use aligner::{CaptureAligner, ReflectanceStack};

pub use output::{
    CaptureMetadataRecord,
    ExifToolTagger,
    MetadataTagger,
    StackSampleFormat,
    StackWriter,
    StandardStackWriter,
    TiffCompression,
};

pub use pipeline::{
    CalibrationConfig,
    CalibrationConfigBuilder,
    CalibrationPipeline,
    CaptureReport,
    CaptureStatus,
    RunSummary,
    SkipReason,
};
