use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("No usable panel reflectance readings among {examined} panel captures")]
    InsufficientPanelData { examined: usize },

    #[error("Failed to load imageset: {0}")]
    ImagesetLoad(String),

    #[error("Capture has {found} bands, expected {expected}")]
    BandCountMismatch { expected: usize, found: usize },

    #[error("External metadata tagging failed: {0}")]
    ExternalTagging(String),

    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode band image: {0}")]
    DecodeError(String),

    #[error("Failed to encode output image: {0}")]
    EncodeError(String),

    #[error("Invalid capture metadata: {0}")]
    MetadataError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CalibrationError {
    /// Fatal errors abort the whole flight; the rest only cost one capture.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CalibrationError::InsufficientPanelData { .. }
                | CalibrationError::ImagesetLoad(_)
                | CalibrationError::ExternalTagging(_)
        )
    }
}

/// Conditions that degrade the output but never stop processing.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationWarning {
    /// Registration of `band` failed and it was left with the identity transform.
    AlignmentConvergence { band: usize, reason: String },
    /// No irradiance for the flight; outputs carry radiance instead of reflectance.
    MissingIrradiance,
}

impl std::fmt::Display for CalibrationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalibrationWarning::AlignmentConvergence { band, reason } => {
                write!(f, "band {} alignment fell back to identity: {}", band, reason)
            }
            CalibrationWarning::MissingIrradiance => {
                write!(f, "irradiance unavailable, writing radiance-only output")
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CalibrationError>;
