use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::calibration::common::error::{CalibrationError, Result};

/// Writes the metadata log back into the stack files' embedded metadata.
pub trait MetadataTagger {
    fn tag(&self, csv_path: &Path, directory: &Path) -> Result<()>;
}

/// Runs `exiftool -csv=<log> -overwrite_original <dir>`.
pub struct ExifToolTagger {
    program: PathBuf,
}

impl ExifToolTagger {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for ExifToolTagger {
    fn default() -> Self {
        Self::new("exiftool")
    }
}

impl MetadataTagger for ExifToolTagger {
    fn tag(&self, csv_path: &Path, directory: &Path) -> Result<()> {
        info!(
            program = %self.program.display(),
            csv = %csv_path.display(),
            "Writing metadata into stacks"
        );
        let status = Command::new(&self.program)
            .arg(format!("-csv={}", csv_path.display()))
            .arg("-overwrite_original")
            .arg(directory)
            .status()
            .map_err(|e| {
                CalibrationError::ExternalTagging(format!("{}: {}", self.program.display(), e))
            })?;
        if !status.success() {
            return Err(CalibrationError::ExternalTagging(format!(
                "{} exited with {}",
                self.program.display(),
                status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "a signal".to_string())
            )));
        }
        Ok(())
    }
}
