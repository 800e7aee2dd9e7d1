//! Band reader for single-band TIFF captures.
//!
//! Each band of a capture is stored as its own grayscale TIFF. The pixel data
//! is decoded with the `tiff` crate and paired with the calibration entry of
//! the capture's JSON sidecar.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tracing::debug;

use crate::calibration::capture::imageset::CaptureSource;
use crate::calibration::capture::metadata::CaptureMetadata;
use crate::calibration::capture::reader::CaptureReader;
use crate::calibration::capture::types::{BandImage, Capture};
use crate::calibration::common::error::{CalibrationError, Result};

/// Reads captures stored as `<prefix>_<band>.tif` files plus `<prefix>.json`.
pub struct TiffCaptureReader;

impl TiffCaptureReader {
    /// Decodes one grayscale band file into 16-bit samples.
    ///
    /// 8-bit files are widened without rescaling; the calibration's
    /// `bits_per_pixel` decides how counts are normalised later on.
    pub fn read_band(path: &Path) -> Result<(usize, usize, Vec<u16>)> {
        let file = File::open(path).map_err(|e| {
            CalibrationError::InputReadError(format!("{}: {}", path.display(), e))
        })?;
        let mut decoder = Decoder::new(BufReader::new(file))
            .map_err(|e| CalibrationError::DecodeError(format!("{}: {}", path.display(), e)))?;

        match decoder.colortype() {
            Ok(tiff::ColorType::Gray(_)) => {}
            Ok(other) => {
                return Err(CalibrationError::DecodeError(format!(
                    "{}: expected a single-band image, found {:?}",
                    path.display(),
                    other
                )));
            }
            Err(e) => {
                return Err(CalibrationError::DecodeError(format!("{}: {}", path.display(), e)));
            }
        }

        let (width, height) = decoder
            .dimensions()
            .map_err(|e| CalibrationError::DecodeError(format!("{}: {}", path.display(), e)))?;
        let (width, height) = (width as usize, height as usize);

        let data: Vec<u16> = match decoder
            .read_image()
            .map_err(|e| CalibrationError::DecodeError(format!("{}: {}", path.display(), e)))?
        {
            DecodingResult::U16(values) => values,
            DecodingResult::U8(values) => values.into_iter().map(u16::from).collect(),
            _ => {
                return Err(CalibrationError::DecodeError(format!(
                    "{}: unsupported sample format",
                    path.display()
                )));
            }
        };

        if data.len() != width * height {
            return Err(CalibrationError::InvalidDimensions(width, height));
        }

        debug!("Decoded band {}: {}x{}", path.display(), width, height);
        Ok((width, height, data))
    }
}

impl CaptureReader for TiffCaptureReader {
    fn load_metadata(&self, source: &CaptureSource) -> Result<CaptureMetadata> {
        CaptureMetadata::from_path(&source.metadata_path)
    }

    fn load(&self, source: &CaptureSource) -> Result<Capture> {
        let metadata = self.load_metadata(source)?;

        let mut bands = Vec::with_capacity(source.bands.len());
        for (band_number, path) in &source.bands {
            let calibration = metadata.band(*band_number).cloned().ok_or_else(|| {
                CalibrationError::MetadataError(format!(
                    "{}: no calibration for band {}",
                    source.metadata_path.display(),
                    band_number
                ))
            })?;
            let (width, height, data) = Self::read_band(path)?;
            bands.push(BandImage {
                index: band_number - 1,
                path: path.clone(),
                width,
                height,
                data,
                calibration,
            });
        }

        Ok(Capture {
            name: source.name.clone(),
            timestamp: metadata.timestamp,
            gps: metadata.gps,
            bands,
            panel: metadata.panel,
        })
    }
}
