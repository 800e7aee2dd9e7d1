//! Directory enumeration for captures.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::calibration::common::error::{CalibrationError, Result};

/// Location of one capture's files, before any pixel data is read.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSource {
    /// File prefix shared by every band, e.g. `IMG_0042`
    pub name: String,
    /// One-based band numbers and their files, sorted by band number
    pub bands: Vec<(usize, PathBuf)>,
    pub metadata_path: PathBuf,
}

impl CaptureSource {
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Stem used for every artifact derived from this capture: the first
    /// band's file stem (`IMG_0042_1`).
    pub fn output_base(&self) -> String {
        self.bands
            .first()
            .and_then(|(_, p)| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }
}

#[derive(Debug, Clone)]
pub struct ImageSet {
    pub directory: PathBuf,
    pub captures: Vec<CaptureSource>,
}

impl ImageSet {
    /// Groups `<prefix>_<band>.tif` files under `dir` into captures.
    ///
    /// Captures come back sorted by prefix. Files that do not follow the
    /// naming convention are ignored.
    pub fn from_directory(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| CalibrationError::ImagesetLoad(format!("{}: {}", dir.display(), e)))?;

        let mut grouped: BTreeMap<String, Vec<(usize, PathBuf)>> = BTreeMap::new();
        for entry in entries {
            let path = entry
                .map_err(|e| CalibrationError::ImagesetLoad(format!("{}: {}", dir.display(), e)))?
                .path();
            match parse_band_file(&path) {
                Some((prefix, band)) => grouped.entry(prefix).or_default().push((band, path)),
                None => debug!("Ignoring {}", path.display()),
            }
        }

        if grouped.is_empty() {
            return Err(CalibrationError::ImagesetLoad(format!(
                "{}: no band images found",
                dir.display()
            )));
        }

        let captures: Vec<CaptureSource> = grouped
            .into_iter()
            .map(|(name, mut bands)| {
                bands.sort_by_key(|(band, _)| *band);
                CaptureSource {
                    metadata_path: dir.join(format!("{}.json", name)),
                    name,
                    bands,
                }
            })
            .collect();

        info!(directory = %dir.display(), captures = captures.len(), "Loaded imageset");
        Ok(Self {
            directory: dir.to_path_buf(),
            captures,
        })
    }

    pub fn from_sources(directory: impl Into<PathBuf>, captures: Vec<CaptureSource>) -> Self {
        Self {
            directory: directory.into(),
            captures,
        }
    }

    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    pub fn max_band_count(&self) -> usize {
        self.captures.iter().map(CaptureSource::band_count).max().unwrap_or(0)
    }

    /// First capture carrying the full band count of the flight.
    pub fn representative_index(&self) -> Option<usize> {
        let full = self.max_band_count();
        if full == 0 {
            return None;
        }
        self.captures.iter().position(|c| c.band_count() == full)
    }
}

/// Splits `IMG_0042_3.tif` into (`IMG_0042`, 3).
fn parse_band_file(path: &Path) -> Option<(String, usize)> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if ext != "tif" && ext != "tiff" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (prefix, band) = stem.rsplit_once('_')?;
    let band: usize = band.parse().ok()?;
    if prefix.is_empty() || band == 0 {
        return None;
    }
    Some((prefix.to_string(), band))
}

