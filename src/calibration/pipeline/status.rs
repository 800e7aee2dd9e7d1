//! Per-capture lifecycle and run summary types

use crate::calibration::common::error::CalibrationWarning;
use crate::calibration::output::CaptureMetadataRecord;
use crate::calibration::reflectance::CalibrationMode;

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    BandCountMismatch { expected: usize, found: usize },
    LoadFailed(String),
    ProcessingFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::BandCountMismatch { expected, found } => {
                write!(f, "band count mismatch: {} of {} bands", found, expected)
            }
            SkipReason::LoadFailed(e) => write!(f, "load failed: {}", e),
            SkipReason::ProcessingFailed(e) => write!(f, "processing failed: {}", e),
        }
    }
}

/// Where a capture is in `Pending -> Loaded -> Converted -> Aligned -> Persisted`.
///
/// Raw buffers are released as soon as the capture leaves `Aligned`, whatever
/// the outcome. A stack found on disk short-circuits to `AlreadyPersisted`.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureStatus {
    Pending,
    Loaded,
    Converted,
    Aligned,
    Persisted,
    AlreadyPersisted,
    Skipped(SkipReason),
}

impl CaptureStatus {
    /// A stack exists for this capture, from this run or an earlier one.
    pub fn has_output(&self) -> bool {
        matches!(self, CaptureStatus::Persisted | CaptureStatus::AlreadyPersisted)
    }
}

#[derive(Debug, Clone)]
pub struct CaptureReport {
    pub name: String,
    pub output_base: String,
    pub status: CaptureStatus,
    pub warnings: Vec<CalibrationWarning>,
    pub record: Option<CaptureMetadataRecord>,
}

impl CaptureReport {
    pub fn new(name: impl Into<String>, output_base: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output_base: output_base.into(),
            status: CaptureStatus::Pending,
            warnings: Vec::new(),
            record: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub mode: CalibrationMode,
    pub reports: Vec<CaptureReport>,
    /// Flight-wide warnings (irradiance, alignment fallbacks)
    pub warnings: Vec<CalibrationWarning>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.count(|r| r.status == CaptureStatus::Persisted)
    }

    pub fn already_persisted(&self) -> usize {
        self.count(|r| r.status == CaptureStatus::AlreadyPersisted)
    }

    pub fn skipped(&self) -> usize {
        self.count(|r| matches!(r.status, CaptureStatus::Skipped(_)))
    }

    /// Captures written under a degraded calibration or alignment.
    pub fn fallback(&self) -> usize {
        self.count(|r| r.status == CaptureStatus::Persisted && !r.warnings.is_empty())
    }

    pub fn records(&self) -> Vec<CaptureMetadataRecord> {
        self.reports.iter().filter_map(|r| r.record.clone()).collect()
    }

    fn count(&self, f: impl Fn(&CaptureReport) -> bool) -> usize {
        self.reports.iter().filter(|r| f(r)).count()
    }
}
