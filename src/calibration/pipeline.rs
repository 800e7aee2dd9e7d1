//! Flight orchestration module
//!
//! Sequences panel irradiance, alignment and the per-capture workers, then
//! writes the metadata log and hands it to the tagging tool.

mod config;
mod run;
mod status;


pub use config::{CalibrationConfig, CalibrationConfigBuilder};
pub use run::CalibrationPipeline;
pub use status::{CaptureReport, CaptureStatus, RunSummary, SkipReason};
