//! Shared error types, raster buffers and stage timing.

pub mod error;
pub mod raster;
pub mod timing;


pub use error::{CalibrationError, CalibrationWarning, Result};
pub use raster::{PixelRect, Raster};
pub use timing::{RunTimings, StageTiming, Timer};
