//! Band-to-band registration module
//!
//! Estimates, from one representative capture, the transforms that bring
//! every band into the pixel grid of a reference band. The result is computed
//! once per flight and shared read-only by every capture worker.

mod config;
pub mod ecc;
mod estimator;
mod transform;


pub use config::AlignmentConfig;
pub use ecc::{EccParams, Registration, RegistrationError, register, register_pyramid};
pub use estimator::{AlignmentEstimator, AlignmentReport};
pub use transform::{MotionModel, Transform, TransformSet};
