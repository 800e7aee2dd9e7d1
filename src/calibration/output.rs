//! Output artifacts module
//!
//! Stack TIFFs, RGB previews, the metadata log, the external tagging step and
//! the flight path export.

mod writer;
mod standard_stack_writer;
mod preview;
mod metadata_log;
mod tagger;
mod flight_path;
pub mod types;

#[cfg(test)]
mod tests;

pub use writer::StackWriter;
pub use standard_stack_writer::StandardStackWriter;
pub use preview::{render_preview, save_preview};
pub use metadata_log::{CSV_HEADER, CaptureMetadataRecord, decimal_to_dms, write_metadata_log};
pub use tagger::{ExifToolTagger, MetadataTagger};
pub use flight_path::write_flight_path;
pub use types::{StackEncoding, StackSampleFormat, TiffCompression};
