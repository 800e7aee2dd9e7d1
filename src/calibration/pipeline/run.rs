use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info, info_span, instrument, warn};

use crate::calibration::aligner::{CaptureAligner, ReflectanceStack};
use crate::calibration::alignment::{AlignmentEstimator, TransformSet};
use crate::calibration::capture::{
    Capture, CaptureReader, CaptureSource, ImageSet, TiffCaptureReader,
};
use crate::calibration::common::error::{CalibrationError, CalibrationWarning, Result};
use crate::calibration::common::timing::RunTimings;
use crate::calibration::output::{
    CaptureMetadataRecord, ExifToolTagger, MetadataTagger, StackWriter, StandardStackWriter,
    save_preview, write_flight_path, write_metadata_log,
};
use crate::calibration::panel::{IrradianceVector, PanelIrradianceEstimator};
use crate::calibration::pipeline::config::CalibrationConfig;
use crate::calibration::pipeline::status::{CaptureReport, CaptureStatus, RunSummary, SkipReason};
use crate::calibration::reflectance::ReflectanceConverter;

/// Flight-wide values fixed before any capture worker starts.
struct FlightContext {
    irradiance: Option<IrradianceVector>,
    transforms: TransformSet,
    warnings: Vec<CalibrationWarning>,
}

pub struct CalibrationPipeline<R: CaptureReader, W: StackWriter, T: MetadataTagger> {
    reader: R,
    writer: W,
    tagger: T,
    config: CalibrationConfig,
}

impl CalibrationPipeline<TiffCaptureReader, StandardStackWriter, ExifToolTagger> {
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            reader: TiffCaptureReader,
            writer: StandardStackWriter,
            tagger: ExifToolTagger::default(),
            config,
        }
    }
}

impl<R, W, T> CalibrationPipeline<R, W, T>
where
    R: CaptureReader + Sync,
    W: StackWriter + Sync,
    T: MetadataTagger + Sync,
{
    pub fn with_custom(reader: R, writer: W, tagger: T, config: CalibrationConfig) -> Self {
        Self {
            reader,
            writer,
            tagger,
            config,
        }
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: CalibrationConfig) {
        self.config = config;
    }

    /// Processes the whole flight.
    ///
    /// Only panel, imageset, representative-alignment and tagging failures
    /// are returned as errors; per-capture failures end up in the summary.
    #[instrument(skip(self), fields(imageset = %self.config.imageset_dir.display()))]
    pub fn run(&self) -> Result<RunSummary> {
        let mut timings = RunTimings::new();
        self.prepare_output_dirs()?;

        let (irradiance, mut warnings) = timings.time("panel", || self.flight_irradiance())?;
        let imageset = timings.time("load_imageset", || {
            ImageSet::from_directory(&self.config.imageset_dir)
        })?;
        let (transforms, alignment_warnings) =
            timings.time("alignment", || self.flight_transforms(&imageset))?;
        warnings.extend(alignment_warnings);

        let flight = FlightContext {
            irradiance,
            transforms,
            warnings,
        };

        let reports: Vec<CaptureReport> = timings.time("captures", || {
            imageset
                .captures
                .par_iter()
                .map(|source| self.process_capture(source, &flight))
                .collect()
        });

        let summary = RunSummary {
            mode: ReflectanceConverter::new(flight.irradiance.as_ref()).mode(),
            reports,
            warnings: flight.warnings,
        };

        timings.time("metadata", || self.finish_metadata(&summary))?;

        info!(
            succeeded = summary.succeeded(),
            already_persisted = summary.already_persisted(),
            skipped = summary.skipped(),
            fallback = summary.fallback(),
            mode = summary.mode.as_str(),
            "Flight processed"
        );
        timings.log_summary();
        Ok(summary)
    }

    fn prepare_output_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(self.config.stack_dir())?;
        if self.config.generate_thumbnails {
            std::fs::create_dir_all(self.config.preview_dir())?;
        }
        Ok(())
    }

    /// Mean panel irradiance, or `None` (with a warning) when the flight is
    /// processed as radiance.
    fn flight_irradiance(&self) -> Result<(Option<IrradianceVector>, Vec<CalibrationWarning>)> {
        let panel_dir = match (&self.config.panel_dir, self.config.use_irradiance) {
            (Some(dir), true) => dir,
            _ => {
                warn!("{}", CalibrationWarning::MissingIrradiance);
                return Ok((None, vec![CalibrationWarning::MissingIrradiance]));
            }
        };

        let panel_set = ImageSet::from_directory(panel_dir)?;
        let mut captures = Vec::with_capacity(panel_set.len());
        for source in &panel_set.captures {
            match self.reader.load(source) {
                Ok(capture) => captures.push(capture),
                Err(e) => warn!(capture = %source.name, "Skipping panel capture: {}", e),
            }
        }
        let irradiance = PanelIrradianceEstimator::estimate_from_captures(&captures)?;
        Ok((Some(irradiance), Vec::new()))
    }

    /// Loads the configured transform set or estimates one from the
    /// representative capture, then writes it next to the stacks.
    fn flight_transforms(
        &self,
        imageset: &ImageSet,
    ) -> Result<(TransformSet, Vec<CalibrationWarning>)> {
        let (transforms, warnings) = match &self.config.warp_matrices {
            Some(path) => {
                info!(path = %path.display(), "Reusing transform set");
                (TransformSet::load_json(path)?, Vec::new())
            }
            None => {
                let index = imageset.representative_index().ok_or_else(|| {
                    CalibrationError::ImagesetLoad("imageset has no complete capture".to_string())
                })?;
                let source = &imageset.captures[index];
                info!(capture = %source.name, "Estimating alignment from representative capture");
                let capture = self.reader.load(source)?;
                let report = AlignmentEstimator::new(self.config.alignment.clone()).estimate(&capture)?;
                (report.transforms, report.warnings)
            }
        };

        for (band, t) in transforms.transforms.iter().enumerate() {
            debug!(band, matrix = ?t.to_rows(), "Band transform");
        }
        transforms.save_json(&self.config.warp_matrices_path())?;
        Ok((transforms, warnings))
    }

    /// Runs one capture through its lifecycle. Never fails: problems are
    /// recorded in the returned report.
    fn process_capture(&self, source: &CaptureSource, flight: &FlightContext) -> CaptureReport {
        let base = source.output_base();
        let _span = info_span!("capture", capture = %source.name).entered();
        let mut report = CaptureReport::new(source.name.clone(), base.clone());
        let stack_path = self.config.stack_path(&base);

        if stack_path.exists() && !self.config.overwrite {
            debug!(path = %stack_path.display(), "Stack exists, skipping");
            report.status = CaptureStatus::AlreadyPersisted;
            match self.reader.load_metadata(source) {
                Ok(metadata) => {
                    let band = metadata.bands.first();
                    report.record = Some(CaptureMetadataRecord {
                        source_file: stack_path,
                        timestamp: metadata.timestamp,
                        gps: metadata.gps,
                        focal_length_mm: band.map(|b| b.focal_length_mm).unwrap_or_default(),
                        resolution: band
                            .map(|b| b.focal_plane_resolution_px_per_mm)
                            .unwrap_or_default(),
                    });
                }
                Err(e) => warn!("No metadata for existing stack: {}", e),
            }
            return report;
        }

        let expected = flight.transforms.len();
        if source.band_count() != expected {
            return skip(report, SkipReason::BandCountMismatch {
                expected,
                found: source.band_count(),
            });
        }

        let capture = match self.reader.load(source) {
            Ok(capture) => capture,
            Err(e) => return skip(report, SkipReason::LoadFailed(e.to_string())),
        };
        report.status = CaptureStatus::Loaded;

        match self.convert_align_persist(&capture, &stack_path, flight, &mut report) {
            Ok(()) => {
                let (focal_length_mm, resolution) = capture.optics();
                report.record = Some(CaptureMetadataRecord {
                    source_file: stack_path,
                    timestamp: capture.timestamp,
                    gps: capture.gps,
                    focal_length_mm,
                    resolution,
                });
                report.warnings.extend(flight.warnings.iter().cloned());
                info!("Capture persisted");
            }
            Err(CalibrationError::BandCountMismatch { expected, found }) => {
                report = skip(report, SkipReason::BandCountMismatch { expected, found });
            }
            Err(e) => {
                report = skip(report, SkipReason::ProcessingFailed(e.to_string()));
            }
        }
        // Raw buffers are released here, before the next capture on this worker.
        drop(capture);
        report
    }

    fn convert_align_persist(
        &self,
        capture: &Capture,
        stack_path: &Path,
        flight: &FlightContext,
        report: &mut CaptureReport,
    ) -> Result<()> {
        let converter = ReflectanceConverter::new(flight.irradiance.as_ref());
        let converted = converter.convert_all(&capture.bands)?;
        report.status = CaptureStatus::Converted;

        let stack = CaptureAligner::new(&flight.transforms).align(capture, &converted, converter.mode())?;
        drop(converted);
        report.status = CaptureStatus::Aligned;

        // Write beside the target and rename so an interrupted run never
        // leaves a truncated stack that a later run would treat as done.
        let partial_path = stack_path.with_extension("tif.partial");
        let written = self
            .write_partial(&stack, &partial_path)
            .and_then(|()| std::fs::rename(&partial_path, stack_path).map_err(CalibrationError::from));
        if let Err(e) = written {
            if let Err(cleanup) = std::fs::remove_file(&partial_path) {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!("Could not remove {}: {}", partial_path.display(), cleanup);
                }
            }
            return Err(e);
        }
        report.status = CaptureStatus::Persisted;

        if self.config.generate_thumbnails {
            let preview_path = self.config.preview_path(&report.output_base);
            if let Err(e) = save_preview(&stack, self.config.rgb_bands, &preview_path) {
                warn!("Preview not written: {}", e);
            }
        }
        Ok(())
    }

    fn write_partial(&self, stack: &ReflectanceStack, partial_path: &Path) -> Result<()> {
        let file = File::create(partial_path).map_err(|e| {
            CalibrationError::OutputWriteError(format!("{}: {}", partial_path.display(), e))
        })?;
        let mut out = BufWriter::new(file);
        self.writer.write_stack(stack, &mut out, &self.config.encoding)?;
        out.flush()?;
        Ok(())
    }

    fn finish_metadata(&self, summary: &RunSummary) -> Result<()> {
        let records = summary.records();
        let log_path = self.config.metadata_log_path();
        write_metadata_log(&log_path, &records)?;
        info!(path = %log_path.display(), rows = records.len(), "Metadata log written");

        if self.config.write_flight_path {
            write_flight_path(&self.config.flight_path_path(), &records)?;
        }

        if self.config.skip_tagging {
            info!("Metadata tagging disabled");
        } else if records.is_empty() {
            info!("No stacks to tag");
        } else {
            self.tagger.tag(&log_path, &self.config.stack_dir())?;
        }
        Ok(())
    }
}

fn skip(mut report: CaptureReport, reason: SkipReason) -> CaptureReport {
    warn!(capture = %report.name, "Capture skipped: {}", reason);
    report.status = CaptureStatus::Skipped(reason);
    report
}
