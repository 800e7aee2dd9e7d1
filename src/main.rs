use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use altum_calib_rs::calibration::output::StackEncoding;
use altum_calib_rs::calibration::{
    AlignmentConfig, CalibrationConfig, CalibrationPipeline, ExifToolTagger,
    StackSampleFormat, StandardStackWriter, TiffCaptureReader,
};
use altum_calib_rs::logger;

use tracing::{error, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StackFormat {
    Float32,
    U16,
}

/// Calibrates a flight of multispectral captures into aligned reflectance stacks
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Directory holding the calibration panel captures
    #[arg(short = 'p', long)]
    panel: Option<PathBuf>,

    /// Directory holding the flight captures
    #[arg(short = 'i', long)]
    imageset: PathBuf,

    /// Output directory; stacks go to <output>/tif_ex, previews to <output>/jpeg
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Write a JPEG preview per capture
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    thumbnail: bool,

    /// Divide by panel irradiance; false writes radiance
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    irradiance: bool,

    /// Reprocess captures that already have a stack
    #[arg(long)]
    overwrite: bool,

    /// ECC iteration cap per pyramid level
    #[arg(long, default_value_t = 5)]
    max_iterations: usize,

    #[arg(long, default_value_t = 1)]
    pyramid_levels: usize,

    /// Band index every other band is aligned to
    #[arg(long, default_value_t = 1)]
    reference_band: usize,

    /// Reuse a warp_matrices.json from an earlier run
    #[arg(long)]
    warp_matrices: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "float32")]
    stack_format: StackFormat,

    /// Do not run the metadata tagging tool
    #[arg(long)]
    skip_tagging: bool,

    /// Also write the capture positions as GeoJSON
    #[arg(long)]
    flight_path: bool,

    #[arg(long, env = "EXIFTOOL_PATH", default_value = "exiftool")]
    exiftool: PathBuf,

    /// Debug logging with per-capture timings
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if args.verbose {
        logger::init_verbose();
    } else {
        logger::init();
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let alignment = AlignmentConfig {
        reference_band: args.reference_band,
        max_iterations: args.max_iterations,
        pyramid_levels: args.pyramid_levels,
        ..AlignmentConfig::default()
    };
    let encoding = StackEncoding {
        sample_format: match args.stack_format {
            StackFormat::Float32 => StackSampleFormat::Float32,
            StackFormat::U16 => StackSampleFormat::ScaledU16,
        },
        ..StackEncoding::default()
    };

    let config = CalibrationConfig::builder()
        .panel_dir(args.panel.as_ref())
        .imageset_dir(&args.imageset)
        .output_dir(&args.output)
        .generate_thumbnails(args.thumbnail)
        .use_irradiance(args.irradiance)
        .overwrite(args.overwrite)
        .alignment(alignment)
        .encoding(encoding)
        .warp_matrices(args.warp_matrices.as_ref())
        .write_flight_path(args.flight_path)
        .skip_tagging(args.skip_tagging)
        .build();

    info!("Starting calibration of {}", config.imageset_dir.display());
    info!("Output: {}", config.stack_dir().display());

    let pipeline = CalibrationPipeline::with_custom(
        TiffCaptureReader,
        StandardStackWriter,
        ExifToolTagger::new(args.exiftool.clone()),
        config,
    );

    let summary = pipeline
        .run()
        .with_context(|| format!("calibrating {}", args.imageset.display()))?;

    info!(
        "Done: {} written, {} already present, {} skipped ({} mode)",
        summary.succeeded(),
        summary.already_persisted(),
        summary.skipped(),
        summary.mode.as_str()
    );
    for warning in &summary.warnings {
        info!("Flight warning: {}", warning);
    }
    Ok(())
}
