//! Flight run configuration

use std::path::{Path, PathBuf};

use crate::calibration::alignment::AlignmentConfig;
use crate::calibration::output::StackEncoding;

const STACK_DIR: &str = "tif_ex";
const PREVIEW_DIR: &str = "jpeg";

#[derive(Debug, Clone)]
pub struct CalibrationConfig {
    /// Panel captures; without them the flight is processed as radiance only
    pub panel_dir: Option<PathBuf>,
    pub imageset_dir: PathBuf,
    /// Stacks land in `<output>/tif_ex`, previews in `<output>/jpeg`
    pub output_dir: PathBuf,
    pub generate_thumbnails: bool,
    /// Divide by panel irradiance; when off, outputs are radiance
    pub use_irradiance: bool,
    /// Reprocess captures whose stack already exists
    pub overwrite: bool,
    pub alignment: AlignmentConfig,
    pub encoding: StackEncoding,
    /// Band indices rendered as red, green and blue in previews
    pub rgb_bands: [usize; 3],
    /// Reuse a transform set written by an earlier run instead of estimating
    pub warp_matrices: Option<PathBuf>,
    pub write_flight_path: bool,
    pub skip_tagging: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            panel_dir: None,
            imageset_dir: PathBuf::from("."),
            output_dir: PathBuf::from("output"),
            generate_thumbnails: true,
            use_irradiance: true,
            overwrite: false,
            alignment: AlignmentConfig::default(),
            encoding: StackEncoding::default(),
            rgb_bands: [2, 1, 0],
            warp_matrices: None,
            write_flight_path: false,
            skip_tagging: false,
        }
    }
}

impl CalibrationConfig {
    pub fn builder() -> CalibrationConfigBuilder {
        CalibrationConfigBuilder::default()
    }

    pub fn stack_dir(&self) -> PathBuf {
        self.output_dir.join(STACK_DIR)
    }

    pub fn preview_dir(&self) -> PathBuf {
        self.output_dir.join(PREVIEW_DIR)
    }

    pub fn stack_path(&self, base: &str) -> PathBuf {
        self.stack_dir().join(format!("{}.tif", base))
    }

    pub fn preview_path(&self, base: &str) -> PathBuf {
        self.preview_dir().join(format!("{}.jpg", base))
    }

    pub fn metadata_log_path(&self) -> PathBuf {
        self.stack_dir().join("log.csv")
    }

    pub fn warp_matrices_path(&self) -> PathBuf {
        self.stack_dir().join("warp_matrices.json")
    }

    pub fn flight_path_path(&self) -> PathBuf {
        self.stack_dir().join("imageset.json")
    }
}

/// Builder for CalibrationConfig
#[derive(Default)]
pub struct CalibrationConfigBuilder {
    panel_dir: Option<Option<PathBuf>>,
    imageset_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    generate_thumbnails: Option<bool>,
    use_irradiance: Option<bool>,
    overwrite: Option<bool>,
    alignment: Option<AlignmentConfig>,
    encoding: Option<StackEncoding>,
    rgb_bands: Option<[usize; 3]>,
    warp_matrices: Option<Option<PathBuf>>,
    write_flight_path: Option<bool>,
    skip_tagging: Option<bool>,
}

impl CalibrationConfigBuilder {
    pub fn panel_dir(mut self, dir: Option<impl AsRef<Path>>) -> Self {
        self.panel_dir = Some(dir.map(|d| d.as_ref().to_path_buf()));
        self
    }

    pub fn imageset_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.imageset_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn generate_thumbnails(mut self, enable: bool) -> Self {
        self.generate_thumbnails = Some(enable);
        self
    }

    pub fn use_irradiance(mut self, enable: bool) -> Self {
        self.use_irradiance = Some(enable);
        self
    }

    pub fn overwrite(mut self, enable: bool) -> Self {
        self.overwrite = Some(enable);
        self
    }

    pub fn alignment(mut self, alignment: AlignmentConfig) -> Self {
        self.alignment = Some(alignment);
        self
    }

    pub fn encoding(mut self, encoding: StackEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn rgb_bands(mut self, bands: [usize; 3]) -> Self {
        self.rgb_bands = Some(bands);
        self
    }

    pub fn warp_matrices(mut self, path: Option<impl AsRef<Path>>) -> Self {
        self.warp_matrices = Some(path.map(|p| p.as_ref().to_path_buf()));
        self
    }

    pub fn write_flight_path(mut self, enable: bool) -> Self {
        self.write_flight_path = Some(enable);
        self
    }

    pub fn skip_tagging(mut self, skip: bool) -> Self {
        self.skip_tagging = Some(skip);
        self
    }

    pub fn build(self) -> CalibrationConfig {
        let default = CalibrationConfig::default();
        CalibrationConfig {
            panel_dir: self.panel_dir.unwrap_or(default.panel_dir),
            imageset_dir: self.imageset_dir.unwrap_or(default.imageset_dir),
            output_dir: self.output_dir.unwrap_or(default.output_dir),
            generate_thumbnails: self.generate_thumbnails.unwrap_or(default.generate_thumbnails),
            use_irradiance: self.use_irradiance.unwrap_or(default.use_irradiance),
            overwrite: self.overwrite.unwrap_or(default.overwrite),
            alignment: self.alignment.unwrap_or(default.alignment),
            encoding: self.encoding.unwrap_or(default.encoding),
            rgb_bands: self.rgb_bands.unwrap_or(default.rgb_bands),
            warp_matrices: self.warp_matrices.unwrap_or(default.warp_matrices),
            write_flight_path: self.write_flight_path.unwrap_or(default.write_flight_path),
            skip_tagging: self.skip_tagging.unwrap_or(default.skip_tagging),
        }
    }
}
