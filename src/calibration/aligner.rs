//! Applies the flight transforms to a converted capture.
//!
//! Every band is resampled into the reference band's pixel grid and the stack
//! is cropped to the rectangle where all bands carry data.

use tracing::{debug, instrument};

use crate::calibration::alignment::{Transform, TransformSet};
use crate::calibration::capture::{BandKind, Capture};
use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::common::raster::{PixelRect, Raster};
use crate::calibration::reflectance::CalibrationMode;


/// Aligned, converted and cropped bands of one capture.
#[derive(Debug, Clone)]
pub struct ReflectanceStack {
    pub bands: Vec<Raster>,
    pub band_names: Vec<String>,
    pub band_kinds: Vec<BandKind>,
    /// Crop rectangle in the reference band's pixel grid
    pub crop: PixelRect,
    pub mode: CalibrationMode,
}

impl ReflectanceStack {
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn width(&self) -> usize {
        self.crop.width
    }

    pub fn height(&self) -> usize {
        self.crop.height
    }
}

pub struct CaptureAligner<'a> {
    transforms: &'a TransformSet,
}

impl<'a> CaptureAligner<'a> {
    pub fn new(transforms: &'a TransformSet) -> Self {
        Self { transforms }
    }

    /// Warps and crops `converted` (one raster per band of `capture`).
    #[instrument(skip_all, fields(capture = %capture.name))]
    pub fn align(
        &self,
        capture: &Capture,
        converted: &[Raster],
        mode: CalibrationMode,
    ) -> Result<ReflectanceStack> {
        let expected = self.transforms.len();
        if converted.len() != expected || capture.band_count() != expected {
            return Err(CalibrationError::BandCountMismatch {
                expected,
                found: converted.len().min(capture.band_count()),
            });
        }

        let reference = &converted[self.transforms.reference_band];
        let sizes: Vec<(usize, usize)> = converted.iter().map(|r| (r.width, r.height)).collect();
        let crop = common_crop(&self.transforms.transforms, &sizes, reference.width, reference.height)
            .ok_or(CalibrationError::InvalidDimensions(0, 0))?;
        debug!(?crop, "Common valid region");

        let bands = converted
            .iter()
            .zip(&self.transforms.transforms)
            .map(|(raster, transform)| warp_into(raster, transform, crop))
            .collect();

        Ok(ReflectanceStack {
            bands,
            band_names: capture.bands.iter().map(|b| b.calibration.band_name.clone()).collect(),
            band_kinds: capture.bands.iter().map(|b| b.calibration.kind).collect(),
            crop,
            mode,
        })
    }
}

/// Samples `src` at `transform(x, y)` for every pixel of `region` in the
/// reference grid. Pixels mapping outside `src` become `NaN`.
pub fn warp_into(src: &Raster, transform: &Transform, region: PixelRect) -> Raster {
    if transform.is_identity(0.0) {
        if let Ok(cropped) = src.crop(region) {
            return cropped;
        }
    }
    Raster::from_fn(region.width, region.height, |x, y| {
        transform
            .apply((region.x + x) as f64, (region.y + y) as f64)
            .and_then(|(u, v)| src.sample_bilinear(u, v))
            .unwrap_or(f32::NAN)
    })
}

/// Largest axis-aligned rectangle of the reference grid that every band
/// covers after warping.
///
/// Each band's footprint is its image outline pulled back through the inverse
/// transform; the rectangle is bounded by the inner-most corners of every
/// footprint.
pub fn common_crop(
    transforms: &[Transform],
    sizes: &[(usize, usize)],
    reference_width: usize,
    reference_height: usize,
) -> Option<PixelRect> {
    let mut left = 0.0f64;
    let mut top = 0.0f64;
    let mut right = reference_width as f64 - 1.0;
    let mut bottom = reference_height as f64 - 1.0;

    for (transform, &(w, h)) in transforms.iter().zip(sizes) {
        let inverse = transform.inverse()?;
        let (wm, hm) = (w as f64 - 1.0, h as f64 - 1.0);
        let tl = inverse.apply(0.0, 0.0)?;
        let tr = inverse.apply(wm, 0.0)?;
        let bl = inverse.apply(0.0, hm)?;
        let br = inverse.apply(wm, hm)?;

        left = left.max(tl.0).max(bl.0);
        right = right.min(tr.0).min(br.0);
        top = top.max(tl.1).max(tr.1);
        bottom = bottom.min(bl.1).min(br.1);
    }

    let x0 = left.ceil();
    let y0 = top.ceil();
    let x1 = right.floor();
    let y1 = bottom.floor();
    if x1 < x0 || y1 < y0 {
        return None;
    }
    Some(PixelRect::new(
        x0 as usize,
        y0 as usize,
        (x1 - x0) as usize + 1,
        (y1 - y0) as usize + 1,
    ))
}
