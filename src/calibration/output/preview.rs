//! RGB preview rendering for a reflectance stack.

use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use tracing::debug;

use crate::calibration::aligner::ReflectanceStack;
use crate::calibration::common::error::{CalibrationError, Result};

const LOW_PERCENTILE: f64 = 0.5;
const HIGH_PERCENTILE: f64 = 99.5;
const PREVIEW_GAMMA: f32 = 1.4;

/// Renders bands `rgb = [red, green, blue]` as an 8-bit image.
///
/// The three bands share one stretch between the 0.5th and 99.5th
/// percentiles so relative band brightness is preserved. Indices beyond the
/// stack clamp to its last band.
pub fn render_preview(stack: &ReflectanceStack, rgb: [usize; 3]) -> Result<RgbImage> {
    if stack.bands.is_empty() {
        return Err(CalibrationError::EncodeError("empty stack".to_string()));
    }
    let last = stack.bands.len() - 1;
    let channels = rgb.map(|i| &stack.bands[i.min(last)]);

    let mut values: Vec<f32> = channels
        .iter()
        .flat_map(|band| band.data.iter().copied())
        .filter(|v| v.is_finite())
        .collect();
    let (lo, hi) = match (
        percentile(&mut values, LOW_PERCENTILE),
        percentile(&mut values, HIGH_PERCENTILE),
    ) {
        (Some(lo), Some(hi)) if hi > lo => (lo, hi),
        (Some(lo), _) => (lo, lo + 1.0),
        _ => (0.0, 1.0),
    };
    debug!(lo, hi, "Preview stretch");

    let width = stack.width() as u32;
    let height = stack.height() as u32;
    let to_u8 = |v: f32| -> u8 {
        if !v.is_finite() {
            return 0;
        }
        let n = ((v - lo) / (hi - lo)).clamp(0.0, 1.0);
        (n.powf(1.0 / PREVIEW_GAMMA) * 255.0).round() as u8
    };

    Ok(RgbImage::from_fn(width, height, |x, y| {
        let idx = y as usize * stack.width() + x as usize;
        Rgb([
            to_u8(channels[0].data[idx]),
            to_u8(channels[1].data[idx]),
            to_u8(channels[2].data[idx]),
        ])
    }))
}

pub fn save_preview(stack: &ReflectanceStack, rgb: [usize; 3], path: &Path) -> Result<()> {
    let image = render_preview(stack, rgb)?;
    image
        .save_with_format(path, ImageFormat::Jpeg)
        .map_err(|e| CalibrationError::OutputWriteError(format!("{}: {}", path.display(), e)))
}

fn percentile(values: &mut [f32], pct: f64) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let rank = ((pct / 100.0) * (values.len() - 1) as f64).round() as usize;
    let (_, v, _) = values.select_nth_unstable_by(rank, |a, b| a.total_cmp(b));
    Some(*v)
}
