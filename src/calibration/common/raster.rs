//! Single-band floating point rasters.
//!
//! Every intermediate image in the pipeline (radiance, reflectance, warped
//! bands, pyramid levels) is a row-major `f32` buffer. Pixels that carry no
//! data after warping are stored as `NaN`.

use serde::{Deserialize, Serialize};

use crate::calibration::common::error::{CalibrationError, Result};

/// Slack allowed when a sample position sits on the last row or column.
const EDGE_TOLERANCE: f64 = 1e-6;

/// Axis-aligned pixel rectangle, `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelRect {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the rectangle lies completely inside a `width` x `height` image.
    pub fn fits_within(&self, width: usize, height: usize) -> bool {
        self.x + self.width <= width && self.y + self.height <= height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl Raster {
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 || data.len() != width * height {
            return Err(CalibrationError::InvalidDimensions(width, height));
        }
        Ok(Self { width, height, data })
    }

    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Builds a raster by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.data[y * self.width + x] = value;
    }

    /// Bilinear sample at a sub-pixel position.
    ///
    /// Returns `None` when the position falls outside the pixel grid or when
    /// a neighbour that contributes to the sample is `NaN`.
    #[inline]
    pub fn sample_bilinear(&self, x: f64, y: f64) -> Option<f32> {
        let max_x = (self.width - 1) as f64;
        let max_y = (self.height - 1) as f64;
        if !(x >= -EDGE_TOLERANCE
            && y >= -EDGE_TOLERANCE
            && x <= max_x + EDGE_TOLERANCE
            && y <= max_y + EDGE_TOLERANCE)
        {
            return None;
        }
        let x = x.clamp(0.0, max_x);
        let y = y.clamp(0.0, max_y);

        let x0 = (x.floor() as usize).min(self.width.saturating_sub(2));
        let y0 = (y.floor() as usize).min(self.height.saturating_sub(2));
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = (x - x0 as f64) as f32;
        let fy = (y - y0 as f64) as f32;

        let taps = [
            ((1.0 - fx) * (1.0 - fy), self.get(x0, y0)),
            (fx * (1.0 - fy), self.get(x1, y0)),
            ((1.0 - fx) * fy, self.get(x0, y1)),
            (fx * fy, self.get(x1, y1)),
        ];
        let mut v = 0.0f32;
        for (weight, p) in taps {
            // Zero-weight taps may be NaN without affecting the sample.
            if weight > 0.0 {
                if p.is_nan() {
                    return None;
                }
                v += weight * p;
            }
        }
        Some(v)
    }

    /// Halves both dimensions by averaging 2x2 blocks.
    pub fn downsample_half(&self) -> Raster {
        let width = (self.width / 2).max(1);
        let height = (self.height / 2).max(1);
        Raster::from_fn(width, height, |x, y| {
            let sx = (2 * x).min(self.width - 1);
            let sy = (2 * y).min(self.height - 1);
            let sx1 = (sx + 1).min(self.width - 1);
            let sy1 = (sy + 1).min(self.height - 1);
            0.25 * (self.get(sx, sy) + self.get(sx1, sy) + self.get(sx, sy1) + self.get(sx1, sy1))
        })
    }

    /// Horizontal and vertical central-difference derivatives.
    ///
    /// Border pixels use one-sided differences.
    pub fn gradients(&self) -> (Raster, Raster) {
        let w = self.width;
        let h = self.height;
        let gx = Raster::from_fn(w, h, |x, y| {
            if w < 2 {
                return 0.0;
            }
            let (l, r, span) = match x {
                0 => (0, 1, 1.0),
                _ if x == w - 1 => (w - 2, w - 1, 1.0),
                _ => (x - 1, x + 1, 2.0),
            };
            (self.get(r, y) - self.get(l, y)) / span
        });
        let gy = Raster::from_fn(w, h, |x, y| {
            if h < 2 {
                return 0.0;
            }
            let (t, b, span) = match y {
                0 => (0, 1, 1.0),
                _ if y == h - 1 => (h - 2, h - 1, 1.0),
                _ => (y - 1, y + 1, 2.0),
            };
            (self.get(x, b) - self.get(x, t)) / span
        });
        (gx, gy)
    }

    /// 3x3 Sobel gradient magnitude, zero on the one-pixel border.
    pub fn sobel_magnitude(&self) -> Raster {
        let w = self.width;
        let h = self.height;
        Raster::from_fn(w, h, |x, y| {
            if x == 0 || y == 0 || x + 1 >= w || y + 1 >= h {
                return 0.0;
            }
            let p = |dx: isize, dy: isize| {
                self.get((x as isize + dx) as usize, (y as isize + dy) as usize)
            };
            let gx = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
            let gy = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
            (gx * gx + gy * gy).sqrt()
        })
    }

    pub fn crop(&self, rect: PixelRect) -> Result<Raster> {
        if rect.is_empty() || !rect.fits_within(self.width, self.height) {
            return Err(CalibrationError::InvalidDimensions(rect.width, rect.height));
        }
        Ok(Raster::from_fn(rect.width, rect.height, |x, y| {
            self.get(rect.x + x, rect.y + y)
        }))
    }

    /// Mean of the finite pixels inside `rect`.
    pub fn mean_in(&self, rect: PixelRect) -> Option<f64> {
        if rect.is_empty() || !rect.fits_within(self.width, self.height) {
            return None;
        }
        let mut sum = 0.0f64;
        let mut count = 0usize;
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                let v = self.get(x, y);
                if v.is_finite() {
                    sum += v as f64;
                    count += 1;
                }
            }
        }
        (count > 0).then(|| sum / count as f64)
    }

    pub fn map(&self, f: impl Fn(f32) -> f32) -> Raster {
        Raster {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }
}
