//! Stack encoding options

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression (slow, good compression)
    Lzw,
    /// Deflate compression - fast level (good speed/size balance)
    DeflateFast,
    /// Deflate compression - balanced
    DeflateBalanced,
    /// Deflate compression - best compression (slower)
    DeflateBest,
}

/// Sample type of the stack pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackSampleFormat {
    /// 32-bit float, values stored as computed
    Float32,
    /// 16-bit integers: reflectance x 32768 clamped to [0, 2],
    /// thermal as (degrees C + 273.15) x 100
    ScaledU16,
}

#[derive(Debug, Clone, Copy)]
pub struct StackEncoding {
    pub compression: TiffCompression,
    pub sample_format: StackSampleFormat,
}

impl Default for StackEncoding {
    fn default() -> Self {
        Self {
            compression: TiffCompression::DeflateBalanced,
            sample_format: StackSampleFormat::Float32,
        }
    }
}
