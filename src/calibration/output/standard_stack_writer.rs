use std::io::Write;

use tiff::encoder::{Compression, TiffEncoder, colortype};
use tiff::encoder::compression::DeflateLevel;
use tiff::tags::Tag;
use tracing::debug;

use crate::calibration::aligner::ReflectanceStack;
use crate::calibration::capture::BandKind;
use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::output::types::{StackEncoding, StackSampleFormat, TiffCompression};
use crate::calibration::output::writer::StackWriter;

/// Reflectance scale used by 16-bit stacks.
const U16_REFLECTANCE_SCALE: f32 = 32768.0;
const U16_REFLECTANCE_MAX: f32 = 2.0;

/// Writes one TIFF page per band.
pub struct StandardStackWriter;

fn encode_err(e: impl std::fmt::Display) -> CalibrationError {
    CalibrationError::EncodeError(e.to_string())
}

impl StackWriter for StandardStackWriter {
    fn write_stack(&self, stack: &ReflectanceStack, output: &mut dyn Write, encoding: &StackEncoding) -> Result<()> {
        let (width, height) = (stack.width() as u32, stack.height() as u32);
        debug!("Encoding {}-band stack: {}x{}", stack.band_count(), width, height);

        let compression = match encoding.compression {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        };

        let mut buffer = Vec::new();
        {
            let mut encoder = TiffEncoder::new(std::io::Cursor::new(&mut buffer))
                .map_err(encode_err)?
                .with_compression(compression);

            for (i, band) in stack.bands.iter().enumerate() {
                let kind = stack.band_kinds.get(i).copied().unwrap_or_default();
                let name = stack.band_names.get(i).map(String::as_str).unwrap_or("band");
                let description = match kind {
                    BandKind::Thermal => format!("{} (celsius)", name),
                    BandKind::Multispectral => format!("{} ({})", name, stack.mode.as_str()),
                };

                match encoding.sample_format {
                    StackSampleFormat::Float32 => {
                        let mut image = encoder
                            .new_image::<colortype::Gray32Float>(width, height)
                            .map_err(encode_err)?;
                        image
                            .encoder()
                            .write_tag(Tag::ImageDescription, description.as_str())
                            .map_err(encode_err)?;
                        image.write_data(&band.data).map_err(encode_err)?;
                    }
                    StackSampleFormat::ScaledU16 => {
                        let data: Vec<u16> = band.data.iter().map(|&v| scale_to_u16(v, kind)).collect();
                        let mut image = encoder
                            .new_image::<colortype::Gray16>(width, height)
                            .map_err(encode_err)?;
                        image
                            .encoder()
                            .write_tag(Tag::ImageDescription, description.as_str())
                            .map_err(encode_err)?;
                        image.write_data(&data).map_err(encode_err)?;
                    }
                }
            }
        }

        output.write_all(&buffer)?;

        debug!("Stack encoding complete");
        Ok(())
    }
}

fn scale_to_u16(value: f32, kind: BandKind) -> u16 {
    let scaled = match kind {
        BandKind::Multispectral => value.clamp(0.0, U16_REFLECTANCE_MAX) * U16_REFLECTANCE_SCALE,
        BandKind::Thermal => (value + 273.15) * 100.0,
    };
    // NaN saturates to 0
    scaled.round().clamp(0.0, u16::MAX as f32) as u16
}
