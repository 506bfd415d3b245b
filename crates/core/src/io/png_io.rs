//! PNG reading/writing via the `image` crate

use crate::error::{Error, Result};
use crate::raster::Raster;
use image::{DynamicImage, ImageBuffer, ImageFormat};
use std::io::Cursor;

/// Decode an in-memory PNG into a Raster
///
/// 8-bit gray, gray-alpha, RGB and RGBA images map to 1, 2, 3 and 4 bands.
pub fn decode_png(data: &[u8]) -> Result<Raster> {
    let image = image::load_from_memory_with_format(data, ImageFormat::Png)?;
    let (cols, rows) = (image.width() as usize, image.height() as usize);

    let (samples, bands) = match image {
        DynamicImage::ImageLuma8(buf) => (buf.into_raw(), 1),
        DynamicImage::ImageLumaA8(buf) => (buf.into_raw(), 2),
        DynamicImage::ImageRgb8(buf) => (buf.into_raw(), 3),
        DynamicImage::ImageRgba8(buf) => (buf.into_raw(), 4),
        other => {
            return Err(Error::UnsupportedDataType(format!(
                "PNG color type {:?}",
                other.color()
            )))
        }
    };

    Raster::from_vec(samples, rows, cols, bands)
}

/// Encode a Raster as PNG into a byte buffer
pub fn encode_png(raster: &Raster) -> Result<Vec<u8>> {
    let width = raster.cols() as u32;
    let height = raster.rows() as u32;
    let samples = raster.to_interleaved();
    let size_error = || Error::InvalidDimensions {
        width: raster.cols(),
        height: raster.rows(),
        bands: raster.bands(),
    };

    let image = match raster.bands() {
        1 => DynamicImage::ImageLuma8(
            ImageBuffer::from_raw(width, height, samples).ok_or_else(size_error)?,
        ),
        2 => DynamicImage::ImageLumaA8(
            ImageBuffer::from_raw(width, height, samples).ok_or_else(size_error)?,
        ),
        3 => DynamicImage::ImageRgb8(
            ImageBuffer::from_raw(width, height, samples).ok_or_else(size_error)?,
        ),
        4 => DynamicImage::ImageRgba8(
            ImageBuffer::from_raw(width, height, samples).ok_or_else(size_error)?,
        ),
        n => {
            return Err(Error::UnsupportedDataType(format!(
                "cannot write {}-band raster as PNG",
                n
            )))
        }
    };

    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}
