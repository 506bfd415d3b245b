//! Reading and writing raster images
//!
//! PNG goes through the `image` crate, TIFF through the `tiff` crate (with
//! GeoTIFF pixel-scale and tiepoint tags). Formats are picked from the file
//! extension or, for buffers, given explicitly.

mod png_io;
mod tiff_io;

use crate::error::{Error, Result};
use crate::raster::Raster;
use std::path::Path;

pub use png_io::{decode_png, encode_png};
pub use tiff_io::{decode_tiff, encode_tiff};

/// Supported raster image encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Tiff,
}

impl ImageFormat {
    /// Guess the format from a path's extension (`png`, `tif`, `tiff`).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("png") => Ok(Self::Png),
            Some("tif") | Some("tiff") => Ok(Self::Tiff),
            _ => Err(Error::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// MIME type as used in HTTP `Accept` headers.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Tiff => "image/tiff",
        }
    }
}

/// Decode an in-memory image.
pub fn decode(data: &[u8], format: ImageFormat) -> Result<Raster> {
    match format {
        ImageFormat::Png => decode_png(data),
        ImageFormat::Tiff => decode_tiff(data),
    }
}

/// Encode a raster into an in-memory image.
pub fn encode(raster: &Raster, format: ImageFormat) -> Result<Vec<u8>> {
    match format {
        ImageFormat::Png => encode_png(raster),
        ImageFormat::Tiff => encode_tiff(raster),
    }
}

/// Read an image file into a Raster, format chosen by extension.
pub fn read_image<P: AsRef<Path>>(path: P) -> Result<Raster> {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path)?;
    let data = std::fs::read(path)?;
    decode(&data, format)
}

/// Write a Raster to an image file, format chosen by extension.
///
/// An existing file at `path` is overwritten.
pub fn write_image<P: AsRef<Path>>(raster: &Raster, path: P) -> Result<()> {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path)?;
    let data = encode(raster, format)?;
    std::fs::write(path, data)?;
    Ok(())
}
