//! Error types for forestwatch

use thiserror::Error;

/// Main error type for forestwatch raster operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}x{bands}")]
    InvalidDimensions {
        width: usize,
        height: usize,
        bands: usize,
    },

    #[error("Index out of bounds: ({row}, {col}, {band}) in raster of size ({rows}, {cols}, {bands})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        band: usize,
        rows: usize,
        cols: usize,
        bands: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Unsupported image format for {0}")]
    UnsupportedFormat(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Image codec error: {0}")]
    Image(String),

    #[error("{0}")]
    Other(String),
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e.to_string())
    }
}

impl From<tiff::TiffError> for Error {
    fn from(e: tiff::TiffError) -> Self {
        Error::Image(e.to_string())
    }
}

/// Result type alias for forestwatch raster operations
pub type Result<T> = std::result::Result<T, Error>;
