//! # forestwatch core
//!
//! Core types and I/O for the forestwatch vegetation-loss toolkit.
//!
//! This crate provides:
//! - `Raster`: multi-band 8-bit image grid (rows × cols × bands)
//! - `BBox`: WGS84 area of interest and its pixel dimensions
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `CRS`: Coordinate Reference System handling
//! - PNG and TIFF reading/writing

pub mod bbox;
pub mod crs;
pub mod error;
pub mod io;
pub mod raster;

pub use bbox::BBox;
pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::bbox::BBox;
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster};
}
