//! Raster data structures and operations

mod geotransform;
mod grid;

pub use geotransform::GeoTransform;
pub use grid::{BandStatistics, Raster};
