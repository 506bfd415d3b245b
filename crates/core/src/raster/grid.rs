//! Main Raster type

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::GeoTransform;
use ndarray::{s, Array3, ArrayView2};

/// A georeferenced multi-band 8-bit image.
///
/// Samples are stored as `(row, col, band)`, matching the interleaved
/// layout of PNG and chunky TIFF images. True-color rasters have 3 bands,
/// vegetation-index rasters carry a fourth data-mask band.
///
/// # Example
///
/// ```ignore
/// use forestwatch_core::Raster;
///
/// let mut raster = Raster::new(100, 200, 3);
/// raster.set(10, 20, 1, 42)?;
/// assert_eq!(raster.get(10, 20, 1)?, 42);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    /// Samples in row-major, band-interleaved order
    data: Array3<u8>,
    /// Affine transformation
    transform: GeoTransform,
    /// Coordinate reference system
    crs: Option<CRS>,
}

impl Raster {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize, bands: usize) -> Self {
        Self::from_array(Array3::zeros((rows, cols, bands)))
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, bands: usize, value: u8) -> Self {
        Self::from_array(Array3::from_elem((rows, cols, bands), value))
    }

    /// Create a raster from interleaved samples
    pub fn from_vec(data: Vec<u8>, rows: usize, cols: usize, bands: usize) -> Result<Self> {
        if bands == 0 || data.len() != rows * cols * bands {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
                bands,
            });
        }

        let array = Array3::from_shape_vec((rows, cols, bands), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self::from_array(array))
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array3<u8>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            crs: None,
        }
    }

    /// Same georeferencing, new samples. The shape of `data` may differ.
    pub fn with_data(&self, data: Array3<u8>) -> Self {
        Self {
            data,
            transform: self.transform,
            crs: self.crs,
        }
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.dim().0
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.dim().1
    }

    /// Number of bands (channels)
    pub fn bands(&self) -> usize {
        self.data.dim().2
    }

    /// Pixel grid dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    /// Number of pixels (rows × cols)
    pub fn pixel_count(&self) -> usize {
        self.rows() * self.cols()
    }

    /// Whether the raster is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get sample at (row, col, band)
    pub fn get(&self, row: usize, col: usize, band: usize) -> Result<u8> {
        self.data
            .get((row, col, band))
            .copied()
            .ok_or_else(|| self.out_of_bounds(row, col, band))
    }

    /// Get sample at (row, col, band) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < rows(), col < cols() and band < bands()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize, band: usize) -> u8 {
        unsafe { *self.data.uget((row, col, band)) }
    }

    /// Set sample at (row, col, band)
    pub fn set(&mut self, row: usize, col: usize, band: usize, value: u8) -> Result<()> {
        let err = self.out_of_bounds(row, col, band);
        match self.data.get_mut((row, col, band)) {
            Some(sample) => {
                *sample = value;
                Ok(())
            }
            None => Err(err),
        }
    }

    /// View of a single band as a (rows, cols) array
    pub fn band(&self, band: usize) -> Result<ArrayView2<'_, u8>> {
        if band >= self.bands() {
            return Err(Error::InvalidParameter {
                name: "band",
                value: band.to_string(),
                reason: format!("raster has {} bands", self.bands()),
            });
        }
        Ok(self.data.slice(s![.., .., band]))
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array3<u8> {
        &self.data
    }

    /// Interleaved samples in row-major order
    pub fn to_interleaved(&self) -> Vec<u8> {
        self.data.iter().copied().collect()
    }

    // Metadata

    /// Get the geotransform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Set the geotransform
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// Get the CRS
    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// Set the CRS
    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    /// Fail unless `other` has the same pixel grid.
    pub fn check_same_shape(&self, other: &Raster) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::SizeMismatch {
                er: self.rows(),
                ec: self.cols(),
                ar: other.rows(),
                ac: other.cols(),
            });
        }
        Ok(())
    }

    // Statistics

    /// Per-band min, max and mean
    pub fn statistics(&self) -> Vec<BandStatistics> {
        (0..self.bands())
            .map(|band| {
                let view = self.data.slice(s![.., .., band]);
                let mut min = u8::MAX;
                let mut max = u8::MIN;
                let mut sum: u64 = 0;
                for &v in view.iter() {
                    min = min.min(v);
                    max = max.max(v);
                    sum += u64::from(v);
                }
                let count = view.len();
                BandStatistics {
                    band,
                    min: if count > 0 { Some(min) } else { None },
                    max: if count > 0 { Some(max) } else { None },
                    mean: if count > 0 {
                        Some(sum as f64 / count as f64)
                    } else {
                        None
                    },
                }
            })
            .collect()
    }

    fn out_of_bounds(&self, row: usize, col: usize, band: usize) -> Error {
        Error::IndexOutOfBounds {
            row,
            col,
            band,
            rows: self.rows(),
            cols: self.cols(),
            bands: self.bands(),
        }
    }
}

/// Basic statistics for one band
#[derive(Debug, Clone, PartialEq)]
pub struct BandStatistics {
    pub band: usize,
    pub min: Option<u8>,
    pub max: Option<u8>,
    pub mean: Option<f64>,
}
