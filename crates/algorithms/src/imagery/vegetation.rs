//! Vegetation masking of NDVI visualizations
//!
//! The NDVI evalscript renders values through a white-black-green ramp, so
//! a low intensity in the green channel marks dense vegetation.

use crate::maybe_rayon::*;
use forestwatch_core::raster::Raster;
use forestwatch_core::{Error, Result};
use ndarray::Array2;

/// Default green-channel threshold (0-255).
pub const DEFAULT_THRESHOLD: u8 = 177;

/// Channel carrying the NDVI visualization intensity.
pub const GREEN_CHANNEL: usize = 1;

/// Parameters for building a vegetation mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskParams {
    /// Band to test
    pub channel: usize,
    /// Pixels strictly below this intensity count as vegetation
    pub threshold: u8,
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            channel: GREEN_CHANNEL,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Per-pixel vegetation flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VegetationMask {
    mask: Array2<bool>,
}

impl VegetationMask {
    /// Wrap an existing boolean grid.
    pub fn from_array(mask: Array2<bool>) -> Self {
        Self { mask }
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.mask.dim()
    }

    /// Number of vegetation pixels
    pub fn count(&self) -> usize {
        let (rows, _) = self.shape();
        (0..rows)
            .into_par_iter()
            .map(|row| self.mask.row(row).iter().filter(|&&v| v).count())
            .sum()
    }

    /// Flag at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Option<bool> {
        self.mask.get((row, col)).copied()
    }

    /// Underlying boolean grid
    pub fn as_array(&self) -> &Array2<bool> {
        &self.mask
    }
}

/// Build a mask that is true where `params.channel` is below
/// `params.threshold`.
///
/// # Errors
/// Returns [`Error::InvalidParameter`] if the raster lacks the channel.
pub fn vegetation_mask(raster: &Raster, params: &MaskParams) -> Result<VegetationMask> {
    if params.channel >= raster.bands() {
        return Err(Error::InvalidParameter {
            name: "channel",
            value: params.channel.to_string(),
            reason: format!("raster has only {} bands", raster.bands()),
        });
    }

    let (rows, cols) = raster.shape();
    let channel = params.channel;
    let threshold = params.threshold;

    let data: Vec<bool> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = Vec::with_capacity(cols);
            for col in 0..cols {
                let v = unsafe { raster.get_unchecked(row, col, channel) };
                row_data.push(v < threshold);
            }
            row_data
        })
        .collect();

    let mask = Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| Error::Other(e.to_string()))?;

    Ok(VegetationMask { mask })
}
