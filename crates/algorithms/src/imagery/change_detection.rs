//! Vegetation change estimation
//!
//! Compares vegetation masks of two NDVI visualizations taken at different
//! dates and converts the difference in vegetated pixel counts to an area.

use crate::imagery::vegetation::{vegetation_mask, MaskParams, VegetationMask, DEFAULT_THRESHOLD, GREEN_CHANNEL};
use crate::maybe_rayon::*;
use forestwatch_core::raster::Raster;
use forestwatch_core::{Error, Result};
use ndarray::Array3;

/// Ground area of one 25 m × 25 m pixel.
pub const DEFAULT_PIXEL_AREA_M2: f64 = 25.0 * 25.0;

/// Pixel total of the Rondonia reference scene (2183 × 1557), kept for
/// reproducing its published percentage.
pub const LEGACY_TOTAL_PIXELS: usize = 2183 * 1557;

/// Change categories written by [`change_map`]
pub const CHANGE_LOSS: u8 = 1;
pub const CHANGE_NO_CHANGE: u8 = 2;
pub const CHANGE_GAIN: u8 = 3;

/// Parameters for vegetation change estimation
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeParams {
    /// Band carrying the NDVI visualization intensity
    pub channel: usize,
    /// Green intensity below which a pixel counts as vegetation
    pub threshold: u8,
    /// Ground area of one pixel in m²
    pub pixel_area_m2: f64,
    /// Denominator of the percentage; `None` uses rows × cols of the input
    pub total_pixel_count: Option<usize>,
}

impl Default for ChangeParams {
    fn default() -> Self {
        Self {
            channel: GREEN_CHANNEL,
            threshold: DEFAULT_THRESHOLD,
            pixel_area_m2: DEFAULT_PIXEL_AREA_M2,
            total_pixel_count: None,
        }
    }
}

impl ChangeParams {
    /// Parameters for a given pixel resolution in meters.
    pub fn for_resolution(resolution_m: f64) -> Self {
        Self {
            pixel_area_m2: resolution_m * resolution_m,
            ..Self::default()
        }
    }

    fn mask_params(&self) -> MaskParams {
        MaskParams {
            channel: self.channel,
            threshold: self.threshold,
        }
    }
}

/// Result of comparing two vegetation masks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeMetrics {
    /// Vegetation pixels in the earlier image
    pub before_count: usize,
    /// Vegetation pixels in the later image
    pub after_count: usize,
    /// `|after_count - before_count|`
    pub pixel_delta: usize,
    /// `pixel_delta * pixel_area_m2`
    pub area_m2: f64,
    /// `area_m2 * 1e-4`
    pub area_ha: f64,
    /// `(after_count - before_count) * 100 / total_pixel_count`, signed
    pub pct: f64,
}

/// Estimate vegetation loss between two NDVI visualization rasters.
///
/// Pixels whose `params.channel` intensity is below `params.threshold` are
/// counted as vegetation in each raster. The headline pixel delta and areas
/// use the absolute difference of the counts, while the percentage keeps
/// the sign (negative when vegetation was lost).
///
/// # Errors
/// - [`Error::SizeMismatch`] if the rasters differ in rows or columns
/// - [`Error::InvalidParameter`] if the channel is missing or the pixel
///   total is zero
pub fn estimate_loss(before: &Raster, after: &Raster, params: &ChangeParams) -> Result<ChangeMetrics> {
    before.check_same_shape(after)?;

    let mask_params = params.mask_params();
    let before_mask = vegetation_mask(before, &mask_params)?;
    let after_mask = vegetation_mask(after, &mask_params)?;

    estimate_loss_from_masks(&before_mask, &after_mask, params)
}

/// Same as [`estimate_loss`] for masks that were already computed.
pub fn estimate_loss_from_masks(
    before: &VegetationMask,
    after: &VegetationMask,
    params: &ChangeParams,
) -> Result<ChangeMetrics> {
    check_mask_shapes(before, after)?;

    let (rows, cols) = before.shape();
    let total = params.total_pixel_count.unwrap_or(rows * cols);
    if total == 0 {
        return Err(Error::InvalidParameter {
            name: "total_pixel_count",
            value: total.to_string(),
            reason: "must be positive".to_string(),
        });
    }

    let before_count = before.count();
    let after_count = after.count();

    let pixel_delta = after_count.abs_diff(before_count);
    let area_m2 = pixel_delta as f64 * params.pixel_area_m2;
    let area_ha = area_m2 * 1e-4;
    let signed_delta = after_count as f64 - before_count as f64;
    let pct = signed_delta * 100.0 / total as f64;

    Ok(ChangeMetrics {
        before_count,
        after_count,
        pixel_delta,
        area_m2,
        area_ha,
        pct,
    })
}

/// Categorical change map from two masks.
///
/// Output is a single-band raster with the georeferencing of `reference`:
/// - 1 = vegetation lost (present before, absent after)
/// - 2 = no change
/// - 3 = vegetation gained
pub fn change_map(
    before: &VegetationMask,
    after: &VegetationMask,
    reference: &Raster,
) -> Result<Raster> {
    check_mask_shapes(before, after)?;
    let (rows, cols) = before.shape();
    if reference.shape() != (rows, cols) {
        return Err(Error::SizeMismatch {
            er: rows,
            ec: cols,
            ar: reference.rows(),
            ac: reference.cols(),
        });
    }

    let b = before.as_array();
    let a = after.as_array();

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = Vec::with_capacity(cols);
            for col in 0..cols {
                row_data.push(match (b[(row, col)], a[(row, col)]) {
                    (true, false) => CHANGE_LOSS,
                    (false, true) => CHANGE_GAIN,
                    _ => CHANGE_NO_CHANGE,
                });
            }
            row_data
        })
        .collect();

    let array = Array3::from_shape_vec((rows, cols, 1), data)
        .map_err(|e| Error::Other(e.to_string()))?;

    Ok(reference.with_data(array))
}

fn check_mask_shapes(before: &VegetationMask, after: &VegetationMask) -> Result<()> {
    let (er, ec) = before.shape();
    let (ar, ac) = after.shape();
    if (er, ec) != (ar, ac) {
        return Err(Error::SizeMismatch { er, ec, ar, ac });
    }
    Ok(())
}
