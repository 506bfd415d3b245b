//! Brightness rescaling
//!
//! Compensates for low-reflectance scenes by multiplying every sample by a
//! scalar factor.

use crate::maybe_rayon::*;
use forestwatch_core::raster::Raster;
use forestwatch_core::{Error, Result};
use ndarray::Array3;

/// Multiply every sample of `raster` by `factor`.
///
/// Samples are widened before multiplication, rounded to the nearest
/// integer and clamped to `[0, 255]`:
///
/// `out = clamp(round(sample * factor), 0, 255)`
///
/// A factor of exactly 1 returns the input unchanged.
///
/// # Errors
/// Returns [`Error::InvalidParameter`] if `factor` is negative or not finite.
pub fn adjust_brightness(raster: &Raster, factor: f64) -> Result<Raster> {
    if !factor.is_finite() || factor < 0.0 {
        return Err(Error::InvalidParameter {
            name: "brightness_factor",
            value: factor.to_string(),
            reason: "must be a finite, non-negative number".to_string(),
        });
    }

    if factor == 1.0 {
        return Ok(raster.clone());
    }

    let (rows, cols) = raster.shape();
    let bands = raster.bands();

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = Vec::with_capacity(cols * bands);
            for col in 0..cols {
                for band in 0..bands {
                    let v = unsafe { raster.get_unchecked(row, col, band) };
                    row_data.push(scale_sample(v, factor));
                }
            }
            row_data
        })
        .collect();

    let array = Array3::from_shape_vec((rows, cols, bands), data)
        .map_err(|e| Error::Other(e.to_string()))?;

    Ok(raster.with_data(array))
}

#[inline]
fn scale_sample(v: u8, factor: f64) -> u8 {
    let widened = f64::from(u32::from(v)) * factor;
    widened.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use forestwatch_core::GeoTransform;

    fn ramp() -> Raster {
        let data = (0..=255u8).cycle().take(16 * 16 * 3).collect();
        let mut r = Raster::from_vec(data, 16, 16, 3).unwrap();
        r.set_transform(GeoTransform::new(-64.0, -10.0, 0.01, -0.01));
        r
    }

    #[test]
    fn test_unit_factor_is_identity() {
        let input = ramp();
        let output = adjust_brightness(&input, 1.0).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_factor_six_clamps() {
        let input = ramp();
        let output = adjust_brightness(&input, 6.0).unwrap();

        for (&i, &o) in input.data().iter().zip(output.data().iter()) {
            let expected = (i as f64 * 6.0).round().min(255.0) as u8;
            assert_eq!(o, expected);
            assert!(o >= i);
        }
        assert_eq!(output.transform(), input.transform());
    }

    #[test]
    fn test_fractional_factor_rounds() {
        let input = Raster::from_vec(vec![0, 1, 2, 3, 10, 255], 1, 2, 3).unwrap();
        let output = adjust_brightness(&input, 0.8).unwrap();
        // 0.0, 0.8, 1.6, 2.4, 8.0, 204.0
        assert_eq!(output.to_interleaved(), vec![0, 1, 2, 2, 8, 204]);
    }

    #[test]
    fn test_zero_factor_blackens() {
        let output = adjust_brightness(&ramp(), 0.0).unwrap();
        assert!(output.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_invalid_factor() {
        assert!(adjust_brightness(&ramp(), -0.5).is_err());
        assert!(adjust_brightness(&ramp(), f64::NAN).is_err());
        assert!(adjust_brightness(&ramp(), f64::INFINITY).is_err());
    }
}
