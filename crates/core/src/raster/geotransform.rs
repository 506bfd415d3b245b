//! Affine geotransformation for rasters

use serde::{Deserialize, Serialize};

use crate::bbox::BBox;

/// North-up affine transform from pixel coordinates (col, row) to
/// geographic coordinates (x, y):
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height
/// ```
/// `pixel_height` is negative for north-up images.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel width (cell size in X direction)
    pub pixel_width: f64,
    /// Pixel height (cell size in Y direction, usually negative)
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Transform that stretches a `cols × rows` grid over `bbox`.
    pub fn from_bbox(bbox: &BBox, cols: usize, rows: usize) -> Self {
        Self::new(
            bbox.min_x,
            bbox.max_y,
            bbox.width_deg() / cols.max(1) as f64,
            -bbox.height_deg() / rows.max(1) as f64,
        )
    }

    /// Get the cell size (assumes square pixels)
    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Bounding box (min_x, min_y, max_x, max_y) of a raster of given dimensions
    pub fn bounds(&self, width: usize, height: usize) -> (f64, f64, f64, f64) {
        let (x0, y0) = self.corner(0.0, 0.0);
        let (x1, y1) = self.corner(width as f64, height as f64);
        (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    fn corner(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width,
            self.origin_y + row * self.pixel_height,
        )
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_bbox_spans_box() {
        let bbox = BBox::new(-64.47, -10.72, -63.97, -10.37).unwrap();
        let gt = GeoTransform::from_bbox(&bbox, 2000, 1400);
        let (min_x, min_y, max_x, max_y) = gt.bounds(2000, 1400);

        assert_relative_eq!(min_x, -64.47, epsilon = 1e-9);
        assert_relative_eq!(min_y, -10.72, epsilon = 1e-9);
        assert_relative_eq!(max_x, -63.97, epsilon = 1e-9);
        assert_relative_eq!(max_y, -10.37, epsilon = 1e-9);
        assert!(gt.pixel_height < 0.0);
    }
}
