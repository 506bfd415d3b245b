//! WGS84 area-of-interest bounding box.

use serde::{Deserialize, Serialize};

use crate::crs::utm;
use crate::error::{Error, Result};

/// A geographic bounding box in WGS84 degrees.
///
/// Corners are normalized on construction, so the box may be built from
/// either diagonal in any order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    /// Build a bbox from two opposite corners `(x1, y1)` and `(x2, y2)`.
    ///
    /// Fails if any coordinate is non-finite or outside the WGS84 range, or
    /// if the rectangle has zero width or height.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self> {
        for (name, value, limit) in [
            ("x1", x1, 180.0),
            ("y1", y1, 90.0),
            ("x2", x2, 180.0),
            ("y2", y2, 90.0),
        ] {
            if !value.is_finite() || value.abs() > limit {
                return Err(Error::InvalidParameter {
                    name,
                    value: value.to_string(),
                    reason: format!("must be a finite coordinate within ±{}", limit),
                });
            }
        }

        let bbox = Self {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        };

        if bbox.width_deg() == 0.0 || bbox.height_deg() == 0.0 {
            return Err(Error::InvalidParameter {
                name: "bbox",
                value: bbox.to_string(),
                reason: "rectangle is degenerate".to_string(),
            });
        }

        Ok(bbox)
    }

    /// Build a bbox from coordinates in prompt order:
    /// maximum longitude, minimum latitude, minimum longitude, maximum latitude.
    pub fn from_aoi(max_lon: f64, min_lat: f64, min_lon: f64, max_lat: f64) -> Result<Self> {
        Self::new(max_lon, min_lat, min_lon, max_lat)
    }

    /// `[min_x, min_y, max_x, max_y]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }

    /// Extent in degrees of longitude.
    pub fn width_deg(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Extent in degrees of latitude.
    pub fn height_deg(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center point `(lon, lat)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Pixel dimensions `(width, height)` of this box at `resolution_m`
    /// meters per pixel.
    ///
    /// Both corners are projected into the UTM zone of the box center and
    /// the easting/northing spans are divided by the resolution. Each side is
    /// rounded to the nearest pixel and is at least 1.
    pub fn to_dimensions(&self, resolution_m: f64) -> Result<(usize, usize)> {
        if !resolution_m.is_finite() || resolution_m <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "resolution_m",
                value: resolution_m.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let (lon, lat) = self.center();
        let (zone, north) = utm::zone_for(lon, lat);
        let (e0, n0) = utm::wgs84_to_utm(self.min_x, self.min_y, zone, north);
        let (e1, n1) = utm::wgs84_to_utm(self.max_x, self.max_y, zone, north);

        let width = ((e1 - e0).abs() / resolution_m).round() as usize;
        let height = ((n1 - n0).abs() / resolution_m).round() as usize;

        Ok((width.max(1), height.max(1)))
    }
}

impl std::fmt::Display for BBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:.6}, {:.6}) - ({:.6}, {:.6})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}
