//! Coordinate Reference System handling

pub(crate) mod utm;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate Reference System identified by its EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CRS {
    epsg: u32,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self { epsg: code }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// EPSG code
    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Whether the code lies in the EPSG geographic 2D range (4000-4999).
    pub fn is_geographic(&self) -> bool {
        (4000..5000).contains(&self.epsg)
    }

    /// OGC URL form used by OGC API and Sentinel Hub request bodies.
    pub fn ogc_url(&self) -> String {
        format!("http://www.opengis.net/def/crs/EPSG/0/{}", self.epsg)
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        format!("EPSG:{}", self.epsg)
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for CRS {
    fn default() -> Self {
        Self::wgs84()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_epsg() {
        let crs = CRS::from_epsg(4326);
        assert_eq!(crs.epsg(), 4326);
        assert_eq!(crs.identifier(), "EPSG:4326");
        assert_eq!(crs, CRS::wgs84());
    }

    #[test]
    fn test_is_geographic() {
        assert!(CRS::wgs84().is_geographic());
        assert!(!CRS::from_epsg(32720).is_geographic());
    }

    #[test]
    fn test_ogc_url() {
        assert_eq!(
            CRS::wgs84().ogc_url(),
            "http://www.opengis.net/def/crs/EPSG/0/4326"
        );
    }
}
