//! Sentinel Hub Process API request models.
//!
//! Serde models for the `POST /api/v1/process` body, covering the subset
//! needed by forestwatch: one bounding box, one data source with a time
//! range and mosaicking order, and a single `default` image response.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use forestwatch_core::io::ImageFormat;
use forestwatch_core::{BBox, CRS};
use serde::Serialize;

use crate::error::{CloudError, Result};
use crate::evalscript::Evalscript;

// ---------------------------------------------------------------------------
// Request parameters
// ---------------------------------------------------------------------------

/// Imagery collection queried by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataCollection {
    /// Sentinel-2 bottom-of-atmosphere reflectance.
    #[default]
    Sentinel2L2A,
    /// Sentinel-2 top-of-atmosphere reflectance.
    Sentinel2L1C,
}

impl DataCollection {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Sentinel2L2A => "sentinel-2-l2a",
            Self::Sentinel2L1C => "sentinel-2-l1c",
        }
    }
}

impl Serialize for DataCollection {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.id())
    }
}

/// Order in which overlapping acquisitions are stacked into one mosaic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MosaickingOrder {
    /// Least cloud cover first.
    #[default]
    #[serde(rename = "leastCC")]
    LeastCloudCover,
    #[serde(rename = "mostRecent")]
    MostRecent,
    #[serde(rename = "leastRecent")]
    LeastRecent,
}

/// Inclusive date range of acquisitions considered for the mosaic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeInterval {
    /// Fails if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(CloudError::InvalidRequest(format!(
                "time interval starts after it ends: {start} > {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` dates.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// First instant of the start day.
    pub fn from_timestamp(&self) -> String {
        format!("{}T00:00:00Z", self.start.format("%Y-%m-%d"))
    }

    /// Last second of the end day.
    pub fn to_timestamp(&self) -> String {
        format!("{}T23:59:59Z", self.end.format("%Y-%m-%d"))
    }
}

/// `YYYY-MM-DD/YYYY-MM-DD`
impl FromStr for TimeInterval {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s.split_once('/').ok_or_else(|| {
            CloudError::InvalidRequest(format!(
                "expected a date range like 2017-01-01/2017-06-30, got '{s}'"
            ))
        })?;
        Self::parse(start.trim(), end.trim())
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start, self.end)
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| CloudError::InvalidRequest(format!("invalid date '{s}': {e}")))
}

// ---------------------------------------------------------------------------
// Request body
// ---------------------------------------------------------------------------

/// Body for `POST /api/v1/process`.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessRequest {
    pub input: ProcessInput,
    pub output: ProcessOutput,
    pub evalscript: String,

    #[serde(skip)]
    format: ImageFormat,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessInput {
    pub bounds: Bounds,
    pub data: Vec<DataSource>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Bounds {
    /// `[min_x, min_y, max_x, max_y]`
    pub bbox: [f64; 4],
    pub properties: BoundsProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoundsProperties {
    pub crs: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataSource {
    #[serde(rename = "type")]
    pub collection: DataCollection,
    #[serde(rename = "dataFilter")]
    pub data_filter: DataFilter,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFilter {
    pub time_range: TimeRange,
    pub mosaicking_order: MosaickingOrder,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeRange {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutput {
    pub width: usize,
    pub height: usize,
    pub responses: Vec<OutputResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputResponse {
    pub identifier: String,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputFormat {
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl ProcessRequest {
    /// Single-source request with one `default` response of `format`.
    pub fn new(
        evalscript: &Evalscript,
        bbox: &BBox,
        interval: &TimeInterval,
        (width, height): (usize, usize),
        format: ImageFormat,
    ) -> Self {
        Self {
            input: ProcessInput {
                bounds: Bounds {
                    bbox: bbox.to_array(),
                    properties: BoundsProperties {
                        crs: CRS::wgs84().ogc_url(),
                    },
                },
                data: vec![DataSource {
                    collection: DataCollection::default(),
                    data_filter: DataFilter {
                        time_range: TimeRange {
                            from: interval.from_timestamp(),
                            to: interval.to_timestamp(),
                        },
                        mosaicking_order: MosaickingOrder::default(),
                    },
                }],
            },
            output: ProcessOutput {
                width,
                height,
                responses: vec![OutputResponse {
                    identifier: "default".to_string(),
                    format: OutputFormat {
                        mime_type: format.mime_type().to_string(),
                    },
                }],
            },
            evalscript: evalscript.source().to_string(),
            format,
        }
    }

    /// Query a different collection.
    pub fn collection(mut self, collection: DataCollection) -> Self {
        for source in &mut self.input.data {
            source.collection = collection;
        }
        self
    }

    /// Stack acquisitions in a different order.
    pub fn mosaicking(mut self, order: MosaickingOrder) -> Self {
        for source in &mut self.input.data {
            source.data_filter.mosaicking_order = order;
        }
        self
    }

    /// Encoding of the `default` response.
    pub fn response_format(&self) -> ImageFormat {
        self.format
    }

    /// Requested (width, height) in pixels.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.output.width, self.output.height)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rondonia() -> BBox {
        BBox::from_aoi(-63.97, -10.72, -64.47, -10.37).unwrap()
    }

    #[test]
    fn request_body_shape() {
        let interval = TimeInterval::parse("2017-01-01", "2017-06-30").unwrap();
        let req = ProcessRequest::new(
            &Evalscript::TrueColor,
            &rondonia(),
            &interval,
            (2183, 1557),
            ImageFormat::Tiff,
        );

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value["input"],
            json!({
                "bounds": {
                    "bbox": [-64.47, -10.72, -63.97, -10.37],
                    "properties": {"crs": "http://www.opengis.net/def/crs/EPSG/0/4326"}
                },
                "data": [{
                    "type": "sentinel-2-l2a",
                    "dataFilter": {
                        "timeRange": {"from": "2017-01-01T00:00:00Z", "to": "2017-06-30T23:59:59Z"},
                        "mosaickingOrder": "leastCC"
                    }
                }]
            })
        );
        assert_eq!(
            value["output"],
            json!({
                "width": 2183,
                "height": 1557,
                "responses": [{"identifier": "default", "format": {"type": "image/tiff"}}]
            })
        );
        assert_eq!(value["evalscript"], json!(Evalscript::TrueColor.source()));
        assert!(value.get("format").is_none());
    }

    #[test]
    fn builders_override_source() {
        let interval = TimeInterval::parse("2024-02-01", "2024-07-17").unwrap();
        let req = ProcessRequest::new(
            &Evalscript::NdviColor,
            &rondonia(),
            &interval,
            (10, 10),
            ImageFormat::Png,
        )
        .collection(DataCollection::Sentinel2L1C)
        .mosaicking(MosaickingOrder::MostRecent);

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["input"]["data"][0]["type"], "sentinel-2-l1c");
        assert_eq!(value["input"]["data"][0]["dataFilter"]["mosaickingOrder"], "mostRecent");
        assert_eq!(value["output"]["responses"][0]["format"]["type"], "image/png");
        assert_eq!(req.response_format(), ImageFormat::Png);
    }

    #[test]
    fn interval_parsing() {
        let interval: TimeInterval = "2017-01-01/2017-06-30".parse().unwrap();
        assert_eq!(interval.to_string(), "2017-01-01/2017-06-30");
        assert_eq!(interval.from_timestamp(), "2017-01-01T00:00:00Z");
        assert_eq!(interval.to_timestamp(), "2017-06-30T23:59:59Z");

        let same_day = TimeInterval::parse("2024-07-17", "2024-07-17").unwrap();
        assert_eq!(same_day.start, same_day.end);
    }

    #[test]
    fn interval_rejects_bad_input() {
        assert!(TimeInterval::parse("2017-06-30", "2017-01-01").is_err());
        assert!(TimeInterval::parse("2017-13-01", "2017-12-31").is_err());
        assert!("2017-01-01".parse::<TimeInterval>().is_err());
    }
}
