//! Image fetcher: one Process API request per call, with optional
//! brightness rescaling and saving.

use std::path::{Path, PathBuf};

use forestwatch_algorithms::imagery::adjust_brightness;
use forestwatch_core::io::{write_image, ImageFormat};
use forestwatch_core::{BBox, GeoTransform, Raster, CRS};
use tracing::info;

use crate::config::ShConfig;
use crate::error::{CloudError, Result};
use crate::evalscript::Evalscript;
use crate::process::{DataCollection, MosaickingOrder, ProcessRequest, TimeInterval};
use crate::process_client::ProcessClient;

/// Largest width or height the Process API accepts.
pub const MAX_DIMENSION: usize = 2500;

/// Default ground resolution in meters per pixel.
pub const DEFAULT_RESOLUTION_M: f64 = 25.0;

/// What to fetch and what to do with it afterwards.
#[derive(Debug, Clone)]
pub struct FetchParams {
    pub evalscript: Evalscript,
    pub bbox: BBox,
    pub interval: TimeInterval,
    /// Meters per pixel (default 25)
    pub resolution_m: f64,
    /// Sample multiplier applied after download (default 1)
    pub brightness_factor: f64,
    /// Where to save the result, encoded by extension
    pub output_path: Option<PathBuf>,
    /// Encoding requested from the service (default TIFF)
    pub response_format: ImageFormat,
    pub collection: DataCollection,
    pub mosaicking: MosaickingOrder,
}

impl FetchParams {
    pub fn new(evalscript: Evalscript, bbox: BBox, interval: TimeInterval) -> Self {
        Self {
            evalscript,
            bbox,
            interval,
            resolution_m: DEFAULT_RESOLUTION_M,
            brightness_factor: 1.0,
            output_path: None,
            response_format: ImageFormat::Tiff,
            collection: DataCollection::default(),
            mosaicking: MosaickingOrder::default(),
        }
    }

    pub fn resolution(mut self, meters: f64) -> Self {
        self.resolution_m = meters;
        self
    }

    pub fn brightness(mut self, factor: f64) -> Self {
        self.brightness_factor = factor;
        self
    }

    pub fn save_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn response_format(mut self, format: ImageFormat) -> Self {
        self.response_format = format;
        self
    }

    pub fn collection(mut self, collection: DataCollection) -> Self {
        self.collection = collection;
        self
    }

    pub fn mosaicking(mut self, order: MosaickingOrder) -> Self {
        self.mosaicking = order;
        self
    }

    /// Output size in pixels, checked against [`MAX_DIMENSION`].
    pub fn request_dimensions(&self) -> Result<(usize, usize)> {
        let (width, height) = self.bbox.to_dimensions(self.resolution_m)?;
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(CloudError::DimensionsTooLarge {
                width,
                height,
                max: MAX_DIMENSION,
            });
        }
        Ok((width, height))
    }

    /// Process API body for these parameters.
    ///
    /// Fails before anything is sent if the output size or the brightness
    /// factor is out of range.
    pub fn to_request(&self) -> Result<ProcessRequest> {
        let dims = self.request_dimensions()?;
        if !self.brightness_factor.is_finite() || self.brightness_factor < 0.0 {
            return Err(CloudError::InvalidRequest(format!(
                "brightness factor must be a finite, non-negative number, got {}",
                self.brightness_factor
            )));
        }
        Ok(ProcessRequest::new(
            &self.evalscript,
            &self.bbox,
            &self.interval,
            dims,
            self.response_format,
        )
        .collection(self.collection)
        .mosaicking(self.mosaicking))
    }
}

/// Fetches single images through a [`ProcessClient`].
pub struct ImageFetcher {
    client: ProcessClient,
}

impl ImageFetcher {
    pub fn new(config: ShConfig) -> Result<Self> {
        Ok(Self {
            client: ProcessClient::new(config)?,
        })
    }

    /// Fetch one image.
    ///
    /// Issues exactly one request. The raster is georeferenced to the request
    /// bbox, rescaled when `brightness_factor != 1`, and written to
    /// `output_path` if set.
    pub async fn fetch(&self, params: &FetchParams) -> Result<Raster> {
        let request = params.to_request()?;
        let (width, height) = request.dimensions();
        info!(
            bbox = %params.bbox,
            interval = %params.interval,
            width,
            height,
            "fetching image"
        );

        let mut raster = self
            .client
            .get_data(&request)
            .await?
            .ok_or(CloudError::EmptyResponse)?;

        raster.set_transform(GeoTransform::from_bbox(&params.bbox, raster.cols(), raster.rows()));
        raster.set_crs(Some(CRS::wgs84()));

        let raster = adjust_brightness(&raster, params.brightness_factor)?;

        if let Some(path) = &params.output_path {
            save(&raster, path)?;
        }

        Ok(raster)
    }
}

fn save(raster: &Raster, path: &Path) -> Result<()> {
    write_image(raster, path)?;
    info!(path = %path.display(), "saved image");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(bbox: BBox) -> FetchParams {
        FetchParams::new(
            Evalscript::NdviColor,
            bbox,
            TimeInterval::parse("2024-02-01", "2024-07-17").unwrap(),
        )
    }

    #[test]
    fn defaults() {
        let p = params(BBox::from_aoi(-63.97, -10.72, -64.47, -10.37).unwrap());
        assert_eq!(p.resolution_m, 25.0);
        assert_eq!(p.brightness_factor, 1.0);
        assert_eq!(p.response_format, ImageFormat::Tiff);
        assert!(p.output_path.is_none());
    }

    #[test]
    fn rondonia_fits_service_limit() {
        let p = params(BBox::from_aoi(-63.97, -10.72, -64.47, -10.37).unwrap());
        let (w, h) = p.request_dimensions().unwrap();
        assert!(w <= MAX_DIMENSION && h <= MAX_DIMENSION);
        assert!(w > h);
    }

    #[test]
    fn oversized_box_rejected() {
        let p = params(BBox::new(-65.0, -11.0, -63.0, -9.0).unwrap());
        assert!(matches!(
            p.request_dimensions(),
            Err(CloudError::DimensionsTooLarge { max: MAX_DIMENSION, .. })
        ));
    }

    #[test]
    fn coarser_resolution_fits() {
        let p = params(BBox::new(-65.0, -11.0, -63.0, -9.0).unwrap()).resolution(100.0);
        assert!(p.request_dimensions().is_ok());
    }

    #[test]
    fn bad_brightness_rejected_before_request() {
        let bbox = BBox::from_aoi(-63.97, -10.72, -64.47, -10.37).unwrap();
        for factor in [-1.0, f64::NAN, f64::INFINITY] {
            let p = params(bbox).brightness(factor);
            assert!(matches!(p.to_request(), Err(CloudError::InvalidRequest(_))));
        }
        assert!(params(bbox).brightness(0.0).to_request().is_ok());
    }

    #[test]
    fn request_uses_params() {
        let p = params(BBox::from_aoi(-63.97, -10.72, -64.47, -10.37).unwrap())
            .response_format(ImageFormat::Png)
            .mosaicking(MosaickingOrder::MostRecent);
        let req = p.to_request().unwrap();
        assert_eq!(req.response_format(), ImageFormat::Png);
        assert_eq!(req.input.data[0].data_filter.mosaicking_order, MosaickingOrder::MostRecent);
    }
}
