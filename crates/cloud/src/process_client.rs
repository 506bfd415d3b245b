//! Async client for the Sentinel Hub Process API.

use forestwatch_core::io;
use forestwatch_core::Raster;
use tracing::{debug, info};

use crate::auth::TokenProvider;
use crate::config::ShConfig;
use crate::error::{CloudError, Result};
use crate::http::HttpClient;
use crate::process::ProcessRequest;

/// Authenticated Process API client for one [`ShConfig`].
pub struct ProcessClient {
    config: ShConfig,
    http: HttpClient,
    tokens: TokenProvider,
}

impl ProcessClient {
    /// Fails with [`CloudError::Config`] if the config lacks credentials.
    pub fn new(config: ShConfig) -> Result<Self> {
        if !config.has_credentials() {
            return Err(CloudError::Config(
                "client id and secret are required; run `forestwatch configure`".into(),
            ));
        }

        let http = HttpClient::new(config.request_timeout(), config.max_retries)?;
        let tokens = TokenProvider::from_config(&config);

        Ok(Self {
            config,
            http,
            tokens,
        })
    }

    /// Send `request` and decode its `default` response.
    ///
    /// An empty response body yields `None`.
    pub async fn get_data(&self, request: &ProcessRequest) -> Result<Option<Raster>> {
        let token = self.tokens.token(&self.http).await?;
        let url = self.config.process_url();
        let format = request.response_format();
        let (width, height) = request.dimensions();

        info!(width, height, mime = format.mime_type(), "requesting image");

        let body = self
            .http
            .post_json(&url, request, format.mime_type(), &token)
            .await?;
        if body.is_empty() {
            return Ok(None);
        }

        let raster = io::decode(&body, format)?;
        debug!(
            rows = raster.rows(),
            cols = raster.cols(),
            bands = raster.bands(),
            "decoded response"
        );

        Ok(Some(raster))
    }
}
