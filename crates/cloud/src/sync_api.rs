//! Blocking (synchronous) API.
//!
//! Wraps the async [`ImageFetcher`] with a Tokio runtime so callers don't
//! need to manage their own async runtime.

#[cfg(feature = "native")]
mod inner {
    use forestwatch_core::Raster;

    use crate::config::ShConfig;
    use crate::error::{CloudError, Result};
    use crate::fetcher::{FetchParams, ImageFetcher};

    /// Blocking wrapper around [`ImageFetcher`].
    ///
    /// Uses an internal single-threaded Tokio runtime, so fetches run one
    /// at a time in call order.
    pub struct ImageFetcherBlocking {
        rt: tokio::runtime::Runtime,
        inner: ImageFetcher,
    }

    impl ImageFetcherBlocking {
        pub fn new(config: ShConfig) -> Result<Self> {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| CloudError::Network(e.to_string()))?;

            let inner = ImageFetcher::new(config)?;

            Ok(Self { rt, inner })
        }

        /// Fetch one image (blocking).
        pub fn fetch(&self, params: &FetchParams) -> Result<Raster> {
            self.rt.block_on(self.inner.fetch(params))
        }
    }
}

#[cfg(feature = "native")]
pub use inner::*;
