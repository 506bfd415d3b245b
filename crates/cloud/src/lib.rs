//! # forestwatch Cloud
//!
//! Sentinel Hub Process API client.
//!
//! This crate turns a bounding box, a date range and an evaluation script
//! into a decoded [`Raster`](forestwatch_core::Raster), handling the OAuth2
//! token exchange, request retries and credential profiles.
//!
//! ## Features
//!
//! - `native` (default): Sync API via tokio `block_on`

pub mod auth;
pub mod config;
pub mod error;
pub mod evalscript;
pub mod fetcher;
pub mod http;
pub mod process;
pub mod process_client;

pub mod sync_api;

pub use config::{ConfigStore, ShConfig};
pub use error::{CloudError, Result};
pub use evalscript::Evalscript;
pub use fetcher::{FetchParams, ImageFetcher, MAX_DIMENSION};
pub use process::{DataCollection, MosaickingOrder, ProcessRequest, TimeInterval};
pub use process_client::ProcessClient;

/// Blocking API re-exported as `blocking` module (native only).
#[cfg(feature = "native")]
pub mod blocking {
    pub use crate::sync_api::*;
}
