//! Error types for the Process API client.

use thiserror::Error;

/// Errors produced while configuring, authenticating or fetching imagery.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("requested image of {width}x{height} px exceeds the service limit of {max}x{max} px")]
    DimensionsTooLarge {
        width: usize,
        height: usize,
        max: usize,
    },

    #[error("Process API returned no images")]
    EmptyResponse,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("core error: {0}")]
    Core(#[from] forestwatch_core::Error),
}

/// Result alias for cloud operations.
pub type Result<T> = std::result::Result<T, CloudError>;
