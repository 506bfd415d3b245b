//! Request signing for the Process API.

mod bearer;
mod none;
mod oauth;

pub use bearer::BearerToken;
pub use none::NoAuth;
pub use oauth::{TokenProvider, TokenResponse};

use crate::error::Result;

/// Trait for signing HTTP requests to the imagery service.
///
/// Implementations add authentication headers to outgoing requests before
/// they are sent.
pub trait CloudAuth: Send + Sync {
    /// Sign a request by adding authentication headers.
    ///
    /// `url` is the full request URL, `headers` is a mutable list where
    /// auth headers should be inserted.
    fn sign_request(
        &self,
        url: &str,
        method: &str,
        headers: &mut Vec<(String, String)>,
    ) -> Result<()>;
}
