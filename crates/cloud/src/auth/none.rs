//! No-op authentication.

use crate::auth::CloudAuth;
use crate::error::Result;

/// Leaves requests unsigned. The token exchange is sent with this, since it
/// carries its credentials in the form body.
pub struct NoAuth;

impl CloudAuth for NoAuth {
    fn sign_request(
        &self,
        _url: &str,
        _method: &str,
        _headers: &mut Vec<(String, String)>,
    ) -> Result<()> {
        Ok(())
    }
}
