use std::fmt;

use crate::auth::CloudAuth;
use crate::error::{CloudError, Result};

/// OAuth2 access token sent as `Authorization: Bearer <token>`.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

impl CloudAuth for BearerToken {
    fn sign_request(
        &self,
        _url: &str,
        _method: &str,
        headers: &mut Vec<(String, String)>,
    ) -> Result<()> {
        if self.0.is_empty() {
            return Err(CloudError::Auth("empty access token".into()));
        }
        headers.push(("Authorization".to_string(), format!("Bearer {}", self.0)));
        Ok(())
    }
}
