//! OAuth2 client-credentials token exchange.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, info};

use crate::auth::{BearerToken, NoAuth};
use crate::config::ShConfig;
use crate::error::{CloudError, Result};
use crate::http::HttpClient;

/// Tokens this close to expiry are refreshed before use.
pub const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(30);

/// JSON body returned by the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: BearerToken,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + TOKEN_REFRESH_MARGIN < self.expires_at
    }
}

/// Exchanges client credentials for access tokens and caches them.
pub struct TokenProvider {
    token_url: String,
    client_id: String,
    client_secret: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            cached: Mutex::new(None),
        }
    }

    pub fn from_config(config: &ShConfig) -> Self {
        Self::new(
            config.sh_token_url.clone(),
            config.sh_client_id.clone(),
            config.sh_client_secret.clone(),
        )
    }

    /// A valid access token, fetching a new one if none is cached or the
    /// cached one is about to expire.
    pub async fn token(&self, http: &HttpClient) -> Result<BearerToken> {
        if let Some(token) = self.cached_token()? {
            debug!("reusing cached access token");
            return Ok(token);
        }

        let fetched = self.request_token(http).await?;
        let token = fetched.token.clone();
        *self.lock()? = Some(fetched);
        Ok(token)
    }

    fn cached_token(&self) -> Result<Option<BearerToken>> {
        let now = Instant::now();
        Ok(self
            .lock()?
            .as_ref()
            .filter(|cached| cached.is_fresh(now))
            .map(|cached| cached.token.clone()))
    }

    async fn request_token(&self, http: &HttpClient) -> Result<CachedToken> {
        debug!(url = %self.token_url, "requesting access token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        let body = http
            .post_form(&self.token_url, &form, &NoAuth)
            .await
            .map_err(|e| match e {
                CloudError::Auth(msg) => CloudError::Auth(msg),
                other => CloudError::Auth(format!("token request failed: {other}")),
            })?;

        let response: TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| CloudError::Auth(format!("parsing token response: {e}")))?;

        if response.access_token.is_empty() {
            return Err(CloudError::Auth("token endpoint returned an empty access token".into()));
        }
        if let Some(kind) = &response.token_type {
            if !kind.eq_ignore_ascii_case("bearer") {
                return Err(CloudError::Auth(format!("unsupported token type '{kind}'")));
            }
        }

        info!(expires_in = response.expires_in, "obtained access token");

        Ok(CachedToken {
            token: BearerToken::new(response.access_token),
            expires_at: Instant::now() + Duration::from_secs(response.expires_in),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<CachedToken>>> {
        self.cached
            .lock()
            .map_err(|_| CloudError::Auth("token cache poisoned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cached(lifetime: Duration) -> CachedToken {
        CachedToken {
            token: BearerToken::new("t"),
            expires_at: Instant::now() + lifetime,
        }
    }

    #[test]
    fn fresh_until_refresh_margin() {
        let now = Instant::now();
        assert!(cached(Duration::from_secs(3600)).is_fresh(now));
        assert!(!cached(Duration::from_secs(10)).is_fresh(now));
        assert!(!cached(Duration::ZERO).is_fresh(now));
    }

    #[test]
    fn token_response_defaults() {
        let r: TokenResponse = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(r.access_token, "abc");
        assert_eq!(r.expires_in, 3600);
        assert!(r.token_type.is_none());
    }

    #[test]
    fn near_expiry_token_not_reused() {
        let provider = TokenProvider::new("http://localhost/token", "id", "secret");
        assert!(provider.cached_token().unwrap().is_none());

        *provider.lock().unwrap() = Some(cached(Duration::from_secs(600)));
        assert!(provider.cached_token().unwrap().is_some());

        *provider.lock().unwrap() = Some(cached(Duration::from_secs(5)));
        assert!(provider.cached_token().unwrap().is_none());
    }
}
