//! HTTP client wrapper with retry logic.

use crate::auth::CloudAuth;
use crate::error::{CloudError, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Base delay of the exponential backoff between retries.
const BACKOFF_BASE_MS: u64 = 100;

/// Longest error body quoted in messages.
const MAX_ERROR_BODY: usize = 500;

/// HTTP client for the token and Process API endpoints.
pub struct HttpClient {
    client: Client,
    max_retries: u32,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new(request_timeout: Duration, max_retries: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            max_retries,
        })
    }

    /// POST a JSON body and return the raw response bytes.
    ///
    /// `accept` is sent as the `Accept` header.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        accept: &str,
        auth: &dyn CloudAuth,
    ) -> Result<Vec<u8>> {
        let req = self
            .client
            .post(url)
            .header("Accept", accept)
            .json(body);
        let req = sign(req, url, "POST", auth)?;

        let resp = self.execute_with_retry(req, url).await?;
        let bytes = resp.bytes().await?;
        debug!(url, bytes = bytes.len(), "received response");
        Ok(bytes.to_vec())
    }

    /// POST an `application/x-www-form-urlencoded` body and return the raw
    /// response bytes.
    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        auth: &dyn CloudAuth,
    ) -> Result<Vec<u8>> {
        let req = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .form(form);
        let req = sign(req, url, "POST", auth)?;

        let resp = self.execute_with_retry(req, url).await?;
        let bytes = resp.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// Execute a request with exponential backoff retry.
    ///
    /// Timeouts, connection failures, 5xx and 429 are retried. Other
    /// non-success statuses fail immediately: 401/403 as
    /// [`CloudError::Auth`], the rest as [`CloudError::Network`].
    async fn execute_with_retry(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = Duration::from_millis(BACKOFF_BASE_MS * 2u64.pow(attempt - 1));
                tokio::time::sleep(backoff).await;
            }

            let Some(cloned) = request.try_clone() else {
                return check_status(request.send().await?, url).await;
            };

            match cloned.send().await {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) => {
                    let status = resp.status();
                    let err = status_error(resp, url).await;
                    if !is_retryable(status) {
                        return Err(err);
                    }
                    warn!(url, %status, attempt, "retryable HTTP status");
                    last_err = Some(err);
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    warn!(url, error = %e, attempt, "transient request failure");
                    last_err = Some(CloudError::Network(format!("request to {url} failed: {e}")));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_err.unwrap_or_else(|| CloudError::Network(format!("request to {url} failed"))))
    }
}

fn sign(
    mut req: RequestBuilder,
    url: &str,
    method: &str,
    auth: &dyn CloudAuth,
) -> Result<RequestBuilder> {
    let mut auth_headers = Vec::new();
    auth.sign_request(url, method, &mut auth_headers)?;
    for (key, value) in &auth_headers {
        req = req.header(key.as_str(), value.as_str());
    }
    Ok(req)
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

async fn check_status(resp: Response, url: &str) -> Result<Response> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(status_error(resp, url).await)
    }
}

async fn status_error(resp: Response, url: &str) -> CloudError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let body = body.chars().take(MAX_ERROR_BODY).collect::<String>();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        CloudError::Auth(format!("{url} returned HTTP {status}: {body}"))
    } else {
        CloudError::Network(format!("{url} returned HTTP {status}: {body}"))
    }
}
