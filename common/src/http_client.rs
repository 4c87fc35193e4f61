use crate::errors::AppError;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// HTTP client for upstream JSON APIs with a bounded request timeout.
///
/// Failures are returned as-is; retrying is left to the caller.
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AppError::NetworkError)?;

        Ok(Self { client, timeout })
    }

    /// Fetch JSON from URL.
    ///
    /// Non-success responses become [`AppError::HttpError`] carrying the
    /// upstream `message` field when the body has one.
    #[instrument(skip(self, url), fields(url = %redact_query(url)))]
    pub async fn get_json<T>(&self, url: &str) -> Result<T, AppError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = tokio::time::timeout(self.timeout, self.client.get(url).send())
            .await
            .map_err(|_| AppError::timeout("Upstream request timed out"))?
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::timeout("Upstream request timed out")
                } else {
                    AppError::NetworkError(e.without_url())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::NetworkError(e.without_url()))?;

        if !status.is_success() {
            let message =
                upstream_message(&text).unwrap_or_else(|| format!("HTTP error: {}", status));
            warn!(status = status.as_u16(), message = %message, "Upstream returned error");
            return Err(AppError::http(status.as_u16(), message));
        }

        let json: T = serde_json::from_str(&text).map_err(AppError::ParseError)?;
        info!(status = status.as_u16(), "Request successful");

        Ok(json)
    }
}

/// Pulls the `message` field out of an upstream JSON error body.
fn upstream_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("message")?.as_str().map(str::to_owned)
}

/// Strips the query string so API keys never reach the logs.
fn redact_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}
