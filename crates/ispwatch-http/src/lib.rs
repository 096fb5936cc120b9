// # HTTP Address Fetcher
//
// This crate provides the reqwest implementation of `AddressFetcher` used for
// both the primary source and the backup sources.
//
// ## Classification
//
// | Outcome                                   | Result                          |
// |-------------------------------------------|---------------------------------|
// | 2xx                                       | `Ok(body)`                      |
// | 503                                       | `TemporarilyUnavailable`        |
// | other status                              | `Http { Status(code) }`         |
// | timeout, connect/DNS, body read           | `Http { Timeout/Connect/Body }` |
// | request construction, redirect, decoding  | `Other`                         |
//
// Only `TemporarilyUnavailable` sends the engine down the backup path.

use std::time::Duration;

use ispwatch_core::config::HttpConfig;
use ispwatch_core::error::{FailureKind, FetchError};
use ispwatch_core::traits::AddressFetcher;
use ispwatch_core::{Error, Result};
use reqwest::StatusCode;

/// reqwest-backed address fetcher
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the configured per-request timeout
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Self::with_timeout(config.timeout())
    }

    /// Create a fetcher with an explicit timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ispwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl AddressFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::debug!("{} answered 503", url);
            return Err(FetchError::TemporarilyUnavailable);
        }

        if !status.is_success() {
            return Err(FetchError::http(
                FailureKind::Status(status.as_u16()),
                format!("HTTP error: {}", status),
            ));
        }

        response.text().await.map_err(|e| {
            FetchError::http(
                FailureKind::Body,
                format!("Failed to read response: {}", e),
            )
        })
    }

    fn fetcher_name(&self) -> &'static str {
        "http"
    }
}

fn classify_transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::http(FailureKind::Timeout, format!("Request timed out: {}", e))
    } else if e.is_connect() {
        FetchError::http(FailureKind::Connect, format!("Connection failed: {}", e))
    } else if e.is_builder() || e.is_redirect() || e.is_decode() {
        FetchError::other(FailureKind::Request, format!("Request failed: {}", e))
    } else if e.is_request() || e.is_body() {
        FetchError::http(FailureKind::Request, format!("Request failed: {}", e))
    } else {
        FetchError::other(FailureKind::Unknown, e.to_string())
    }
}
