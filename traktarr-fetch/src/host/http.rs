//! HTTP client with tracing.
//!
//! This module provides the reqwest-backed [`RequestExecutor`]:
//! - Request/response tracing
//! - Per-request timeout mapped to [`FetchError::Timeout`]
//! - Buffered responses so callers can inspect status, headers and body

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::error::FetchError;
use crate::executor::RequestExecutor;
use crate::request::{ApiRequest, ApiResponse};

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for Traktarr.
const USER_AGENT: &str = concat!("Traktarr/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and a fixed timeout.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built. This should only occur
    /// if the system's TLS configuration is fundamentally broken, making
    /// network operations impossible.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS)).unwrap_or_else(|e| {
            panic!(
                "Failed to create HTTP client: {e}. \
                This usually indicates a broken TLS configuration."
            )
        })
    }

    /// Creates a new HTTP client with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { inner, timeout })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RequestExecutor for HttpClient {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, FetchError> {
        let url = request.url()?;
        debug!(url = %url, "Sending request");

        let mut builder = self
            .inner
            .request(request.method.clone(), url)
            .headers(request.headers.to_header_map()?);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|e| self.map_error(e))?;

        debug!(status = %status, bytes = body.len(), "Response received");
        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

impl HttpClient {
    fn map_error(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.timeout.as_secs())
        } else {
            FetchError::Http(error)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
