//! Seams between the fetch machinery and the outside world.
//!
//! [`RequestExecutor`] performs a single HTTP exchange. [`HeaderProvider`]
//! produces the headers for one request, which lets authenticated fetches
//! resolve (and possibly refresh) a credential right before each page.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::request::{ApiRequest, ApiResponse, HeaderSet};

/// Performs one HTTP request and buffers the response.
///
/// Implementations never retry; retries belong to [`crate::RetryPolicy`].
/// Any status code is a successful exchange; only transport failures are
/// errors.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Executes the request.
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, FetchError>;
}

/// Produces the headers for a single request.
#[async_trait]
pub trait HeaderProvider: Send + Sync {
    /// Returns the headers to send.
    async fn headers(&self) -> Result<HeaderSet, FetchError>;
}

#[async_trait]
impl HeaderProvider for HeaderSet {
    async fn headers(&self) -> Result<HeaderSet, FetchError> {
        Ok(self.clone())
    }
}
