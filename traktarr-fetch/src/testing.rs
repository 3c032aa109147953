//! Scripted request executor for tests.
//!
//! [`ScriptedExecutor`] replays a queue of canned responses and records
//! every request together with the (tokio) instant it was made, so tests
//! running with a paused clock can assert on backoff and paging delays.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::FetchError;
use crate::executor::RequestExecutor;
use crate::request::{ApiRequest, ApiResponse};

/// A request seen by the [`ScriptedExecutor`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// The request as sent, headers included.
    pub request: ApiRequest,
    /// When it was sent.
    pub at: Instant,
}

/// Replays queued responses in order.
///
/// Once the queue is empty every call fails with a transient
/// [`FetchError::InvalidResponse`].
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    responses: Mutex<VecDeque<Result<ApiResponse, FetchError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedExecutor {
    /// Creates an executor with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a response to the script.
    #[must_use]
    pub fn with_response(self, response: ApiResponse) -> Self {
        self.push(Ok(response));
        self
    }

    /// Appends the same response `count` times.
    #[must_use]
    pub fn with_repeated(self, response: &ApiResponse, count: usize) -> Self {
        for _ in 0..count {
            self.push(Ok(response.clone()));
        }
        self
    }

    /// Appends a transport error to the script.
    #[must_use]
    pub fn with_error(self, error: FetchError) -> Self {
        self.push(Err(error));
        self
    }

    /// Appends an entry to the script.
    pub fn push(&self, entry: Result<ApiResponse, FetchError>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(entry);
    }

    /// Requests made so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests made so far.
    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl RequestExecutor for ScriptedExecutor {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, FetchError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                request: request.clone(),
                at: Instant::now(),
            });

        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| {
                Err(FetchError::InvalidResponse(format!(
                    "no scripted response left for {}",
                    request.path
                )))
            })
    }
}
