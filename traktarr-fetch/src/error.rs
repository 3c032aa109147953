//! Fetch error types.

use thiserror::Error;
use traktarr_core::CoreError;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for fetch operations.
///
/// Errors fall in three groups, see [`FetchError::is_transient`] and
/// [`FetchError::is_fatal`]:
///
/// - transient: retried by [`crate::RetryPolicy`] and eventually turned into
///   "no result"
/// - fatal: the credential in use can no longer succeed, callers must stop
/// - everything else: configuration or cancellation, returned as-is
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Upstream answered with a status the operation does not accept.
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },

    /// Invalid response from the upstream (missing field, wrong shape).
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A paginated or single-shot operation ran out of attempts.
    #[error("No result from {operation} after retries")]
    Exhausted {
        /// Operation name.
        operation: String,
    },

    /// The request could not be built (bad URL, bad header value).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream rejected the bearer token mid-session (HTTP 401).
    #[error("Authorization revoked while calling {operation}; re-authenticate")]
    AuthorizationRevoked {
        /// Operation name.
        operation: String,
    },

    /// No credential is stored for any owner.
    #[error("No authenticated user; run the device authorization flow first")]
    NoCredential,

    /// The credential is expired and could not be refreshed.
    #[error("Access token for {owner} is expired and could not be refreshed")]
    CredentialExpired {
        /// Owner whose token expired.
        owner: String,
    },

    /// Credential store error.
    #[error("Store error: {0}")]
    Store(#[from] CoreError),

    /// The host cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,
}

impl FetchError {
    /// Returns true if retrying the same call might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::Timeout(_)
                | Self::UnexpectedStatus { .. }
                | Self::InvalidResponse(_)
                | Self::Json(_)
                | Self::Exhausted { .. }
        )
    }

    /// Returns true if no further call with the current credential can
    /// succeed. The top-level orchestrator decides what to do about it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthorizationRevoked { .. })
    }

    /// Builds an [`FetchError::UnexpectedStatus`], truncating long bodies.
    pub fn unexpected_status(status: u16, body: &str) -> Self {
        const MAX_BODY: usize = 512;
        let body = match body.char_indices().nth(MAX_BODY) {
            Some((idx, _)) => format!("{}...", &body[..idx]),
            None => body.to_string(),
        };
        Self::UnexpectedStatus { status, body }
    }
}
