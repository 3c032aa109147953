//! Fetch context shared by every catalog client.
//!
//! The context bundles the request executor, the timing settings and the
//! cancellation token. Clients derive their [`RetryPolicy`] and
//! [`PaginatedFetcher`] from it so that one Ctrl-C stops every wait.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::executor::RequestExecutor;
use crate::host::http::HttpClient;
use crate::pagination::PaginatedFetcher;
use crate::retry::{BackoffObserver, LogBackoff, RetryPolicy};

// ============================================================================
// Expired Token Policy
// ============================================================================

/// What to do with an expired credential whose refresh failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiredTokenPolicy {
    /// Fail the call with [`FetchError::CredentialExpired`].
    #[default]
    Reject,
    /// Log a warning and send the stale token anyway.
    AttachStale,
}

// ============================================================================
// Fetch Settings
// ============================================================================

/// Timing and retry settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Fixed delay between consecutive page requests.
    pub page_delay: Duration,
    /// Base delay of the retry schedule.
    pub retry_base_delay: Duration,
    /// Attempt cap of the retry schedule.
    pub max_attempts: u32,
    /// Handling of expired credentials.
    pub expired_token_policy: ExpiredTokenPolicy,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            page_delay: Duration::from_secs(5),
            retry_base_delay: Duration::from_secs(1),
            max_attempts: 4,
            expired_token_policy: ExpiredTokenPolicy::Reject,
        }
    }
}

impl FetchSettings {
    /// Settings without any waits, for tests against local servers.
    pub fn immediate() -> Self {
        Self {
            page_delay: Duration::ZERO,
            retry_base_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the inter-page delay.
    #[must_use]
    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    /// Sets the expired-token policy.
    #[must_use]
    pub fn with_expired_token_policy(mut self, policy: ExpiredTokenPolicy) -> Self {
        self.expired_token_policy = policy;
        self
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Shared state for catalog clients.
#[derive(Clone)]
pub struct FetchContext {
    /// Executes HTTP requests.
    pub executor: Arc<dyn RequestExecutor>,
    /// Timing settings.
    pub settings: FetchSettings,
    observer: Arc<dyn BackoffObserver>,
    cancel: CancellationToken,
}

impl FetchContext {
    /// Creates a context with a reqwest-backed executor and default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, FetchError> {
        Self::builder().build()
    }

    /// Creates a builder.
    pub fn builder() -> FetchContextBuilder {
        FetchContextBuilder::new()
    }

    /// Retry policy configured from the settings.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new()
            .with_max_attempts(self.settings.max_attempts)
            .with_base_delay(self.settings.retry_base_delay)
            .with_observer(self.observer.clone())
            .with_cancellation(self.cancel.clone())
    }

    /// Paginated fetcher configured from the settings.
    pub fn fetcher(&self) -> PaginatedFetcher {
        PaginatedFetcher::new(self.executor.clone(), self.retry_policy())
            .with_page_delay(self.settings.page_delay)
            .with_cancellation(self.cancel.clone())
    }

    /// Cancellation token observed by every wait.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancels every pending and future wait.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Sleeps for `duration` unless the context is cancelled first.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`] on cancellation.
    pub async fn sleep(&self, duration: Duration) -> Result<(), FetchError> {
        sleep_cancellable(duration, &self.cancel).await
    }
}

impl std::fmt::Debug for FetchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchContext")
            .field("settings", &self.settings)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Fetch Context Builder
// ============================================================================

/// Builder for constructing a [`FetchContext`].
pub struct FetchContextBuilder {
    executor: Option<Arc<dyn RequestExecutor>>,
    observer: Option<Arc<dyn BackoffObserver>>,
    cancel: Option<CancellationToken>,
    settings: FetchSettings,
}

impl FetchContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            executor: None,
            observer: None,
            cancel: None,
            settings: FetchSettings::default(),
        }
    }

    /// Sets the request executor.
    #[must_use]
    pub fn executor(mut self, executor: Arc<dyn RequestExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Sets the settings.
    #[must_use]
    pub fn settings(mut self, settings: FetchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the backoff observer.
    #[must_use]
    pub fn backoff_observer(mut self, observer: Arc<dyn BackoffObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Sets the cancellation token.
    #[must_use]
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Builds the context. Without an explicit executor an [`HttpClient`]
    /// using the configured timeout is created.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn build(self) -> Result<FetchContext, FetchError> {
        let executor = match self.executor {
            Some(executor) => executor,
            None => Arc::new(HttpClient::with_timeout(self.settings.timeout)?),
        };

        Ok(FetchContext {
            executor,
            settings: self.settings,
            observer: self.observer.unwrap_or_else(|| Arc::new(LogBackoff)),
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

impl Default for FetchContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Cancellable Sleep
// ============================================================================

/// Sleeps for `duration` unless `cancel` fires first.
///
/// Zero durations return immediately, even when cancelled.
///
/// # Errors
///
/// Returns [`FetchError::Cancelled`] on cancellation.
pub async fn sleep_cancellable(
    duration: Duration,
    cancel: &CancellationToken,
) -> Result<(), FetchError> {
    if duration.is_zero() {
        return Ok(());
    }

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(FetchError::Cancelled),
        () = tokio::time::sleep(duration) => Ok(()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedExecutor;

    #[test]
    fn test_default_settings() {
        let settings = FetchSettings::default();
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.page_delay, Duration::from_secs(5));
        assert_eq!(settings.retry_base_delay, Duration::from_secs(1));
        assert_eq!(settings.max_attempts, 4);
        assert_eq!(settings.expired_token_policy, ExpiredTokenPolicy::Reject);
    }

    #[test]
    fn test_expired_token_policy_serde() {
        let json = serde_json::to_string(&ExpiredTokenPolicy::AttachStale).unwrap();
        assert_eq!(json, r#""attach_stale""#);
        let parsed: ExpiredTokenPolicy = serde_json::from_str(r#""reject""#).unwrap();
        assert_eq!(parsed, ExpiredTokenPolicy::Reject);
    }

    #[test]
    fn test_builder_uses_settings() {
        let ctx = FetchContext::builder()
            .executor(Arc::new(ScriptedExecutor::new()))
            .settings(FetchSettings::default().with_timeout(Duration::from_secs(60)))
            .build()
            .unwrap();

        assert_eq!(ctx.settings.timeout, Duration::from_secs(60));
        assert_eq!(ctx.retry_policy().max_attempts(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_honours_cancellation() {
        let ctx = FetchContext::builder()
            .executor(Arc::new(ScriptedExecutor::new()))
            .build()
            .unwrap();

        assert!(ctx.sleep(Duration::from_secs(1)).await.is_ok());

        ctx.cancel();
        assert!(matches!(
            ctx.sleep(Duration::from_secs(1)).await,
            Err(FetchError::Cancelled)
        ));
        assert!(ctx.sleep(Duration::ZERO).await.is_ok());
    }
}
