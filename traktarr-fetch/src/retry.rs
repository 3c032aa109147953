//! Retry with exponential backoff.
//!
//! Every remote call that can fail transiently goes through
//! [`RetryPolicy::execute`]. Transient errors are retried up to the attempt
//! cap and then collapse into `Ok(None)`, the "no result" sentinel. Errors
//! that retrying cannot fix (revoked authorization, missing credential,
//! cancellation) are returned immediately.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::context::sleep_cancellable;
use crate::error::FetchError;

/// Default attempt cap.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Default base delay.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

// ============================================================================
// Backoff Observer
// ============================================================================

/// Details of a single backoff wait.
#[derive(Debug)]
pub struct BackoffEvent<'a> {
    /// Operation being retried.
    pub operation: &'a str,
    /// Attempts made so far.
    pub tries: u32,
    /// How long the policy will wait before the next attempt.
    pub wait: Duration,
    /// Error from the last attempt.
    pub error: &'a FetchError,
}

/// Receives a notification before each backoff wait.
pub trait BackoffObserver: Send + Sync {
    /// Called before the policy sleeps.
    fn on_backoff(&self, event: &BackoffEvent<'_>);
}

impl<F> BackoffObserver for F
where
    F: Fn(&BackoffEvent<'_>) + Send + Sync,
{
    fn on_backoff(&self, event: &BackoffEvent<'_>) {
        self(event);
    }
}

/// Default observer: logs a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogBackoff;

impl BackoffObserver for LogBackoff {
    fn on_backoff(&self, event: &BackoffEvent<'_>) {
        warn!(
            operation = event.operation,
            error = %event.error,
            "Backing off {:.1} seconds after {} tries calling {}",
            event.wait.as_secs_f64(),
            event.tries,
            event.operation
        );
    }
}

// ============================================================================
// Retry Policy
// ============================================================================

/// Bounded retry with exponential backoff.
///
/// Attempt `k` (counting from 0) that fails transiently is followed by a wait
/// of `base_delay * 2^k`, optionally capped by `max_delay`. With the defaults
/// a call that never succeeds makes 4 attempts and waits 1, 2 and 4 seconds.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Option<Duration>,
    observer: Arc<dyn BackoffObserver>,
    cancel: CancellationToken,
}

impl RetryPolicy {
    /// Creates a policy with the default schedule.
    pub fn new() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: None,
            observer: Arc::new(LogBackoff),
            cancel: CancellationToken::new(),
        }
    }

    /// Sets the attempt cap. Values below 1 are treated as 1.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Caps individual waits.
    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Replaces the backoff observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn BackoffObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Makes waits cancellable through `cancel`.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Attempt cap.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait after the failed attempt with index `attempt` (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        let delay = self.base_delay.saturating_mul(factor);
        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }

    /// Runs `op` until it succeeds, fails non-transiently, or the attempt
    /// cap is reached.
    ///
    /// Returns `Ok(Some(value))` on success and `Ok(None)` once transient
    /// failures exhaust the cap.
    ///
    /// # Errors
    ///
    /// Returns the first non-transient error `op` produces, or
    /// [`FetchError::Cancelled`] if the policy's token fires.
    pub async fn execute<T, F, Fut>(
        &self,
        operation: &str,
        mut op: F,
    ) -> Result<Option<T>, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        for attempt in 0..self.max_attempts {
            if self.cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            let error = match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(operation, tries = attempt + 1, "Succeeded after retry");
                    }
                    return Ok(Some(value));
                }
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => e,
            };

            let tries = attempt + 1;
            if tries >= self.max_attempts {
                warn!(operation, tries, error = %error, "Giving up");
                break;
            }

            let wait = self.delay_for_attempt(attempt);
            self.observer.on_backoff(&BackoffEvent {
                operation,
                tries,
                wait,
                error: &error,
            });
            sleep_cancellable(wait, &self.cancel).await?;
        }

        Ok(None)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
