//! Trakt Device Flow OAuth implementation.
//!
//! This module implements the OAuth 2.0 Device Authorization Grant for
//! Trakt.
//!
//! ## Flow
//!
//! 1. **Request**: POST `oauth/device/code` to get a device code and user code
//! 2. **Display**: Hand the verification URL and user code to the operator
//! 3. **Poll**: POST `oauth/device/token` every `interval` seconds
//! 4. **Complete**: Identify the account with `users/me` and store the token
//!
//! Poll answers map to states as follows:
//!
//! | Status | Result |
//! |--------|--------|
//! | 200 | token issued, flow succeeds |
//! | 404 | invalid device code, aborted |
//! | 409 | code already used, conflict |
//! | 410 | code expired |
//! | 418 | operator denied |
//! | 426 | keep polling, interval + 1 s |
//! | 429 | keep polling |
//! | other | keep polling |
//!
//! The flow also expires once `expires_in` seconds have passed since the
//! session started.
//!
//! ## Example
//!
//! ```ignore
//! let flow = client.device_flow();
//! let outcome = flow
//!     .run(|session| {
//!         println!("Go to {} and enter {}", session.verification_url, session.user_code);
//!     })
//!     .await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use traktarr_core::{Credential, CredentialStore};
use traktarr_fetch::{ApiResponse, FetchContext, FetchError, HeaderSet};

use super::endpoints::{DEVICE_CODE, DEVICE_TOKEN, USERS_ME};
use super::models::{DeviceCodeResponse, TraktUser};

/// Extra wait added after a 426 answer.
const SLOW_DOWN_STEP: Duration = Duration::from_secs(1);

// ============================================================================
// Types
// ============================================================================

/// A started device authorization. Never persisted.
#[derive(Debug, Clone)]
pub struct DeviceAuthSession {
    /// Code the client polls with.
    pub device_code: String,
    /// Code the operator enters.
    pub user_code: String,
    /// Page the operator visits.
    pub verification_url: String,
    /// Initial polling interval.
    pub interval: Duration,
    /// Lifetime of the codes.
    pub expires_in: Duration,
    /// When the codes were issued.
    pub started_at: Instant,
}

impl DeviceAuthSession {
    fn from_response(response: DeviceCodeResponse) -> Self {
        Self {
            device_code: response.device_code,
            user_code: response.user_code,
            verification_url: response.verification_url,
            interval: Duration::from_secs(response.interval),
            expires_in: Duration::from_secs(response.expires_in),
            started_at: Instant::now(),
        }
    }

    /// Returns true once the session lifetime has elapsed.
    pub fn is_expired(&self) -> bool {
        self.started_at.elapsed() >= self.expires_in
    }
}

/// Terminal state of the device flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceAuthOutcome {
    /// Token stored for `owner`.
    Succeeded {
        /// Account the token belongs to.
        owner: String,
    },
    /// The operator denied the request.
    Denied,
    /// The codes expired before the operator approved.
    Expired,
    /// The codes were already used.
    Conflict,
    /// Anything else that ends the flow.
    AbortedUnknown(String),
}

impl DeviceAuthOutcome {
    /// Returns true if a credential was stored.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Human-readable description.
    pub fn reason(&self) -> String {
        match self {
            Self::Succeeded { owner } => format!("authorized as {owner}"),
            Self::Denied => "the authorization was denied; please try again".to_string(),
            Self::Expired => "the authorization expired; please start again".to_string(),
            Self::Conflict => "this application is already authorized".to_string(),
            Self::AbortedUnknown(reason) => format!("authorization aborted: {reason}"),
        }
    }
}

impl std::fmt::Display for DeviceAuthOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason())
    }
}

/// Result of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    /// Not decided yet.
    Continue,
    /// The flow reached a terminal state.
    Finished(DeviceAuthOutcome),
}

// ============================================================================
// Device Flow
// ============================================================================

/// Trakt device authorization flow.
#[derive(Clone)]
pub struct DeviceAuthFlow {
    ctx: FetchContext,
    base_url: String,
    base_headers: HeaderSet,
    client_id: String,
    client_secret: String,
    store: Arc<dyn CredentialStore>,
}

impl DeviceAuthFlow {
    /// Creates a device flow.
    pub fn new(
        ctx: FetchContext,
        base_url: impl Into<String>,
        base_headers: HeaderSet,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            ctx,
            base_url: base_url.into(),
            base_headers,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            store,
        }
    }

    /// Runs the whole flow.
    ///
    /// `operator` receives the session once the codes are issued. Failing
    /// to obtain codes ends the flow as [`DeviceAuthOutcome::AbortedUnknown`].
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`] when the context is cancelled and
    /// store errors raised while saving the credential.
    #[instrument(skip_all)]
    pub async fn run<F>(&self, operator: F) -> Result<DeviceAuthOutcome, FetchError>
    where
        F: FnOnce(&DeviceAuthSession),
    {
        let session = match self.request_device_code().await {
            Ok(session) => session,
            Err(FetchError::Cancelled) => return Err(FetchError::Cancelled),
            Err(e) => {
                error!(error = %e, "Could not request a device code");
                return Ok(DeviceAuthOutcome::AbortedUnknown(format!(
                    "could not request a device code: {e}"
                )));
            }
        };

        operator(&session);
        self.poll(&session).await
    }

    /// Requests a device code.
    ///
    /// # Errors
    ///
    /// Returns transport errors, [`FetchError::UnexpectedStatus`] and parse
    /// errors.
    pub async fn request_device_code(&self) -> Result<DeviceAuthSession, FetchError> {
        info!("Requesting a verification code from Trakt");

        let request = DEVICE_CODE
            .request(&self.base_url, &[])?
            .with_headers(self.base_headers.clone())
            .with_body(json!({ "client_id": self.client_id }));

        let response = self.ctx.executor.execute(&request).await?;
        if response.status_code() != 200 {
            return Err(FetchError::unexpected_status(
                response.status_code(),
                &response.body,
            ));
        }

        let session = DeviceAuthSession::from_response(response.json()?);
        debug!(
            user_code = %session.user_code,
            verification_url = %session.verification_url,
            interval = session.interval.as_secs(),
            expires_in = session.expires_in.as_secs(),
            "Device flow started"
        );
        Ok(session)
    }

    /// Polls until the flow reaches a terminal state.
    ///
    /// Waits one interval before every poll and gives up with
    /// [`DeviceAuthOutcome::Expired`] once the session lifetime has elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`] and store errors.
    pub async fn poll(&self, session: &DeviceAuthSession) -> Result<DeviceAuthOutcome, FetchError> {
        let mut interval = session.interval;
        let mut tries = 0u32;

        loop {
            self.ctx.sleep(interval).await?;

            if session.is_expired() {
                warn!(tries, "Device code expired before authorization");
                return Ok(DeviceAuthOutcome::Expired);
            }

            tries += 1;
            debug!(
                tries,
                remaining_secs = session
                    .expires_in
                    .saturating_sub(session.started_at.elapsed())
                    .as_secs(),
                "Polling for the access token"
            );

            if let PollStep::Finished(outcome) = self.poll_once(session, &mut interval).await? {
                if outcome.is_success() {
                    info!("{}", outcome.reason());
                } else {
                    error!("{}", outcome.reason());
                }
                return Ok(outcome);
            }
        }
    }

    /// Performs a single poll. A 426 answer increases `interval`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`] and store errors. Transport errors
    /// are not errors here; they mean "keep polling".
    pub async fn poll_once(
        &self,
        session: &DeviceAuthSession,
        interval: &mut Duration,
    ) -> Result<PollStep, FetchError> {
        let request = DEVICE_TOKEN
            .request(&self.base_url, &[])?
            .with_headers(self.base_headers.clone())
            .with_body(json!({
                "code": session.device_code,
                "client_id": self.client_id,
                "client_secret": self.client_secret,
            }));

        let response = match self.ctx.executor.execute(&request).await {
            Ok(response) => response,
            Err(FetchError::Cancelled) => return Err(FetchError::Cancelled),
            Err(e) => {
                debug!(error = %e, "Poll failed; will retry");
                return Ok(PollStep::Continue);
            }
        };

        let step = match response.status_code() {
            200 => PollStep::Finished(self.complete(&response).await?),
            404 => PollStep::Finished(DeviceAuthOutcome::AbortedUnknown(
                "the device code was not recognised".to_string(),
            )),
            409 => PollStep::Finished(DeviceAuthOutcome::Conflict),
            410 => PollStep::Finished(DeviceAuthOutcome::Expired),
            418 => PollStep::Finished(DeviceAuthOutcome::Denied),
            426 => {
                *interval += SLOW_DOWN_STEP;
                debug!(interval = interval.as_secs(), "Increasing the polling interval");
                PollStep::Continue
            }
            429 => {
                debug!("Polling too quickly");
                PollStep::Continue
            }
            status => {
                debug!(status, "Authorization pending");
                PollStep::Continue
            }
        };
        Ok(step)
    }

    /// Turns a token response into a stored credential.
    async fn complete(&self, response: &ApiResponse) -> Result<DeviceAuthOutcome, FetchError> {
        let credential: Credential = match response.json() {
            Ok(credential) => credential,
            Err(e) => {
                return Ok(DeviceAuthOutcome::AbortedUnknown(format!(
                    "unreadable token response: {e}"
                )));
            }
        };

        // The device code is already spent here.
        let identified = self
            .ctx
            .retry_policy()
            .execute(USERS_ME.name, || self.identify(&credential))
            .await;

        let owner = match identified {
            Ok(Some(owner)) => owner,
            Ok(None) => {
                return Ok(DeviceAuthOutcome::AbortedUnknown(
                    "could not identify the authorized account after retries".to_string(),
                ));
            }
            Err(FetchError::Cancelled) => return Err(FetchError::Cancelled),
            Err(e) => {
                return Ok(DeviceAuthOutcome::AbortedUnknown(format!(
                    "could not identify the authorized account: {e}"
                )));
            }
        };

        self.store
            .store_credential(&owner, credential.for_owner(owner.clone()))
            .await?;
        Ok(DeviceAuthOutcome::Succeeded { owner })
    }

    /// Username the token belongs to.
    async fn identify(&self, credential: &Credential) -> Result<String, FetchError> {
        let request = USERS_ME
            .request(&self.base_url, &[])?
            .with_headers(self.base_headers.with_bearer(&credential.access_token));

        let response = self.ctx.executor.execute(&request).await?;
        if response.status_code() != 200 {
            return Err(FetchError::unexpected_status(
                response.status_code(),
                &response.body,
            ));
        }

        let user: TraktUser = response.json()?;
        if user.username.is_empty() {
            return Err(FetchError::InvalidResponse("empty username".to_string()));
        }
        Ok(user.username)
    }
}

impl std::fmt::Debug for DeviceAuthFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceAuthFlow")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use traktarr_core::CoreError;
    use traktarr_fetch::testing::ScriptedExecutor;
    use traktarr_store::MemoryCredentialStore;

    const DEVICE_CODE_BODY: &str = r#"{
        "device_code": "dev-123",
        "user_code": "ABCD1234",
        "verification_url": "https://trakt.tv/activate",
        "expires_in": 600,
        "interval": 5
    }"#;

    const TOKEN_BODY: &str = r#"{
        "access_token": "tok",
        "token_type": "bearer",
        "expires_in": 7776000,
        "refresh_token": "ref",
        "scope": "public",
        "created_at": 1700000000
    }"#;

    /// Memory store that counts writes.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryCredentialStore,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl CredentialStore for CountingStore {
        async fn store_credential(
            &self,
            owner: &str,
            credential: Credential,
        ) -> Result<(), CoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.store_credential(owner, credential).await
        }

        async fn load_credential(&self, owner: &str) -> Result<Option<Credential>, CoreError> {
            self.inner.load_credential(owner).await
        }

        async fn list_owners(&self) -> Result<BTreeSet<String>, CoreError> {
            self.inner.list_owners().await
        }
    }

    fn flow(executor: Arc<ScriptedExecutor>, store: Arc<dyn CredentialStore>) -> DeviceAuthFlow {
        let ctx = FetchContext::builder().executor(executor).build().unwrap();
        DeviceAuthFlow::new(
            ctx,
            "https://api.trakt.tv",
            HeaderSet::new().with("trakt-api-key", "client"),
            "client",
            "secret",
            store,
        )
    }

    fn session(interval: u64, expires_in: u64) -> DeviceAuthSession {
        DeviceAuthSession {
            device_code: "dev-123".to_string(),
            user_code: "ABCD1234".to_string(),
            verification_url: "https://trakt.tv/activate".to_string(),
            interval: Duration::from_secs(interval),
            expires_in: Duration::from_secs(expires_in),
            started_at: Instant::now(),
        }
    }

    async fn poll_status(status: u16) -> (PollStep, Duration) {
        let executor =
            Arc::new(ScriptedExecutor::new().with_response(ApiResponse::new(status, "")));
        let flow = flow(executor, Arc::new(MemoryCredentialStore::new()));
        let mut interval = Duration::from_secs(5);
        let step = flow.poll_once(&session(5, 600), &mut interval).await.unwrap();
        (step, interval)
    }

    #[tokio::test]
    async fn test_terminal_status_mapping() {
        assert_eq!(
            poll_status(404).await.0,
            PollStep::Finished(DeviceAuthOutcome::AbortedUnknown(
                "the device code was not recognised".to_string()
            ))
        );
        assert_eq!(
            poll_status(409).await.0,
            PollStep::Finished(DeviceAuthOutcome::Conflict)
        );
        assert_eq!(
            poll_status(410).await.0,
            PollStep::Finished(DeviceAuthOutcome::Expired)
        );
        assert_eq!(
            poll_status(418).await.0,
            PollStep::Finished(DeviceAuthOutcome::Denied)
        );
    }

    #[tokio::test]
    async fn test_continue_status_mapping() {
        assert_eq!(poll_status(400).await, (PollStep::Continue, Duration::from_secs(5)));
        assert_eq!(poll_status(429).await, (PollStep::Continue, Duration::from_secs(5)));
        assert_eq!(poll_status(500).await, (PollStep::Continue, Duration::from_secs(5)));
        assert_eq!(poll_status(426).await, (PollStep::Continue, Duration::from_secs(6)));
    }

    #[tokio::test]
    async fn test_transport_error_keeps_polling() {
        let executor = Arc::new(ScriptedExecutor::new().with_error(FetchError::Timeout(30)));
        let flow = flow(executor, Arc::new(MemoryCredentialStore::new()));
        let mut interval = Duration::from_secs(5);
        let step = flow.poll_once(&session(5, 600), &mut interval).await.unwrap();
        assert_eq!(step, PollStep::Continue);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_flow_stores_credential() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .with_response(ApiResponse::new(200, DEVICE_CODE_BODY))
                .with_response(ApiResponse::new(400, ""))
                .with_response(ApiResponse::new(200, TOKEN_BODY))
                .with_response(ApiResponse::new(200, r#"{"username":"alice","private":false}"#)),
        );
        let store = Arc::new(MemoryCredentialStore::new());
        let flow = flow(executor.clone(), store.clone());

        let mut shown = None;
        let outcome = flow
            .run(|session| shown = Some(session.user_code.clone()))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            DeviceAuthOutcome::Succeeded {
                owner: "alice".to_string()
            }
        );
        assert!(outcome.is_success());
        assert_eq!(shown.as_deref(), Some("ABCD1234"));

        let stored = store.load_credential("alice").await.unwrap().unwrap();
        assert_eq!(stored.access_token, "tok");
        assert_eq!(stored.owner, "alice");

        let sent = executor.requests();
        assert_eq!(sent[0].request.path, "oauth/device/code");
        assert_eq!(sent[1].request.path, "oauth/device/token");
        assert_eq!(sent[1].request.body.as_ref().unwrap()["code"], "dev-123");
        assert_eq!(sent[1].at - sent[0].at, Duration::from_secs(5));
        assert_eq!(sent[2].at - sent[1].at, Duration::from_secs(5));
        assert_eq!(
            sent[3].request.headers.get("authorization"),
            Some("Bearer tok")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_down_increases_interval() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .with_response(ApiResponse::new(426, ""))
                .with_response(ApiResponse::new(426, ""))
                .with_response(ApiResponse::new(418, "")),
        );
        let flow = flow(executor.clone(), Arc::new(MemoryCredentialStore::new()));

        let outcome = flow.poll(&session(5, 600)).await.unwrap();
        assert_eq!(outcome, DeviceAuthOutcome::Denied);

        let sent = executor.requests();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1].at - sent[0].at, Duration::from_secs(6));
        assert_eq!(sent[2].at - sent[1].at, Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_until_lifetime_elapses() {
        let executor =
            Arc::new(ScriptedExecutor::new().with_repeated(&ApiResponse::new(400, ""), 100));
        let flow = flow(executor.clone(), Arc::new(MemoryCredentialStore::new()));

        let session = session(5, 20);
        let outcome = flow.poll(&session).await.unwrap();

        assert_eq!(outcome, DeviceAuthOutcome::Expired);
        assert!(!outcome.is_success());
        assert_eq!(executor.request_count(), 3);
        let elapsed = session.started_at.elapsed();
        assert!(elapsed >= Duration::from_secs(20));
        assert!(elapsed < Duration::from_secs(25));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_and_single_store_write() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .with_response(ApiResponse::new(429, ""))
                .with_response(ApiResponse::new(426, ""))
                .with_response(ApiResponse::new(200, TOKEN_BODY))
                .with_response(ApiResponse::new(200, r#"{"username":"alice"}"#)),
        );
        let store = Arc::new(CountingStore::default());
        let flow = flow(executor.clone(), store.clone());

        let session = session(5, 600);
        let outcome = flow.poll(&session).await.unwrap();
        assert!(outcome.is_success());

        let sent = executor.requests();
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[0].at - session.started_at, Duration::from_secs(5));
        assert_eq!(sent[1].at - sent[0].at, Duration::from_secs(5));
        assert_eq!(sent[2].at - sent[1].at, Duration::from_secs(6));
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
        assert!(store.load_credential("alice").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_identity_lookup_is_retried() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .with_response(ApiResponse::new(200, TOKEN_BODY))
                .with_response(ApiResponse::new(503, "maintenance"))
                .with_response(ApiResponse::new(200, r#"{"username":"alice"}"#)),
        );
        let store = Arc::new(CountingStore::default());
        let flow = flow(executor.clone(), store.clone());

        let outcome = flow.poll(&session(1, 600)).await.unwrap();

        assert_eq!(
            outcome,
            DeviceAuthOutcome::Succeeded {
                owner: "alice".to_string()
            }
        );
        assert_eq!(executor.request_count(), 3);
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
        let stored = store.load_credential("alice").await.unwrap().unwrap();
        assert_eq!(stored.access_token, "tok");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unusable_identity_aborts() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .with_response(ApiResponse::new(200, TOKEN_BODY))
                .with_repeated(&ApiResponse::new(500, ""), 4),
        );
        let store = Arc::new(CountingStore::default());
        let flow = flow(executor.clone(), store.clone());

        let outcome = flow.poll(&session(1, 600)).await.unwrap();
        assert!(matches!(outcome, DeviceAuthOutcome::AbortedUnknown(_)));
        assert_eq!(executor.request_count(), 5);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert!(store.list_owners().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreadable_token_aborts() {
        let executor =
            Arc::new(ScriptedExecutor::new().with_response(ApiResponse::new(200, "<html>")));
        let flow = flow(executor, Arc::new(MemoryCredentialStore::new()));

        let outcome = flow.poll(&session(1, 600)).await.unwrap();
        assert!(matches!(outcome, DeviceAuthOutcome::AbortedUnknown(_)));
    }

    #[tokio::test]
    async fn test_device_code_failure_aborts() {
        let executor = Arc::new(ScriptedExecutor::new().with_response(ApiResponse::new(403, "")));
        let flow = flow(executor, Arc::new(MemoryCredentialStore::new()));

        let mut called = false;
        let outcome = flow.run(|_| called = true).await.unwrap();
        assert!(matches!(outcome, DeviceAuthOutcome::AbortedUnknown(_)));
        assert!(!called);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_waiting() {
        let executor = Arc::new(ScriptedExecutor::new());
        let flow = flow(executor, Arc::new(MemoryCredentialStore::new()));
        flow.ctx.cancel();

        let result = flow.poll(&session(5, 600)).await;
        assert!(matches!(result, Err(FetchError::Cancelled)));
    }

    #[test]
    fn test_outcome_reasons() {
        assert!(DeviceAuthOutcome::Denied.reason().contains("denied"));
        assert!(DeviceAuthOutcome::Expired.to_string().contains("expired"));
        assert!(!DeviceAuthOutcome::Conflict.is_success());
    }
}
