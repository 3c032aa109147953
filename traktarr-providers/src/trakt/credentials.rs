//! Credential resolution for authenticated Trakt endpoints.
//!
//! Every authenticated request resolves its credential again from the
//! [`CredentialStore`]:
//! 1. Pick the requested owner, or the first stored owner
//! 2. If the token is expired, try the refresh-token grant once
//! 3. If the refresh fails, apply the [`ExpiredTokenPolicy`]
//!
//! The refresh grant is best-effort: its result is stored when it works,
//! and a failure only falls through to the policy.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use traktarr_core::{Credential, CredentialStore};
use traktarr_fetch::{
    ExpiredTokenPolicy, FetchError, HeaderProvider, HeaderSet, RequestExecutor,
};

use super::endpoints::REFRESH_TOKEN;

/// Redirect URI for out-of-band OAuth clients.
const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

// ============================================================================
// Credential Resolver
// ============================================================================

/// Picks, checks and refreshes the credential for a request.
#[derive(Clone)]
pub struct CredentialResolver {
    store: Arc<dyn CredentialStore>,
    executor: Arc<dyn RequestExecutor>,
    base_url: String,
    base_headers: HeaderSet,
    client_id: String,
    client_secret: String,
    policy: ExpiredTokenPolicy,
}

impl CredentialResolver {
    /// Creates a resolver.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        executor: Arc<dyn RequestExecutor>,
        base_url: impl Into<String>,
        base_headers: HeaderSet,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            store,
            executor,
            base_url: base_url.into(),
            base_headers,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            policy: ExpiredTokenPolicy::default(),
        }
    }

    /// Sets the policy for expired tokens that could not be refreshed.
    #[must_use]
    pub fn with_policy(mut self, policy: ExpiredTokenPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Credential store.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Owner whose credential will be used for `requested`.
    ///
    /// Falls back to the first stored owner when `requested` is absent or
    /// unknown.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NoCredential`] when the store is empty.
    pub async fn resolve_owner(&self, requested: Option<&str>) -> Result<String, FetchError> {
        let owners = self.store.list_owners().await?;

        if let Some(owner) = requested.filter(|o| owners.contains(*o)) {
            return Ok(owner.to_string());
        }

        let first = owners.into_iter().next().ok_or(FetchError::NoCredential)?;
        debug!(
            requested = requested.unwrap_or("<none>"),
            using = %first,
            "No authenticated user matches; using the first stored user"
        );
        Ok(first)
    }

    /// Credential to attach for `requested`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NoCredential`] without stored credentials and
    /// [`FetchError::CredentialExpired`] when the token is expired, the
    /// refresh failed and the policy is [`ExpiredTokenPolicy::Reject`].
    #[instrument(skip(self))]
    pub async fn resolve(&self, requested: Option<&str>) -> Result<Credential, FetchError> {
        let owner = self.resolve_owner(requested).await?;
        let credential = self
            .store
            .load_credential(&owner)
            .await?
            .ok_or(FetchError::NoCredential)?;

        if !credential.is_expired() {
            return Ok(credential);
        }

        info!(owner = %owner, "Access token expired; requesting a new one");
        match self.refresh(&owner, &credential).await {
            Ok(fresh) => {
                info!(owner = %owner, "Access token refreshed");
                Ok(fresh)
            }
            Err(FetchError::Cancelled) => Err(FetchError::Cancelled),
            Err(e) => match self.policy {
                ExpiredTokenPolicy::Reject => {
                    warn!(owner = %owner, error = %e, "Refresh failed; rejecting expired token");
                    Err(FetchError::CredentialExpired { owner })
                }
                ExpiredTokenPolicy::AttachStale => {
                    warn!(owner = %owner, error = %e, "Refresh failed; attaching expired token");
                    Ok(credential)
                }
            },
        }
    }

    /// Exchanges the refresh token for a new credential and stores it.
    ///
    /// # Errors
    ///
    /// Returns transport errors, [`FetchError::UnexpectedStatus`] for a
    /// non-200 answer and parse errors for an unusable body.
    pub async fn refresh(
        &self,
        owner: &str,
        credential: &Credential,
    ) -> Result<Credential, FetchError> {
        let request = REFRESH_TOKEN
            .request(&self.base_url, &[])?
            .with_headers(self.base_headers.clone())
            .with_body(json!({
                "refresh_token": credential.refresh_token,
                "client_id": self.client_id,
                "client_secret": self.client_secret,
                "redirect_uri": OOB_REDIRECT_URI,
                "grant_type": "refresh_token",
            }));

        let response = self.executor.execute(&request).await?;
        if response.status_code() != 200 {
            return Err(FetchError::unexpected_status(
                response.status_code(),
                &response.body,
            ));
        }

        let fresh = response.json::<Credential>()?.for_owner(owner);
        self.store.store_credential(owner, fresh.clone()).await?;
        Ok(fresh)
    }

    /// Header provider attaching the credential of `owner`.
    pub fn headers_for<'a>(&'a self, owner: Option<&'a str>) -> AuthenticatedHeaders<'a> {
        AuthenticatedHeaders {
            resolver: self,
            owner,
        }
    }
}

impl std::fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("base_url", &self.base_url)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Authenticated Headers
// ============================================================================

/// Base headers plus the bearer token of the resolved owner, built fresh for
/// every request.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedHeaders<'a> {
    resolver: &'a CredentialResolver,
    owner: Option<&'a str>,
}

#[async_trait]
impl HeaderProvider for AuthenticatedHeaders<'_> {
    async fn headers(&self) -> Result<HeaderSet, FetchError> {
        let credential = self.resolver.resolve(self.owner).await?;
        Ok(self.resolver.base_headers.with_bearer(&credential.access_token))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use traktarr_fetch::ApiResponse;
    use traktarr_fetch::testing::ScriptedExecutor;
    use traktarr_store::MemoryCredentialStore;

    fn fresh(owner: &str, token: &str) -> Credential {
        Credential::new(owner, token, format!("{token}-refresh"), 7_776_000)
    }

    fn expired(owner: &str, token: &str) -> Credential {
        Credential::new(owner, token, format!("{token}-refresh"), 3600).with_issued_at(1_000)
    }

    async fn resolver(
        credentials: Vec<Credential>,
        executor: Arc<ScriptedExecutor>,
    ) -> (CredentialResolver, Arc<MemoryCredentialStore>) {
        let store = Arc::new(MemoryCredentialStore::new());
        for credential in credentials {
            store
                .store_credential(&credential.owner.clone(), credential)
                .await
                .unwrap();
        }
        let resolver = CredentialResolver::new(
            store.clone(),
            executor,
            "https://api.trakt.tv",
            HeaderSet::new().with("trakt-api-version", "2"),
            "client",
            "secret",
        );
        (resolver, store)
    }

    #[tokio::test]
    async fn test_requested_owner_is_used() {
        let (resolver, _) = resolver(
            vec![fresh("alice", "a-tok"), fresh("bob", "b-tok")],
            Arc::new(ScriptedExecutor::new()),
        )
        .await;

        let credential = resolver.resolve(Some("bob")).await.unwrap();
        assert_eq!(credential.access_token, "b-tok");
    }

    #[tokio::test]
    async fn test_unknown_owner_falls_back_to_first() {
        let (resolver, _) = resolver(
            vec![fresh("bob", "b-tok"), fresh("alice", "a-tok")],
            Arc::new(ScriptedExecutor::new()),
        )
        .await;

        assert_eq!(resolver.resolve_owner(Some("carol")).await.unwrap(), "alice");
        assert_eq!(resolver.resolve_owner(None).await.unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_no_credential() {
        let (resolver, _) = resolver(vec![], Arc::new(ScriptedExecutor::new())).await;
        assert!(matches!(
            resolver.resolve(None).await,
            Err(FetchError::NoCredential)
        ));
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_stored() {
        let token = json!({
            "access_token": "new-tok",
            "refresh_token": "new-ref",
            "created_at": 4_102_444_800_i64,
            "expires_in": 7_776_000,
            "token_type": "bearer"
        });
        let executor =
            Arc::new(ScriptedExecutor::new().with_response(ApiResponse::json_ok(&token)));
        let (resolver, store) = resolver(vec![expired("alice", "old")], executor.clone()).await;

        let credential = resolver.resolve(Some("alice")).await.unwrap();
        assert_eq!(credential.access_token, "new-tok");
        assert_eq!(credential.owner, "alice");

        let stored = store.load_credential("alice").await.unwrap().unwrap();
        assert_eq!(stored.access_token, "new-tok");

        let sent = executor.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].request.path, "oauth/token");
        let body = sent[0].request.body.as_ref().unwrap();
        assert_eq!(body["refresh_token"], "old-refresh");
        assert_eq!(body["grant_type"], "refresh_token");
    }

    #[tokio::test]
    async fn test_failed_refresh_rejects_by_default() {
        let executor = Arc::new(ScriptedExecutor::new().with_response(ApiResponse::new(401, "")));
        let (resolver, _) = resolver(vec![expired("alice", "old")], executor).await;

        match resolver.resolve(None).await {
            Err(FetchError::CredentialExpired { owner }) => assert_eq!(owner, "alice"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_refresh_attaches_stale_when_configured() {
        let executor = Arc::new(ScriptedExecutor::new().with_response(ApiResponse::new(400, "")));
        let (resolver, _) = resolver(vec![expired("alice", "old")], executor).await;
        let resolver = resolver.with_policy(ExpiredTokenPolicy::AttachStale);

        let credential = resolver.resolve(None).await.unwrap();
        assert_eq!(credential.access_token, "old");
    }

    #[tokio::test]
    async fn test_headers_are_fresh_per_call() {
        let (resolver, store) = resolver(
            vec![fresh("alice", "first")],
            Arc::new(ScriptedExecutor::new()),
        )
        .await;
        let provider = resolver.headers_for(Some("alice"));

        let headers = provider.headers().await.unwrap();
        assert_eq!(headers.get("authorization"), Some("Bearer first"));
        assert_eq!(headers.get("trakt-api-version"), Some("2"));

        store
            .store_credential("alice", fresh("alice", "second"))
            .await
            .unwrap();
        let headers = provider.headers().await.unwrap();
        assert_eq!(headers.get("authorization"), Some("Bearer second"));
        assert_eq!(resolver.base_headers.get("authorization"), None);
    }
}
