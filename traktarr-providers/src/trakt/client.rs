//! Trakt catalog client.
//!
//! Public chart endpoints (anticipated, trending, popular, box office) only
//! send the application headers. Watchlists and user lists attach the
//! bearer token of the requested owner, resolved per page.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};
use traktarr_core::{CredentialStore, Fetched, ServiceKind};
use traktarr_fetch::{ApiRequest, FetchContext, FetchError, HeaderSet};

use super::credentials::CredentialResolver;
use super::device_flow::{DeviceAuthFlow, DeviceAuthOutcome, DeviceAuthSession};
use super::endpoints::{
    ANTICIPATED_MOVIES, ANTICIPATED_SHOWS, BOXOFFICE_MOVIES, ListKind, POPULAR_MOVIES,
    POPULAR_SHOWS, TRENDING_MOVIES, TRENDING_SHOWS, USER_LIST_MOVIES, USER_LIST_SHOWS,
    VALIDATE_API_KEY, WATCHLIST_MOVIES, WATCHLIST_SHOWS,
};
use super::models::{TRAKT_API_VERSION, TraktSettings};
use crate::catalog::CatalogClient;
use crate::endpoint::Endpoint;

/// Result of a list fetch.
pub type ListResult = Result<Fetched<Vec<Value>>, FetchError>;

/// Media type of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// TV shows.
    Shows,
    /// Movies.
    Movies,
}

// ============================================================================
// Trakt Client
// ============================================================================

/// Client for the Trakt API.
#[derive(Debug, Clone)]
pub struct TraktClient {
    catalog: CatalogClient,
    credentials: CredentialResolver,
    settings: TraktSettings,
}

impl TraktClient {
    /// Creates a client.
    pub fn new(
        ctx: FetchContext,
        settings: TraktSettings,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        let headers = Self::base_headers(&settings.client_id);
        let credentials = CredentialResolver::new(
            store,
            ctx.executor.clone(),
            settings.base_url.clone(),
            headers.clone(),
            settings.client_id.clone(),
            settings.client_secret.clone(),
        )
        .with_policy(ctx.settings.expired_token_policy);
        let catalog =
            CatalogClient::new(ServiceKind::Trakt, ctx, settings.base_url.clone(), headers);

        Self {
            catalog,
            credentials,
            settings,
        }
    }

    /// Application headers sent with every request.
    pub fn base_headers(client_id: &str) -> HeaderSet {
        HeaderSet::new()
            .with("content-type", "application/json")
            .with("trakt-api-version", TRAKT_API_VERSION)
            .with("trakt-api-key", client_id)
    }

    /// Settings.
    pub fn settings(&self) -> &TraktSettings {
        &self.settings
    }

    /// Credential resolver.
    pub fn credentials(&self) -> &CredentialResolver {
        &self.credentials
    }

    // ------------------------------------------------------------------------
    // Key validation & OAuth
    // ------------------------------------------------------------------------

    /// Checks the client id with one unauthenticated request. Never raises;
    /// any failure is `false`.
    #[instrument(skip(self))]
    pub async fn validate_api_key(&self) -> bool {
        let check = async {
            let request = self.list_request(&VALIDATE_API_KEY, &[])?;
            let response = self
                .catalog
                .send(VALIDATE_API_KEY.name, &request, self.catalog.base_headers())
                .await?;
            Ok::<_, FetchError>(response.status_code() == 200)
        };
        self.catalog.probe(VALIDATE_API_KEY.name, check).await
    }

    /// Device authorization flow bound to this client's credentials.
    pub fn device_flow(&self) -> DeviceAuthFlow {
        DeviceAuthFlow::new(
            self.catalog.context().clone(),
            self.settings.base_url.clone(),
            self.catalog.base_headers().clone(),
            self.settings.client_id.clone(),
            self.settings.client_secret.clone(),
            self.credentials.store().clone(),
        )
    }

    /// Runs the device flow, handing the codes to `operator`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`] and store errors.
    pub async fn oauth_authentication<F>(
        &self,
        operator: F,
    ) -> Result<DeviceAuthOutcome, FetchError>
    where
        F: FnOnce(&DeviceAuthSession),
    {
        self.device_flow().run(operator).await
    }

    // ------------------------------------------------------------------------
    // Shows
    // ------------------------------------------------------------------------

    /// Most anticipated shows.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`].
    pub async fn anticipated_shows(&self) -> ListResult {
        self.fetch(&ANTICIPATED_SHOWS, &[], None).await
    }

    /// Trending shows.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`].
    pub async fn trending_shows(&self) -> ListResult {
        self.fetch(&TRENDING_SHOWS, &[], None).await
    }

    /// Popular shows, each wrapped as `{"show": ...}`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`].
    pub async fn popular_shows(&self) -> ListResult {
        self.fetch(&POPULAR_SHOWS, &[], None).await
    }

    /// Shows on the watchlist of `owner` (or the first stored owner).
    ///
    /// # Errors
    ///
    /// Returns credential errors, [`FetchError::AuthorizationRevoked`] and
    /// [`FetchError::Cancelled`].
    pub async fn watchlist_shows(&self, owner: Option<&str>) -> ListResult {
        self.fetch(&WATCHLIST_SHOWS, &[], owner).await
    }

    /// Shows on the list `list_id` of `owner` (or the first stored owner).
    ///
    /// # Errors
    ///
    /// Returns credential errors, [`FetchError::AuthorizationRevoked`] and
    /// [`FetchError::Cancelled`].
    pub async fn user_list_shows(&self, list_id: &str, owner: Option<&str>) -> ListResult {
        self.fetch_user_list(&USER_LIST_SHOWS, list_id, owner).await
    }

    // ------------------------------------------------------------------------
    // Movies
    // ------------------------------------------------------------------------

    /// Most anticipated movies.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`].
    pub async fn anticipated_movies(&self) -> ListResult {
        self.fetch(&ANTICIPATED_MOVIES, &[], None).await
    }

    /// Trending movies.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`].
    pub async fn trending_movies(&self) -> ListResult {
        self.fetch(&TRENDING_MOVIES, &[], None).await
    }

    /// Popular movies, each wrapped as `{"movie": ...}`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`].
    pub async fn popular_movies(&self) -> ListResult {
        self.fetch(&POPULAR_MOVIES, &[], None).await
    }

    /// Weekend box office.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`].
    pub async fn boxoffice_movies(&self) -> ListResult {
        self.fetch(&BOXOFFICE_MOVIES, &[], None).await
    }

    /// Movies on the watchlist of `owner` (or the first stored owner).
    ///
    /// # Errors
    ///
    /// Returns credential errors, [`FetchError::AuthorizationRevoked`] and
    /// [`FetchError::Cancelled`].
    pub async fn watchlist_movies(&self, owner: Option<&str>) -> ListResult {
        self.fetch(&WATCHLIST_MOVIES, &[], owner).await
    }

    /// Movies on the list `list_id` of `owner` (or the first stored owner).
    ///
    /// # Errors
    ///
    /// Returns credential errors, [`FetchError::AuthorizationRevoked`] and
    /// [`FetchError::Cancelled`].
    pub async fn user_list_movies(&self, list_id: &str, owner: Option<&str>) -> ListResult {
        self.fetch_user_list(&USER_LIST_MOVIES, list_id, owner).await
    }

    // ------------------------------------------------------------------------
    // Dispatch by list name
    // ------------------------------------------------------------------------

    /// Fetches a list by name: a chart name, `watchlist`, or a user list id.
    ///
    /// # Errors
    ///
    /// Returns credential errors, [`FetchError::AuthorizationRevoked`] and
    /// [`FetchError::Cancelled`]. Asking for box office shows is an
    /// [`FetchError::InvalidRequest`].
    pub async fn list(&self, media: MediaKind, name: &str, owner: Option<&str>) -> ListResult {
        match (media, ListKind::parse(name)) {
            (MediaKind::Shows, ListKind::Chart("anticipated")) => self.anticipated_shows().await,
            (MediaKind::Shows, ListKind::Chart("trending")) => self.trending_shows().await,
            (MediaKind::Shows, ListKind::Chart("popular")) => self.popular_shows().await,
            (MediaKind::Movies, ListKind::Chart("anticipated")) => self.anticipated_movies().await,
            (MediaKind::Movies, ListKind::Chart("trending")) => self.trending_movies().await,
            (MediaKind::Movies, ListKind::Chart("popular")) => self.popular_movies().await,
            (MediaKind::Movies, ListKind::Chart("boxoffice")) => self.boxoffice_movies().await,
            (_, ListKind::Chart(chart)) => Err(FetchError::InvalidRequest(format!(
                "there is no {chart} list for shows"
            ))),
            (MediaKind::Shows, ListKind::Watchlist) => self.watchlist_shows(owner).await,
            (MediaKind::Movies, ListKind::Watchlist) => self.watchlist_movies(owner).await,
            (MediaKind::Shows, ListKind::User(list_id)) => {
                self.user_list_shows(list_id, owner).await
            }
            (MediaKind::Movies, ListKind::User(list_id)) => {
                self.user_list_movies(list_id, owner).await
            }
        }
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    /// Request template with the default list query.
    fn list_request(
        &self,
        endpoint: &Endpoint,
        params: &[(&str, &str)],
    ) -> Result<ApiRequest, FetchError> {
        let mut request = self
            .catalog
            .request(endpoint, params)?
            .with_query("extended", "full")
            .with_query("limit", self.settings.limit);
        if !self.settings.languages.is_empty() {
            request.set_query("languages", self.settings.languages.join(","));
        }
        Ok(request)
    }

    async fn fetch(
        &self,
        endpoint: &Endpoint,
        params: &[(&str, &str)],
        owner: Option<&str>,
    ) -> ListResult {
        let request = self.list_request(endpoint, params)?;

        if endpoint.requires_auth {
            debug!(
                operation = endpoint.name,
                owner = owner.unwrap_or("<first>"),
                "Authenticated fetch"
            );
            let headers = self.credentials.headers_for(owner);
            self.catalog.fetch_records(endpoint, &request, &headers).await
        } else {
            self.catalog
                .fetch_records(endpoint, &request, self.catalog.base_headers())
                .await
        }
    }

    async fn fetch_user_list(
        &self,
        endpoint: &Endpoint,
        list_id: &str,
        owner: Option<&str>,
    ) -> ListResult {
        let owner = self.credentials.resolve_owner(owner).await?;
        self.fetch(
            endpoint,
            &[("user", owner.as_str()), ("list", list_id)],
            Some(owner.as_str()),
        )
        .await
    }
}
