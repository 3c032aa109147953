//! Shared composition for catalog clients.
//!
//! [`CatalogClient`] binds a [`FetchContext`] to one service: its base URL
//! and its immutable base headers. Paginated endpoints go through the
//! [`PaginatedFetcher`](traktarr_fetch::PaginatedFetcher) wrapped in an outer
//! retry that only fires when the whole fetch came back unavailable;
//! single-shot endpoints go through one retry layer.

use std::future::Future;

use serde_json::Value;
use tracing::{debug, error, instrument, warn};
use traktarr_core::{Fetched, ServiceKind};
use traktarr_fetch::{
    ApiRequest, ApiResponse, FetchContext, FetchError, HeaderProvider, HeaderSet,
};

use crate::endpoint::{Endpoint, Paging};

/// Service binding shared by the Trakt and Sonarr clients.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    service: ServiceKind,
    ctx: FetchContext,
    base_url: String,
    base_headers: HeaderSet,
}

impl CatalogClient {
    /// Creates a client for `service` at `base_url`.
    pub fn new(
        service: ServiceKind,
        ctx: FetchContext,
        base_url: impl Into<String>,
        base_headers: HeaderSet,
    ) -> Self {
        Self {
            service,
            ctx,
            base_url: base_url.into(),
            base_headers,
        }
    }

    /// Service this client talks to.
    pub fn service(&self) -> ServiceKind {
        self.service
    }

    /// Fetch context.
    pub fn context(&self) -> &FetchContext {
        &self.ctx
    }

    /// Base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Headers sent with every request.
    pub fn base_headers(&self) -> &HeaderSet {
        &self.base_headers
    }

    /// Builds the request template for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidRequest`] if a path placeholder is
    /// missing.
    pub fn request(
        &self,
        endpoint: &Endpoint,
        params: &[(&str, &str)],
    ) -> Result<ApiRequest, FetchError> {
        endpoint.request(&self.base_url, params)
    }

    /// Fetches the records of `endpoint`, walking pages or sending one
    /// request as its [`Paging`] declares.
    ///
    /// # Errors
    ///
    /// Propagates fatal, credential and cancellation errors.
    pub async fn fetch_records(
        &self,
        endpoint: &Endpoint,
        request: &ApiRequest,
        headers: &dyn HeaderProvider,
    ) -> Result<Fetched<Vec<Value>>, FetchError> {
        match endpoint.paging {
            Paging::Paginated => self.fetch_list(endpoint, request, headers).await,
            Paging::Single => {
                let records = self
                    .fetch_single(endpoint.name, request, headers, |response| {
                        if !response.is_success() {
                            return Err(FetchError::unexpected_status(
                                response.status_code(),
                                &response.body,
                            ));
                        }
                        response.json::<Vec<Value>>()
                    })
                    .await?;
                Ok(records.map_or(Fetched::Unavailable, Fetched::from_items))
            }
        }
    }

    /// Fetches every page of a paginated endpoint.
    ///
    /// The inner page loop retries each page; this outer layer repeats the
    /// whole walk while it comes back [`Fetched::Unavailable`].
    ///
    /// # Errors
    ///
    /// Propagates fatal, credential and cancellation errors.
    #[instrument(skip_all, fields(service = %self.service, operation = endpoint.name))]
    pub async fn fetch_list(
        &self,
        endpoint: &Endpoint,
        request: &ApiRequest,
        headers: &dyn HeaderProvider,
    ) -> Result<Fetched<Vec<Value>>, FetchError> {
        let fetcher = self.ctx.fetcher();
        let extractor = endpoint.extractor();
        let (fetcher, extractor) = (&fetcher, &extractor);
        let operation = endpoint.name;

        let outcome = self
            .ctx
            .retry_policy()
            .execute(operation, || async move {
                match fetcher
                    .fetch_all(operation, request, extractor, headers)
                    .await?
                {
                    Fetched::Unavailable => Err(FetchError::Exhausted {
                        operation: operation.to_string(),
                    }),
                    other => Ok(other),
                }
            })
            .await;

        match outcome {
            Ok(Some(fetched)) => {
                debug!(count = fetched.len(), "Fetch finished");
                Ok(fetched)
            }
            Ok(None) => {
                warn!("No result after retries");
                Ok(Fetched::Unavailable)
            }
            Err(e) => {
                if e.is_fatal() {
                    error!(error = %e, "Fatal error");
                }
                Err(e)
            }
        }
    }

    /// Sends a single request through one retry layer.
    ///
    /// `interpret` maps the response to a value or an error; transient
    /// errors are retried. A 401 on an authenticated request is reported as
    /// [`FetchError::AuthorizationRevoked`] before `interpret` runs.
    ///
    /// # Errors
    ///
    /// Propagates fatal, credential and cancellation errors.
    #[instrument(skip_all, fields(service = %self.service, operation = operation))]
    pub async fn fetch_single<T, F>(
        &self,
        operation: &str,
        request: &ApiRequest,
        headers: &dyn HeaderProvider,
        interpret: F,
    ) -> Result<Option<T>, FetchError>
    where
        F: Fn(&ApiResponse) -> Result<T, FetchError>,
    {
        let interpret = &interpret;
        self.ctx
            .retry_policy()
            .execute(operation, || async move {
                let response = self.send(operation, request, headers).await?;
                interpret(&response)
            })
            .await
    }

    /// Sends one request without retrying.
    ///
    /// # Errors
    ///
    /// Returns transport errors, header-provider errors and
    /// [`FetchError::AuthorizationRevoked`].
    pub async fn send(
        &self,
        operation: &str,
        request: &ApiRequest,
        headers: &dyn HeaderProvider,
    ) -> Result<ApiResponse, FetchError> {
        let request = request.clone().with_headers(headers.headers().await?);
        let response = self.ctx.executor.execute(&request).await?;
        debug!(status = response.status_code(), "Response received");

        if response.status_code() == 401 && request.authenticated {
            error!(operation, "Authorization was revoked; re-authenticate");
            return Err(FetchError::AuthorizationRevoked {
                operation: operation.to_string(),
            });
        }
        Ok(response)
    }

    /// Runs `check` once and turns every error into `false`.
    ///
    /// Used by the key validation calls, which never raise.
    pub async fn probe<Fut>(&self, operation: &str, check: Fut) -> bool
    where
        Fut: Future<Output = Result<bool, FetchError>>,
    {
        match check.await {
            Ok(valid) => {
                debug!(service = %self.service, operation, valid, "Probe finished");
                valid
            }
            Err(e) => {
                warn!(service = %self.service, operation, error = %e, "Probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use traktarr_fetch::testing::ScriptedExecutor;
    use traktarr_fetch::{FetchSettings, PAGE_COUNT_HEADER};

    fn client(executor: Arc<ScriptedExecutor>) -> CatalogClient {
        let ctx = FetchContext::builder()
            .executor(executor)
            .settings(FetchSettings::default())
            .build()
            .unwrap();
        CatalogClient::new(ServiceKind::Trakt, ctx, "https://api.trakt.tv", HeaderSet::new())
    }

    #[tokio::test(start_paused = true)]
    async fn test_outer_retry_repeats_unavailable_walks() {
        let ok = ApiResponse::new(200, r#"[{"title":"A"}]"#).with_header(PAGE_COUNT_HEADER, "1");
        let executor = Arc::new(
            ScriptedExecutor::new()
                .with_repeated(&ApiResponse::new(500, ""), 4)
                .with_response(ok),
        );
        let client = client(executor.clone());
        let endpoint = Endpoint::list("trending_shows", "shows/trending");
        let request = client.request(&endpoint, &[]).unwrap();

        let start = tokio::time::Instant::now();
        let result = client
            .fetch_list(&endpoint, &request, &HeaderSet::new())
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(executor.request_count(), 5);
        // 1 + 2 + 4 inside the first walk, then 1 before the second walk.
        assert_eq!(start.elapsed(), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_is_not_retried() {
        let executor = Arc::new(
            ScriptedExecutor::new().with_response(ApiResponse::new(200, "[]")),
        );
        let client = client(executor.clone());
        let endpoint = Endpoint::list("anticipated_shows", "shows/anticipated");
        let request = client.request(&endpoint, &[]).unwrap();

        let result = client
            .fetch_list(&endpoint, &request, &HeaderSet::new())
            .await
            .unwrap();

        assert_eq!(result, Fetched::Empty);
        assert_eq!(executor.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_list_is_unavailable() {
        let executor = Arc::new(ScriptedExecutor::new());
        let client = client(executor.clone());
        let endpoint = Endpoint::list("trending_movies", "movies/trending");
        let request = client.request(&endpoint, &[]).unwrap();

        let result = client
            .fetch_list(&endpoint, &request, &HeaderSet::new())
            .await
            .unwrap();

        assert_eq!(result, Fetched::Unavailable);
        assert_eq!(executor.request_count(), 16);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_endpoint_does_not_walk_pages() {
        let body = r#"[{"title":"A"},{"title":"B"}]"#;
        let executor = Arc::new(
            ScriptedExecutor::new()
                .with_response(ApiResponse::new(200, body).with_header(PAGE_COUNT_HEADER, "3")),
        );
        let client = client(executor.clone());
        let endpoint = Endpoint::single("series", "api/series");
        let request = client.request(&endpoint, &[]).unwrap();

        let result = client
            .fetch_records(&endpoint, &request, &HeaderSet::new())
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(executor.request_count(), 1);
        assert_eq!(executor.requests()[0].request.page(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paginated_endpoint_walks_pages() {
        let page = |title: &str| {
            ApiResponse::new(200, format!(r#"[{{"title":"{title}"}}]"#))
                .with_header(PAGE_COUNT_HEADER, "2")
        };
        let executor = Arc::new(
            ScriptedExecutor::new()
                .with_response(page("A"))
                .with_response(page("B")),
        );
        let client = client(executor.clone());
        let endpoint = Endpoint::list("trending_shows", "shows/trending");
        let request = client.request(&endpoint, &[]).unwrap();

        let result = client
            .fetch_records(&endpoint, &request, &HeaderSet::new())
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(executor.request_count(), 2);
    }

    #[tokio::test]
    async fn test_probe_swallows_errors() {
        let client = client(Arc::new(ScriptedExecutor::new()));
        assert!(!client.probe("validate", async { Err(FetchError::Timeout(30)) }).await);
        assert!(client.probe("validate", async { Ok(true) }).await);
    }
}
