//! Paginated fetching.
//!
//! [`PaginatedFetcher::fetch_all`] walks pages starting at 1, wraps each page
//! request in the [`RetryPolicy`], and collects records into an
//! [`Aggregated`] set that keeps first-seen order and drops structural
//! duplicates. The loop stops when the page count is missing, zero, or not
//! beyond the current page; when a page exhausts its retries; or when the
//! upstream revokes authorization.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use traktarr_core::Fetched;

use crate::context::sleep_cancellable;
use crate::error::FetchError;
use crate::executor::{HeaderProvider, RequestExecutor};
use crate::request::{ApiRequest, ApiResponse};
use crate::retry::RetryPolicy;

/// Page-count header used by Trakt.
pub const PAGE_COUNT_HEADER: &str = "X-Pagination-Page-Count";

/// Default delay between page requests.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(5);

// ============================================================================
// Page Extractor
// ============================================================================

/// Adapts an endpoint's response shape to the page loop.
pub trait PageExtractor: Send + Sync {
    /// Records contained in a successful page.
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not have the expected shape.
    fn extract_items(&self, response: &ApiResponse) -> Result<Vec<Value>, FetchError>;

    /// Total page count reported by the upstream, if any.
    fn extract_page_count(&self, response: &ApiResponse) -> Option<u32>;

    /// Identity used for deduplication. Defaults to full-value equality.
    fn dedupe_key(&self, record: &Value) -> String {
        canonical_key(record)
    }
}

/// Extractor for JSON-array pages with the count in a response header.
///
/// With an envelope key every record is wrapped as `{ key: record }` so that
/// endpoints returning bare records line up with those returning wrapped
/// ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderPagination {
    page_count_header: String,
    envelope: Option<String>,
}

impl HeaderPagination {
    /// Reads the page count from `header`.
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            page_count_header: header.into(),
            envelope: None,
        }
    }

    /// Wraps every record under `key`.
    #[must_use]
    pub fn with_envelope(mut self, key: impl Into<String>) -> Self {
        self.envelope = Some(key.into());
        self
    }

    /// Envelope key, if any.
    pub fn envelope(&self) -> Option<&str> {
        self.envelope.as_deref()
    }
}

impl Default for HeaderPagination {
    fn default() -> Self {
        Self::new(PAGE_COUNT_HEADER)
    }
}

impl PageExtractor for HeaderPagination {
    fn extract_items(&self, response: &ApiResponse) -> Result<Vec<Value>, FetchError> {
        let Value::Array(items) = response.json::<Value>()? else {
            return Err(FetchError::InvalidResponse(
                "expected a JSON array page".to_string(),
            ));
        };

        Ok(match &self.envelope {
            Some(key) => items
                .into_iter()
                .map(|item| {
                    let mut wrapped = serde_json::Map::new();
                    wrapped.insert(key.clone(), item);
                    Value::Object(wrapped)
                })
                .collect(),
            None => items,
        })
    }

    fn extract_page_count(&self, response: &ApiResponse) -> Option<u32> {
        response.header_u32(&self.page_count_header)
    }
}

/// Canonical text of a JSON value with object keys sorted at every level.
pub fn canonical_key(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

// ============================================================================
// Aggregated Result
// ============================================================================

/// Records collected across pages, deduplicated, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Aggregated {
    items: Vec<Value>,
    seen: HashSet<String>,
}

impl Aggregated {
    /// Creates an empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `record` unless a record with the same `key` is present.
    /// Returns true if it was added.
    pub fn push(&mut self, key: String, record: Value) -> bool {
        if self.seen.insert(key) {
            self.items.push(record);
            true
        } else {
            false
        }
    }

    /// Adds every new record using the extractor's identity. Returns the
    /// number added.
    pub fn extend(&mut self, records: Vec<Value>, extractor: &dyn PageExtractor) -> usize {
        let mut added = 0;
        for record in records {
            if self.push(extractor.dedupe_key(&record), record) {
                added += 1;
            }
        }
        added
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no record was collected.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Collected records.
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Consumes the aggregate.
    pub fn into_items(self) -> Vec<Value> {
        self.items
    }
}

// ============================================================================
// Paginated Fetcher
// ============================================================================

/// One successfully fetched page.
#[derive(Debug, Clone)]
pub struct PageResult {
    /// HTTP status.
    pub status: u16,
    /// Records on the page.
    pub items: Vec<Value>,
    /// Page count reported by the upstream.
    pub total_pages: Option<u32>,
}

/// Drives the page loop for one request template.
#[derive(Clone)]
pub struct PaginatedFetcher {
    executor: Arc<dyn RequestExecutor>,
    retry: RetryPolicy,
    page_delay: Duration,
    cancel: CancellationToken,
}

impl PaginatedFetcher {
    /// Creates a fetcher.
    pub fn new(executor: Arc<dyn RequestExecutor>, retry: RetryPolicy) -> Self {
        Self {
            executor,
            retry,
            page_delay: DEFAULT_PAGE_DELAY,
            cancel: CancellationToken::new(),
        }
    }

    /// Sets the delay between pages.
    #[must_use]
    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    /// Makes inter-page delays cancellable through `cancel`.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetches every page of `request` and aggregates the records.
    ///
    /// Returns `Found` with at least one record, `Empty` when every page
    /// succeeded without records, and `Unavailable` when nothing was
    /// collected and a page ran out of retries. Records gathered before an
    /// exhausted page are kept.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::AuthorizationRevoked`] when an authenticated
    /// page answers 401, header-provider errors, and
    /// [`FetchError::Cancelled`].
    #[instrument(skip_all, fields(operation = operation))]
    pub async fn fetch_all(
        &self,
        operation: &str,
        request: &ApiRequest,
        extractor: &dyn PageExtractor,
        headers: &dyn HeaderProvider,
    ) -> Result<Fetched<Vec<Value>>, FetchError> {
        let mut aggregated = Aggregated::new();
        let mut page: u32 = 1;
        let mut exhausted = false;

        loop {
            let mut page_request = request.clone();
            page_request.set_page(page);
            let page_request = &page_request;

            let outcome = self
                .retry
                .execute(operation, || async move {
                    self.fetch_page(operation, page_request, extractor, headers)
                        .await
                })
                .await?;

            let Some(result) = outcome else {
                warn!(page, collected = aggregated.len(), "Page exhausted retries; stopping");
                exhausted = true;
                break;
            };

            let added = aggregated.extend(result.items, extractor);
            debug!(
                page,
                total_pages = result.total_pages.unwrap_or(0),
                added,
                "Page received"
            );

            match result.total_pages {
                Some(total) if total > page => {
                    info!("There are {} pages left to retrieve", total - page);
                    page += 1;
                    sleep_cancellable(self.page_delay, &self.cancel).await?;
                }
                _ => {
                    debug!("No more pages to retrieve");
                    break;
                }
            }
        }

        if aggregated.is_empty() {
            return Ok(if exhausted {
                Fetched::Unavailable
            } else {
                Fetched::Empty
            });
        }

        debug!(count = aggregated.len(), "Collected records");
        Ok(Fetched::Found(aggregated.into_items()))
    }

    async fn fetch_page(
        &self,
        operation: &str,
        request: &ApiRequest,
        extractor: &dyn PageExtractor,
        headers: &dyn HeaderProvider,
    ) -> Result<PageResult, FetchError> {
        let request = request.clone().with_headers(headers.headers().await?);
        let response = self.executor.execute(&request).await?;

        if response.status_code() == 401 && request.authenticated {
            error!(operation, "Authorization was revoked; re-authenticate");
            return Err(FetchError::AuthorizationRevoked {
                operation: operation.to_string(),
            });
        }

        if !response.is_success() {
            return Err(FetchError::unexpected_status(
                response.status_code(),
                &response.body,
            ));
        }

        Ok(PageResult {
            status: response.status_code(),
            items: extractor.extract_items(&response)?,
            total_pages: extractor.extract_page_count(&response),
        })
    }
}

impl std::fmt::Debug for PaginatedFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatedFetcher")
            .field("retry", &self.retry)
            .field("page_delay", &self.page_delay)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
