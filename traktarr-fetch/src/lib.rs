// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Traktarr Fetch
//!
//! Retry, pagination and HTTP plumbing shared by the Traktarr catalog
//! clients.
//!
//! ## Host APIs
//!
//! - [`host::http`] - reqwest-backed [`RequestExecutor`] with tracing
//!
//! ## Fetch Machinery
//!
//! - [`retry::RetryPolicy`] - bounded exponential backoff, "no result" on
//!   exhaustion
//! - [`pagination::PaginatedFetcher`] - page loop with deduplication
//! - [`context::FetchContext`] - executor, settings and cancellation
//!
//! ## Example
//!
//! ```ignore
//! use traktarr_fetch::{ApiRequest, FetchContext, HeaderPagination, HeaderSet};
//!
//! let ctx = FetchContext::new()?;
//! let request = ApiRequest::get("https://api.trakt.tv", "shows/trending");
//! let shows = ctx
//!     .fetcher()
//!     .fetch_all("trending_shows", &request, &HeaderPagination::default(), &HeaderSet::new())
//!     .await?;
//! ```

// Core modules
pub mod context;
pub mod error;
pub mod executor;
pub mod host;
pub mod pagination;
pub mod request;
pub mod retry;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

// Re-export key types at crate root

// Errors
pub use error::FetchError;

// Host APIs
pub use host::http::HttpClient;

// Requests
pub use executor::{HeaderProvider, RequestExecutor};
pub use request::{ApiRequest, ApiResponse, HeaderSet};

// Retry & pagination
pub use context::{
    ExpiredTokenPolicy, FetchContext, FetchContextBuilder, FetchSettings, sleep_cancellable,
};
pub use pagination::{
    Aggregated, HeaderPagination, PAGE_COUNT_HEADER, PageExtractor, PageResult, PaginatedFetcher,
};
pub use retry::{BackoffEvent, BackoffObserver, LogBackoff, RetryPolicy};
