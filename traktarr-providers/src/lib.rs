// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Traktarr Providers
//!
//! Catalog clients for the two upstream services.
//!
//! Each provider module includes:
//!
//! - **Endpoints**: Static descriptors (path, method, auth, paging, envelope)
//! - **Client**: Operations composed from the shared [`CatalogClient`]
//! - **Models**: Wire types
//!
//! ## Supported Services
//!
//! | Service | Role | Auth | Paginated |
//! |---------|------|------|-----------|
//! | Trakt | Recommendations, watchlists | API key + OAuth device flow | yes |
//! | Sonarr | Library manager | API key | no |
//!
//! ## Usage
//!
//! ```ignore
//! use traktarr_fetch::FetchContext;
//! use traktarr_providers::trakt::{TraktClient, TraktSettings};
//!
//! let ctx = FetchContext::new()?;
//! let trakt = TraktClient::new(ctx, TraktSettings::new(client_id, secret), store);
//! let shows = trakt.trending_shows().await?;
//! ```

pub mod catalog;
pub mod endpoint;

// Provider modules (alphabetical)
pub mod sonarr;
pub mod trakt;

// Re-export key types
pub use catalog::CatalogClient;
pub use endpoint::{Endpoint, Paging};

// Re-export clients for convenience
pub use sonarr::{NewSeries, SonarrClient};
pub use trakt::{DeviceAuthFlow, DeviceAuthOutcome, MediaKind, TraktClient, TraktSettings};
