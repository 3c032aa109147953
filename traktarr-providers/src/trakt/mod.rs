//! Trakt provider implementation.
//!
//! Trakt is the recommendation and tracking service. This provider supports:
//!
//! - Public chart lists (anticipated, trending, popular, box office)
//! - Watchlists and user lists through a stored OAuth token
//! - The OAuth device flow to obtain that token
//!
//! ## Device Flow
//!
//! ```ignore
//! use traktarr_providers::trakt::TraktClient;
//!
//! let outcome = client
//!     .oauth_authentication(|session| {
//!         println!("Go to {} and enter {}", session.verification_url, session.user_code);
//!     })
//!     .await?;
//! ```
//!
//! ## API Endpoints
//!
//! - `GET shows/{anticipated,trending,popular}`, `GET movies/{...,boxoffice}`
//! - `GET sync/watchlist/{shows,movies}` - requires a bearer token
//! - `GET users/{user}/lists/{list}/items/{shows,movies}` - requires a bearer token
//! - `POST oauth/device/code`, `POST oauth/device/token`, `POST oauth/token`
//! - `GET users/me`

// Modules
mod client;
mod credentials;
mod device_flow;
pub mod endpoints;
mod models;

// Re-exports
pub use client::{ListResult, MediaKind, TraktClient};
pub use credentials::{AuthenticatedHeaders, CredentialResolver};
pub use device_flow::{DeviceAuthFlow, DeviceAuthOutcome, DeviceAuthSession, PollStep};
pub use endpoints::{ListKind, NON_USER_LISTS};
pub use models::{DeviceCodeResponse, TRAKT_API_BASE, TraktSettings, TraktUser};
