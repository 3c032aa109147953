//! Domain models for Traktarr.
//!
//! ## Submodules
//!
//! - [`service`] - The upstream services (ServiceKind)
//! - [`credential`] - OAuth credentials (Credential)
//! - [`fetched`] - Tagged operation results (Fetched, WriteOutcome)

mod credential;
mod fetched;
mod service;

// Re-export everything at the models level
pub use credential::Credential;
pub use fetched::{Fetched, WriteOutcome};
pub use service::ServiceKind;
