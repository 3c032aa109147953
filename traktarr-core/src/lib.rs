// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `Traktarr` Core
//!
//! Core types, models, and traits shared by every `Traktarr` crate.
//!
//! This crate provides:
//!
//! - Domain models (services, credentials, catalog results)
//! - Error types
//! - The [`CredentialStore`] trait the OAuth flow and the authenticated
//!   endpoints persist tokens through
//!
//! ## Key Types
//!
//! ### Services
//! - [`ServiceKind`] - The two upstream catalog services
//!
//! ### Credentials
//! - [`Credential`] - A stored OAuth access token for one owner
//!
//! ### Results
//! - [`Fetched`] - Tagged result of a read operation (found / empty / unavailable)
//! - [`WriteOutcome`] - Tagged result of a write operation

pub mod error;
pub mod models;
pub mod traits;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Services
    ServiceKind,
    // Credentials
    Credential,
    // Results
    Fetched,
    WriteOutcome,
};

// Re-export traits
pub use traits::CredentialStore;
