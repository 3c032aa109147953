//! Trait definitions for Traktarr.
//!
//! This module defines the persistence seam the OAuth flow and the
//! authenticated catalog endpoints depend on.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::Credential;

/// Persistent storage for OAuth credentials, keyed by owner.
///
/// The store is the only place credentials live; clients read from it on
/// every authenticated call and never cache tokens themselves.
///
/// Implementations are not required to serialize concurrent writers. Callers
/// must not run two device flows for the same owner at once.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persists `credential` for `owner`, replacing any previous one.
    async fn store_credential(&self, owner: &str, credential: Credential) -> Result<(), CoreError>;

    /// Loads the credential for `owner`, if one is stored.
    async fn load_credential(&self, owner: &str) -> Result<Option<Credential>, CoreError>;

    /// Lists every owner with a stored credential, in sorted order.
    async fn list_owners(&self) -> Result<BTreeSet<String>, CoreError>;
}
