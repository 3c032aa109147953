//! [`CredentialStore`] implementations.
//!
//! [`ConfigCredentialStore`] keeps credentials under `trakt.users` in the
//! configuration file and re-reads the file on every call, so tokens saved
//! by another process are picked up without a restart.
//! [`MemoryCredentialStore`] keeps them in memory only.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use traktarr_core::{CoreError, Credential, CredentialStore};

use crate::config::Config;

// ============================================================================
// Config-backed Store
// ============================================================================

/// Credential store backed by the configuration file.
#[derive(Debug)]
pub struct ConfigCredentialStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ConfigCredentialStore {
    /// Creates a store for the configuration file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the configuration file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Config, CoreError> {
        Ok(Config::load_from(&self.path).await?)
    }
}

#[async_trait]
impl CredentialStore for ConfigCredentialStore {
    async fn store_credential(&self, owner: &str, credential: Credential) -> Result<(), CoreError> {
        let _guard = self.write_lock.lock().await;

        let mut config = self.load().await?;
        config
            .trakt
            .users
            .insert(owner.to_string(), credential.for_owner(owner));
        config.save_to(&self.path).await?;

        info!(owner, path = %self.path.display(), "Stored credential");
        Ok(())
    }

    async fn load_credential(&self, owner: &str) -> Result<Option<Credential>, CoreError> {
        let config = self.load().await?;
        let credential = config
            .trakt
            .users
            .get(owner)
            .map(|c| c.clone().for_owner(owner));
        debug!(owner, found = credential.is_some(), "Loaded credential");
        Ok(credential)
    }

    async fn list_owners(&self) -> Result<BTreeSet<String>, CoreError> {
        let config = self.load().await?;
        Ok(config.trakt.users.into_keys().collect())
    }
}

// ============================================================================
// In-memory Store
// ============================================================================

/// Credential store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: RwLock<BTreeMap<String, Credential>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `credentials`, keyed by their owner.
    pub fn with_credentials(credentials: impl IntoIterator<Item = Credential>) -> Self {
        let credentials = credentials
            .into_iter()
            .map(|c| (c.owner.clone(), c))
            .collect();
        Self {
            credentials: RwLock::new(credentials),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn store_credential(&self, owner: &str, credential: Credential) -> Result<(), CoreError> {
        self.credentials
            .write()
            .await
            .insert(owner.to_string(), credential.for_owner(owner));
        Ok(())
    }

    async fn load_credential(&self, owner: &str) -> Result<Option<Credential>, CoreError> {
        Ok(self.credentials.read().await.get(owner).cloned())
    }

    async fn list_owners(&self) -> Result<BTreeSet<String>, CoreError> {
        Ok(self.credentials.read().await.keys().cloned().collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
