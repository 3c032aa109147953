//! CLI command implementations.

pub mod auth;
pub mod config;
pub mod library;
pub mod lists;
pub mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};
use traktarr_fetch::FetchContext;
use traktarr_providers::{SonarrClient, TraktClient, TraktSettings};
use traktarr_store::{Config, ConfigCredentialStore, TraktConfig};

use crate::Cli;

// ============================================================================
// Session
// ============================================================================

/// Configuration and fetch context shared by one command run.
pub struct Session {
    /// Path of the configuration file.
    pub path: PathBuf,
    /// Loaded configuration.
    pub config: Config,
    /// Fetch context; Ctrl-C cancels it.
    pub ctx: FetchContext,
}

impl Session {
    /// Loads the configuration and builds the fetch context.
    pub async fn open(cli: &Cli) -> Result<Self> {
        let path = config_path(cli);
        let config = Config::load_from(&path)
            .await
            .with_context(|| format!("loading {}", path.display()))?;

        let ctx = FetchContext::builder()
            .settings(config.fetch_settings())
            .build()?;
        cancel_on_interrupt(&ctx);

        debug!(path = %path.display(), "Session opened");
        Ok(Self { path, config, ctx })
    }

    /// Trakt client persisting credentials into the configuration file.
    pub fn trakt(&self) -> Result<TraktClient> {
        let trakt = self.config.require_trakt()?;
        Ok(self.trakt_client(trakt))
    }

    /// Trakt client for calls that only send the client id.
    pub fn trakt_public(&self) -> Result<TraktClient> {
        let trakt = self.config.require_trakt_key()?;
        Ok(self.trakt_client(trakt))
    }

    fn trakt_client(&self, trakt: &TraktConfig) -> TraktClient {
        let settings = TraktSettings::new(&trakt.api_key, &trakt.api_secret)
            .with_limit(self.config.fetch.page_limit)
            .with_languages(self.config.fetch.languages.clone());
        let store = Arc::new(ConfigCredentialStore::new(&self.path));

        TraktClient::new(self.ctx.clone(), settings, store)
    }

    /// Sonarr client.
    pub fn sonarr(&self) -> Result<SonarrClient> {
        let sonarr = self.config.require_sonarr()?;
        Ok(SonarrClient::new(
            self.ctx.clone(),
            sonarr.url.trim_end_matches('/'),
            &sonarr.api_key,
        ))
    }
}

/// Configuration path from `--config` or the default location.
pub fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(Config::default_path)
}

fn cancel_on_interrupt(ctx: &FetchContext) {
    let token = ctx.cancellation().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling pending requests");
            token.cancel();
        }
    });
}
