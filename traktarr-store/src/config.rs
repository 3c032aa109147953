//! Configuration management.
//!
//! One JSON file holds the Sonarr and Trakt settings, the fetch timings and
//! the OAuth credential of every authenticated Trakt user.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use traktarr_core::Credential;
use traktarr_fetch::{ExpiredTokenPolicy, FetchSettings};

use crate::error::StoreError;
use crate::persistence::{default_config_path, load_json, save_json};

const REDACTED: &str = "<redacted>";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Sonarr settings.
    #[serde(default)]
    pub sonarr: SonarrConfig,
    /// Trakt settings and stored users.
    #[serde(default)]
    pub trakt: TraktConfig,
    /// Request timing and retry settings.
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Sonarr settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SonarrConfig {
    /// Server URL, e.g. `http://localhost:8989`.
    #[serde(default)]
    pub url: String,
    /// API key.
    #[serde(default)]
    pub api_key: String,
    /// Quality profile new series are added with.
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Root folder new series are stored under.
    #[serde(default)]
    pub root_folder: String,
}

/// Trakt settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraktConfig {
    /// Application client id.
    #[serde(default)]
    pub api_key: String,
    /// Application client secret.
    #[serde(default)]
    pub api_secret: String,
    /// Credentials by username.
    #[serde(default)]
    pub users: BTreeMap<String, Credential>,
}

/// Request timing and retry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Delay between pages in seconds.
    pub page_delay_secs: u64,
    /// Base delay of the retry schedule in seconds.
    pub retry_base_delay_secs: u64,
    /// Attempt cap of the retry schedule.
    pub retry_max_attempts: u32,
    /// Trakt page size.
    pub page_limit: u32,
    /// Trakt translation languages.
    pub languages: Vec<String>,
    /// Handling of expired tokens whose refresh failed.
    pub expired_token_policy: ExpiredTokenPolicy,
}

fn default_profile() -> String {
    "HD-1080p".to_string()
}

impl Default for SonarrConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            profile: default_profile(),
            root_folder: String::new(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            page_delay_secs: 5,
            retry_base_delay_secs: 1,
            retry_max_attempts: 4,
            page_limit: 1000,
            languages: vec!["en".to_string()],
            expired_token_policy: ExpiredTokenPolicy::Reject,
        }
    }
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        default_config_path()
    }

    /// Loads configuration from a specific path.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns IO errors and parse errors for a malformed file.
    pub async fn load_from(path: &Path) -> Result<Self, StoreError> {
        match load_json::<Self>(path).await {
            Ok(config) => {
                info!(path = %path.display(), "Loaded configuration");
                Ok(config)
            }
            Err(e) if e.is_not_found() => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Saves configuration to a specific path.
    ///
    /// # Errors
    ///
    /// Returns IO and serialization errors.
    pub async fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self).await?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Fetch settings for [`traktarr_fetch::FetchContext`].
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            timeout: Duration::from_secs(self.fetch.request_timeout_secs),
            page_delay: Duration::from_secs(self.fetch.page_delay_secs),
            retry_base_delay: Duration::from_secs(self.fetch.retry_base_delay_secs),
            max_attempts: self.fetch.retry_max_attempts,
            expired_token_policy: self.fetch.expired_token_policy,
        }
    }

    /// Checks that the Sonarr section can build a client.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] naming the first missing key.
    pub fn require_sonarr(&self) -> Result<&SonarrConfig, StoreError> {
        require("sonarr.url", &self.sonarr.url)?;
        require("sonarr.api_key", &self.sonarr.api_key)?;
        Ok(&self.sonarr)
    }

    /// Checks that the Trakt section can build a client.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] naming the first missing key.
    pub fn require_trakt(&self) -> Result<&TraktConfig, StoreError> {
        self.require_trakt_key()?;
        require("trakt.api_secret", &self.trakt.api_secret)?;
        Ok(&self.trakt)
    }

    /// Checks that the Trakt client id is set. Public endpoints and key
    /// validation need nothing else.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if `trakt.api_key` is missing.
    pub fn require_trakt_key(&self) -> Result<&TraktConfig, StoreError> {
        require("trakt.api_key", &self.trakt.api_key)?;
        Ok(&self.trakt)
    }

    /// Copy with every key and token replaced, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        mask(&mut copy.sonarr.api_key);
        mask(&mut copy.trakt.api_key);
        mask(&mut copy.trakt.api_secret);
        for credential in copy.trakt.users.values_mut() {
            mask(&mut credential.access_token);
            mask(&mut credential.refresh_token);
        }
        copy
    }
}

fn require(key: &str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        Err(StoreError::Config(format!("{key} is not set")))
    } else {
        Ok(())
    }
}

fn mask(value: &mut String) {
    if !value.is_empty() {
        *value = REDACTED.to_string();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_empty_object() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.sonarr.profile, "HD-1080p");
        assert_eq!(config.fetch.page_limit, 1000);
        assert_eq!(config.fetch.languages, vec!["en"]);
    }

    #[test]
    fn test_partial_fetch_section_keeps_other_defaults() {
        let json = r#"{"fetch": {"page_delay_secs": 0, "expired_token_policy": "attach_stale"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.fetch.page_delay_secs, 0);
        assert_eq!(config.fetch.request_timeout_secs, 30);
        assert_eq!(config.fetch.expired_token_policy, ExpiredTokenPolicy::AttachStale);
    }

    #[test]
    fn test_fetch_settings() {
        let mut config = Config::default();
        config.fetch.retry_max_attempts = 6;
        config.fetch.request_timeout_secs = 10;

        let settings = config.fetch_settings();
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert_eq!(settings.page_delay, Duration::from_secs(5));
        assert_eq!(settings.retry_base_delay, Duration::from_secs(1));
        assert_eq!(settings.max_attempts, 6);
        assert_eq!(settings.expired_token_policy, ExpiredTokenPolicy::Reject);
    }

    #[test]
    fn test_require_sections() {
        let mut config = Config::default();
        let err = config.require_sonarr().unwrap_err();
        assert!(err.to_string().contains("sonarr.url"));

        config.sonarr.url = "http://localhost:8989".into();
        config.sonarr.api_key = "key".into();
        assert!(config.require_sonarr().is_ok());

        config.trakt.api_key = "id".into();
        let err = config.require_trakt().unwrap_err();
        assert!(err.to_string().contains("trakt.api_secret"));
    }

    #[test]
    fn test_client_id_alone_is_enough_for_key_checks() {
        let mut config = Config::default();
        let err = config.require_trakt_key().unwrap_err();
        assert!(err.to_string().contains("trakt.api_key"));

        config.trakt.api_key = "id".into();
        assert_eq!(config.require_trakt_key().unwrap().api_key, "id");
        assert!(config.require_trakt().is_err());
    }

    #[test]
    fn test_redacted_hides_secrets() {
        let mut config = Config::default();
        config.trakt.api_key = "id".into();
        config.trakt.users.insert(
            "alice".into(),
            Credential::new("alice", "tok", "ref", 3600),
        );

        let shown = config.redacted();
        assert_eq!(shown.trakt.api_key, REDACTED);
        assert_eq!(shown.trakt.api_secret, "");
        assert_eq!(shown.trakt.users["alice"].access_token, REDACTED);
        assert_eq!(config.trakt.users["alice"].access_token, "tok");
    }

    #[tokio::test]
    async fn test_load_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from(&temp_dir.path().join("config.json"))
            .await
            .unwrap();
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        let mut config = Config::default();
        config.sonarr.url = "http://localhost:8989".into();
        config.trakt.users.insert(
            "alice".into(),
            Credential::new("alice", "tok", "ref", 3600).with_issued_at(1_700_000_000),
        );
        config.save_to(&path).await.unwrap();

        let loaded = Config::load_from(&path).await.unwrap();
        assert_eq!(loaded, config);
    }
}
