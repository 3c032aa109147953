// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `Traktarr` Store
//!
//! Configuration and credential storage for `Traktarr`.
//!
//! This crate provides:
//!
//! - **Config**: Sonarr, Trakt and fetch settings in one JSON file
//! - **Credential stores**: [`ConfigCredentialStore`] persisting OAuth
//!   tokens into that file, and [`MemoryCredentialStore`] for tests and
//!   one-off runs
//! - **Persistence**: Atomic, owner-only JSON file I/O
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use traktarr_store::{Config, ConfigCredentialStore};
//!
//! let path = Config::default_path();
//! let config = Config::load_from(&path).await?;
//! let store = Arc::new(ConfigCredentialStore::new(&path));
//! let settings = config.fetch_settings();
//! ```

pub mod config;
pub mod credential_store;
pub mod error;
pub mod persistence;

pub use config::{Config, FetchConfig, SonarrConfig, TraktConfig};
pub use credential_store::{ConfigCredentialStore, MemoryCredentialStore};
pub use error::StoreError;
pub use persistence::{
    default_config_dir, default_config_path, load_json, load_json_or_default, save_json,
};
