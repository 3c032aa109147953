//! Sonarr provider implementation.
//!
//! Sonarr is the library manager series are added to. Requests carry the
//! `X-Api-Key` header; there is no user credential.
//!
//! ## API Endpoints
//!
//! - `GET api/system/status` - Key validation
//! - `GET api/series` - Every series in the library
//! - `GET api/profile` - Quality profiles
//! - `POST api/series` - Add a series

// Modules
mod client;
mod models;

// Re-exports
pub use client::{ADD_SERIES, PROFILES, SERIES, SYSTEM_STATUS, SonarrClient};
pub use models::{CreatedSeries, ErrorBody, NewSeries, QualityProfile, SeriesPayload};
