//! Host APIs for Traktarr fetches.
//!
//! - [`http`] - reqwest-backed request executor with tracing

pub mod http;

// Re-export key types
pub use http::HttpClient;
