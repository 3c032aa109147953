//! Endpoint descriptors.
//!
//! An endpoint descriptor holds the static configuration of one catalog
//! operation:
//! - Name (used in logs and backoff messages)
//! - Path template with `{placeholder}` segments
//! - HTTP method
//! - Whether a user credential is required
//! - Paging mode and optional envelope key

use reqwest::Method;
use traktarr_fetch::{ApiRequest, FetchError, HeaderPagination, PAGE_COUNT_HEADER};

// ============================================================================
// Endpoint
// ============================================================================

/// Whether the endpoint walks pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    /// Walk pages with the page-count header.
    Paginated,
    /// One request.
    Single,
}

/// Static description of one catalog operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Operation name.
    pub name: &'static str,
    /// Path template relative to the service base URL.
    pub path: &'static str,
    /// HTTP method.
    pub method: Method,
    /// Whether a user credential must be attached.
    pub requires_auth: bool,
    /// Paging mode.
    pub paging: Paging,
    /// Key each record is wrapped under, for endpoints that return bare
    /// records where siblings return wrapped ones.
    pub envelope: Option<&'static str>,
}

impl Endpoint {
    /// Public paginated GET endpoint.
    pub const fn list(name: &'static str, path: &'static str) -> Self {
        Self {
            name,
            path,
            method: Method::GET,
            requires_auth: false,
            paging: Paging::Paginated,
            envelope: None,
        }
    }

    /// Single-shot GET endpoint.
    pub const fn single(name: &'static str, path: &'static str) -> Self {
        Self {
            name,
            path,
            method: Method::GET,
            requires_auth: false,
            paging: Paging::Single,
            envelope: None,
        }
    }

    /// Single-shot POST endpoint.
    pub const fn write(name: &'static str, path: &'static str) -> Self {
        Self {
            name,
            path,
            method: Method::POST,
            requires_auth: false,
            paging: Paging::Single,
            envelope: None,
        }
    }

    /// Marks the endpoint as requiring a user credential.
    #[must_use]
    pub const fn authenticated(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    /// Wraps every record under `key`.
    #[must_use]
    pub const fn enveloped(mut self, key: &'static str) -> Self {
        self.envelope = Some(key);
        self
    }

    /// Fills the path template.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidRequest`] if a placeholder has no value.
    pub fn render_path(&self, params: &[(&str, &str)]) -> Result<String, FetchError> {
        let mut path = self.path.to_string();
        for (name, value) in params {
            path = path.replace(&format!("{{{name}}}"), value);
        }

        if path.contains('{') {
            return Err(FetchError::InvalidRequest(format!(
                "{}: unfilled placeholder in {path}",
                self.name
            )));
        }
        Ok(path)
    }

    /// Builds the request template against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidRequest`] if a placeholder has no value.
    pub fn request(
        &self,
        base_url: &str,
        params: &[(&str, &str)],
    ) -> Result<ApiRequest, FetchError> {
        Ok(
            ApiRequest::new(self.method.clone(), base_url, self.render_path(params)?)
                .authenticated(self.requires_auth),
        )
    }

    /// Page extractor for this endpoint.
    pub fn extractor(&self) -> HeaderPagination {
        let extractor = HeaderPagination::new(PAGE_COUNT_HEADER);
        match self.envelope {
            Some(key) => extractor.with_envelope(key),
            None => extractor,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
