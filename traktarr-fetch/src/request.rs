//! Request and response types.
//!
//! An [`ApiRequest`] describes one call against an upstream service: base
//! URL, path, verb, query, headers and an optional JSON body. Paginated
//! fetches clone the request and only change its `page` parameter between
//! iterations. Headers are an immutable [`HeaderSet`]; adding a header
//! produces a new set, so a base template is never mutated by a call.

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::error::FetchError;

/// Query parameter carrying the page number.
pub const PAGE_PARAM: &str = "page";

// ============================================================================
// Header Set
// ============================================================================

/// An immutable set of request headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: BTreeMap<String, String>,
}

impl HeaderSet {
    /// Creates an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new set with `name` set to `value`.
    #[must_use]
    pub fn with(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(name.into().to_ascii_lowercase(), value.into());
        Self { entries }
    }

    /// Returns a new set with a bearer `Authorization` header.
    #[must_use]
    pub fn with_bearer(&self, token: &str) -> Self {
        self.with("authorization", format!("Bearer {token}"))
    }

    /// Looks up a header (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts to a reqwest header map.
    pub fn to_header_map(&self) -> Result<HeaderMap, FetchError> {
        let mut map = HeaderMap::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| FetchError::InvalidRequest(format!("header {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| FetchError::InvalidRequest(format!("header {name}: {e}")))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

// ============================================================================
// API Request
// ============================================================================

/// One request against an upstream service.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Service base URL, e.g. `https://api.trakt.tv/`.
    pub base_url: String,
    /// Path relative to the base URL.
    pub path: String,
    /// HTTP method.
    pub method: Method,
    /// Query parameters, in insertion order.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: HeaderSet,
    /// Optional JSON body.
    pub body: Option<Value>,
    /// Whether the request carries a user credential. A 401 on such a
    /// request means the authorization was revoked.
    pub authenticated: bool,
}

impl ApiRequest {
    /// Creates a request with the given method.
    pub fn new(method: Method, base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path: path.into(),
            method,
            query: Vec::new(),
            headers: HeaderSet::new(),
            body: None,
            authenticated: false,
        }
    }

    /// Creates a GET request.
    pub fn get(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(Method::GET, base_url, path)
    }

    /// Creates a POST request.
    pub fn post(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(Method::POST, base_url, path)
    }

    /// Sets (or replaces) a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set_query(name, value);
        self
    }

    /// Sets the headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderSet) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Marks the request as carrying a user credential.
    #[must_use]
    pub fn authenticated(mut self, authenticated: bool) -> Self {
        self.authenticated = authenticated;
        self
    }

    /// Sets (or replaces) a query parameter in place.
    pub fn set_query(&mut self, name: impl Into<String>, value: impl ToString) {
        let name = name.into();
        let value = value.to_string();
        match self.query.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.query.push((name, value)),
        }
    }

    /// Returns a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Sets the page number.
    pub fn set_page(&mut self, page: u32) {
        self.set_query(PAGE_PARAM, page);
    }

    /// Returns the page number, if set.
    pub fn page(&self) -> Option<u32> {
        self.query_param(PAGE_PARAM).and_then(|p| p.parse().ok())
    }

    /// Resolves the full URL including the query string.
    ///
    /// The path is always resolved below the base URL, whether or not the
    /// base ends in a slash.
    pub fn url(&self) -> Result<Url, FetchError> {
        let base = if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        };

        let base = Url::parse(&base)
            .map_err(|e| FetchError::InvalidRequest(format!("base URL {base}: {e}")))?;
        let mut url = base
            .join(self.path.trim_start_matches('/'))
            .map_err(|e| FetchError::InvalidRequest(format!("path {}: {e}", self.path)))?;

        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }

        Ok(url)
    }
}

// ============================================================================
// API Response
// ============================================================================

/// A buffered HTTP response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: String,
}

impl ApiResponse {
    /// Creates a response with the given status code and body.
    ///
    /// Unknown status codes map to 500.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Creates a 200 response with a JSON body.
    pub fn json_ok(body: &Value) -> Self {
        Self::new(200, body.to_string())
    }

    /// Adds a header. Invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Status code as a number.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Returns a header value as a string.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a header value parsed as an unsigned integer. Missing or
    /// malformed values yield `None`.
    pub fn header_u32(&self, name: &str) -> Option<u32> {
        self.header_str(name).and_then(|v| v.trim().parse().ok())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_set_is_copy_on_write() {
        let base = HeaderSet::new().with("trakt-api-key", "abc");
        let authed = base.with_bearer("tok");

        assert_eq!(base.get("Authorization"), None);
        assert_eq!(authed.get("authorization"), Some("Bearer tok"));
        assert_eq!(authed.get("TRAKT-API-KEY"), Some("abc"));
        assert_eq!(authed.len(), 2);
    }

    #[test]
    fn test_header_set_rejects_invalid_value() {
        let headers = HeaderSet::new().with("x-api-key", "bad\nvalue");
        assert!(matches!(
            headers.to_header_map(),
            Err(FetchError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_url_join_with_and_without_trailing_slash() {
        let a = ApiRequest::get("http://localhost:8989", "api/series");
        let b = ApiRequest::get("http://localhost:8989/", "/api/series");
        assert_eq!(a.url().unwrap().as_str(), "http://localhost:8989/api/series");
        assert_eq!(a.url().unwrap(), b.url().unwrap());

        let nested = ApiRequest::get("http://host/sonarr", "api/series");
        assert_eq!(nested.url().unwrap().as_str(), "http://host/sonarr/api/series");
    }

    #[test]
    fn test_set_page_replaces_in_place() {
        let mut req = ApiRequest::get("https://api.trakt.tv", "shows/trending")
            .with_query("extended", "full")
            .with_query("page", 1);
        req.set_page(3);

        assert_eq!(req.page(), Some(3));
        assert_eq!(req.query.len(), 2);
        assert_eq!(
            req.url().unwrap().as_str(),
            "https://api.trakt.tv/shows/trending?extended=full&page=3"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let req = ApiRequest::get("not a url", "x");
        assert!(matches!(req.url(), Err(FetchError::InvalidRequest(_))));
    }

    #[test]
    fn test_response_header_parsing() {
        let resp = ApiResponse::new(200, "[]")
            .with_header("X-Pagination-Page-Count", "7")
            .with_header("X-Other", "abc");

        assert_eq!(resp.header_u32("x-pagination-page-count"), Some(7));
        assert_eq!(resp.header_u32("x-other"), None);
        assert_eq!(resp.header_u32("missing"), None);
    }

    #[test]
    fn test_response_json() {
        let resp = ApiResponse::new(200, r#"{"version":"2.0"}"#);
        let value: Value = resp.json().unwrap();
        assert_eq!(value["version"], "2.0");

        let bad = ApiResponse::new(200, "<html>");
        assert!(bad.json::<Value>().is_err());
    }
}
