//! Trakt wire types and client settings.

use serde::{Deserialize, Serialize};

/// Trakt API base URL.
pub const TRAKT_API_BASE: &str = "https://api.trakt.tv";

/// Trakt API version header value.
pub const TRAKT_API_VERSION: &str = "2";

/// Default page size.
pub const DEFAULT_LIMIT: u32 = 1000;

// ============================================================================
// Settings
// ============================================================================

/// Application credentials and query defaults for the Trakt client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraktSettings {
    /// OAuth client id, also sent as `trakt-api-key`.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// API base URL.
    pub base_url: String,
    /// Page size sent as `limit`.
    pub limit: u32,
    /// Languages sent as a comma-joined `languages` parameter. Empty omits
    /// the parameter.
    pub languages: Vec<String>,
}

impl TraktSettings {
    /// Creates settings for the public API.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            base_url: TRAKT_API_BASE.to_string(),
            limit: DEFAULT_LIMIT,
            languages: vec!["en".to_string()],
        }
    }

    /// Overrides the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the page size.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Overrides the languages.
    #[must_use]
    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = languages;
        self
    }
}

// ============================================================================
// Wire Types
// ============================================================================

/// Response of `POST oauth/device/code`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCodeResponse {
    /// Code the client polls with.
    pub device_code: String,
    /// Code the operator enters.
    pub user_code: String,
    /// Page the operator visits.
    pub verification_url: String,
    /// Seconds until the codes expire.
    pub expires_in: u64,
    /// Polling interval in seconds.
    pub interval: u64,
}

/// Response of `GET users/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct TraktUser {
    /// Account name.
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device_code_response() {
        let json = r#"{
            "device_code": "d9c126a7706328d808914cfd1e40274b6e009f684b1aca271b9b3f90b3630d64",
            "user_code": "5055CC52",
            "verification_url": "https://trakt.tv/activate",
            "expires_in": 600,
            "interval": 5
        }"#;

        let code: DeviceCodeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(code.user_code, "5055CC52");
        assert_eq!(code.verification_url, "https://trakt.tv/activate");
        assert_eq!(code.expires_in, 600);
        assert_eq!(code.interval, 5);
    }

    #[test]
    fn test_settings_defaults() {
        let settings = TraktSettings::new("id", "secret");
        assert_eq!(settings.base_url, TRAKT_API_BASE);
        assert_eq!(settings.limit, 1000);
        assert_eq!(settings.languages, vec!["en".to_string()]);
    }
}
