//! OAuth credential types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Credential
// ============================================================================

/// An OAuth access token issued to one owner.
///
/// The serialized form matches the upstream token response
/// (`access_token`, `refresh_token`, `created_at`, `expires_in`, ...), so a
/// token response can be stored as-is once the owner is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Owner (upstream username) this token belongs to.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner: String,

    /// Bearer access token.
    pub access_token: String,

    /// Refresh token.
    #[serde(default)]
    pub refresh_token: String,

    /// Issue time as a unix timestamp in seconds.
    #[serde(rename = "created_at")]
    pub issued_at: i64,

    /// Lifetime in seconds, counted from `issued_at`.
    pub expires_in: i64,

    /// Token type (usually "bearer").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Scopes granted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl Credential {
    /// Creates a credential issued now.
    pub fn new(
        owner: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: i64,
    ) -> Self {
        Self {
            owner: owner.into(),
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            issued_at: Utc::now().timestamp(),
            expires_in,
            token_type: None,
            scope: None,
        }
    }

    /// Sets the issue timestamp.
    pub fn with_issued_at(mut self, issued_at: i64) -> Self {
        self.issued_at = issued_at;
        self
    }

    /// Returns a copy bound to the given owner.
    pub fn for_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Unix timestamp after which the token is expired.
    pub fn expires_at(&self) -> i64 {
        self.issued_at.saturating_add(self.expires_in)
    }

    /// Returns true if the token was expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at() < now.timestamp()
    }

    /// Returns true if the token is expired right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_expiry_boundary() {
        let cred = Credential::new("alice", "tok", "ref", 100).with_issued_at(1_000);
        assert_eq!(cred.expires_at(), 1_100);

        let at_expiry = Utc.timestamp_opt(1_100, 0).unwrap();
        assert!(!cred.is_expired_at(at_expiry));

        let after = Utc.timestamp_opt(1_101, 0).unwrap();
        assert!(cred.is_expired_at(after));
    }

    #[test]
    fn test_fresh_credential_not_expired() {
        let cred = Credential::new("alice", "tok", "ref", 7_776_000);
        assert!(!cred.is_expired());
    }

    #[test]
    fn test_parse_token_response_shape() {
        let json = r#"{
            "access_token": "dbaf9757982a9e738f05d249b7b5b4a266b3a139049317c4909f2f263572c781",
            "token_type": "bearer",
            "expires_in": 7200,
            "refresh_token": "76ba4c5c75c96f6087f58a4de10be6c00b29ea1ddc3b2022ee2016d1363e3a7c",
            "scope": "public",
            "created_at": 1487889741
        }"#;

        let cred: Credential = serde_json::from_str(json).unwrap();
        assert!(cred.owner.is_empty());
        assert_eq!(cred.issued_at, 1_487_889_741);
        assert_eq!(cred.expires_in, 7200);
        assert_eq!(cred.scope.as_deref(), Some("public"));
    }
}
