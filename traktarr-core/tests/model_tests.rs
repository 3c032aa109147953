//! Integration tests for core model types.

use traktarr_core::{Credential, Fetched, ServiceKind, WriteOutcome};

#[test]
fn test_credential_serialization_roundtrip() {
    let cred =
        Credential::new("alice", "access", "refresh", 7_776_000).with_issued_at(1_700_000_000);
    let json = serde_json::to_string(&cred).unwrap();
    assert!(json.contains("\"created_at\":1700000000"));

    let parsed: Credential = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, cred);
}

#[test]
fn test_expired_credential() {
    let cred = Credential::new("alice", "access", "refresh", 60).with_issued_at(0);
    assert!(cred.is_expired());
}

#[test]
fn test_fetched_found_accessors() {
    let fetched = Fetched::from_items(vec!["a", "b"]);
    assert!(fetched.is_found());
    assert_eq!(fetched.len(), 2);
    assert_eq!(fetched.found(), Some(vec!["a", "b"]));
}

#[test]
fn test_write_outcome_is_created() {
    assert!(WriteOutcome::Created.is_created());
    assert!(!WriteOutcome::Unavailable.is_created());
}

#[test]
fn test_service_display() {
    assert_eq!(ServiceKind::Sonarr.display_name(), "Sonarr");
}
