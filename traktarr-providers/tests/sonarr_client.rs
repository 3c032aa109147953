//! HTTP-level tests for the Sonarr client.

use std::sync::Arc;

use serde_json::json;
use traktarr_core::{Fetched, WriteOutcome};
use traktarr_fetch::{FetchContext, FetchSettings, HttpClient};
use traktarr_providers::{NewSeries, SonarrClient};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> SonarrClient {
    let ctx = FetchContext::builder()
        .executor(Arc::new(HttpClient::new()))
        .settings(FetchSettings::immediate())
        .build()
        .unwrap();
    SonarrClient::new(ctx, server.uri(), "sonarr-key")
}

fn breaking_bad() -> NewSeries {
    NewSeries {
        tvdb_id: 81189,
        title: "Breaking Bad".to_string(),
        title_slug: "breaking-bad".to_string(),
        quality_profile_id: 4,
        root_folder: "/tv/".to_string(),
        search_missing: false,
    }
}

// ============================================================================
// Key Validation
// ============================================================================

#[tokio::test]
async fn test_validate_api_key_requires_version() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/system/status"))
        .and(header("x-api-key", "sonarr-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "2.0.0.5344"})))
        .mount(&server)
        .await;

    assert!(client(&server).validate_api_key().await);
}

#[tokio::test]
async fn test_validate_api_key_without_version_is_false() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/system/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"appName": "Sonarr"})))
        .mount(&server)
        .await;

    assert!(!client(&server).validate_api_key().await);
}

#[tokio::test]
async fn test_validate_api_key_unreachable_is_false() {
    let server = MockServer::start().await;
    let sonarr = client(&server);
    drop(server);

    assert!(!sonarr.validate_api_key().await);
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_series() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/series"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"title": "Breaking Bad", "tvdbId": 81189},
            {"title": "The Wire", "tvdbId": 79126}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let series = client(&server).series().await.unwrap();
    assert_eq!(series.len(), 2);
}

#[tokio::test]
async fn test_empty_library_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/series"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    assert_eq!(client(&server).series().await.unwrap(), Fetched::Empty);
}

#[tokio::test]
async fn test_series_unavailable_after_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/series"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&server)
        .await;

    assert_eq!(client(&server).series().await.unwrap(), Fetched::Unavailable);
}

#[tokio::test]
async fn test_profile_id_matches_case_insensitively() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Any"},
            {"id": 4, "name": "HD-1080p"}
        ])))
        .mount(&server)
        .await;

    let sonarr = client(&server);
    assert_eq!(sonarr.profile_id("hd-1080P").await.unwrap(), Fetched::Found(4));
    assert_eq!(sonarr.profile_id("Ultra-HD").await.unwrap(), Fetched::Empty);
}

// ============================================================================
// Add Series
// ============================================================================

#[tokio::test]
async fn test_add_series_created() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/series"))
        .and(body_partial_json(json!({
            "tvdbId": 81189,
            "qualityProfileId": 4,
            "rootFolderPath": "/tv/",
            "addOptions": {"searchForMissingEpisodes": false}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"tvdbId": 81189, "id": 12})))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server).add_series(&breaking_bad()).await.unwrap();
    assert_eq!(outcome, WriteOutcome::Created);
}

#[tokio::test]
async fn test_add_series_rejection_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/series"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"errorMessage": "This series has already been added"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server).add_series(&breaking_bad()).await.unwrap();
    assert_eq!(
        outcome,
        WriteOutcome::Rejected("This series has already been added".to_string())
    );
}

#[tokio::test]
async fn test_add_series_mismatched_id_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/series"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"tvdbId": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server).add_series(&breaking_bad()).await.unwrap();
    assert!(matches!(outcome, WriteOutcome::Rejected(reason) if reason.contains("81189")));
}

#[tokio::test]
async fn test_add_series_server_error_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/series"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let outcome = client(&server).add_series(&breaking_bad()).await.unwrap();
    assert_eq!(outcome, WriteOutcome::Unavailable);
}

#[tokio::test]
async fn test_add_series_unreachable_is_unavailable() {
    let server = MockServer::start().await;
    let sonarr = client(&server);
    drop(server);

    let outcome = sonarr.add_series(&breaking_bad()).await.unwrap();
    assert_eq!(outcome, WriteOutcome::Unavailable);
}
