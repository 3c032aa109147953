//! Sonarr library client.

use serde_json::Value;
use tracing::{debug, error, instrument};
use traktarr_core::{Fetched, ServiceKind, WriteOutcome};
use traktarr_fetch::{ApiResponse, FetchContext, FetchError, HeaderSet};

use super::models::{CreatedSeries, ErrorBody, NewSeries, QualityProfile};
use crate::catalog::CatalogClient;
use crate::endpoint::Endpoint;

/// Server status, used to validate the API key.
pub const SYSTEM_STATUS: Endpoint = Endpoint::single("validate_api_key", "api/system/status");
/// Every series in the library.
pub const SERIES: Endpoint = Endpoint::single("series", "api/series");
/// Quality profiles.
pub const PROFILES: Endpoint = Endpoint::single("profile_id", "api/profile");
/// Add a series.
pub const ADD_SERIES: Endpoint = Endpoint::write("add_series", "api/series");

/// Interpretation of an add-series answer before retry handling.
enum AddAnswer {
    Created,
    Rejected(String),
}

// ============================================================================
// Sonarr Client
// ============================================================================

/// Client for the Sonarr v2 API.
#[derive(Debug, Clone)]
pub struct SonarrClient {
    catalog: CatalogClient,
}

impl SonarrClient {
    /// Creates a client for the server at `url`.
    pub fn new(ctx: FetchContext, url: impl Into<String>, api_key: &str) -> Self {
        let headers = HeaderSet::new()
            .with("content-type", "application/json")
            .with("x-api-key", api_key);
        Self {
            catalog: CatalogClient::new(ServiceKind::Sonarr, ctx, url, headers),
        }
    }

    /// Server URL.
    pub fn url(&self) -> &str {
        self.catalog.base_url()
    }

    /// Checks the API key: true iff the status call answers 200 with a
    /// `version` field. Never raises.
    #[instrument(skip(self))]
    pub async fn validate_api_key(&self) -> bool {
        let check = async {
            let request = self.catalog.request(&SYSTEM_STATUS, &[])?;
            let response = self
                .catalog
                .send(SYSTEM_STATUS.name, &request, self.catalog.base_headers())
                .await?;
            if response.status_code() != 200 {
                return Ok(false);
            }
            let body: Value = response.json()?;
            Ok::<_, FetchError>(body.get("version").is_some())
        };
        self.catalog.probe(SYSTEM_STATUS.name, check).await
    }

    /// Every series in the library.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`].
    pub async fn series(&self) -> Result<Fetched<Vec<Value>>, FetchError> {
        let request = self.catalog.request(&SERIES, &[])?;
        let series = self
            .catalog
            .fetch_records(&SERIES, &request, self.catalog.base_headers())
            .await?;
        debug!(count = series.len(), "Found series");
        Ok(series)
    }

    /// Id of the quality profile named `name` (case-insensitive).
    ///
    /// `Empty` means the profiles were listed and none matched.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`].
    #[instrument(skip(self))]
    pub async fn profile_id(&self, name: &str) -> Result<Fetched<u64>, FetchError> {
        let request = self.catalog.request(&PROFILES, &[])?;
        let wanted = name.to_lowercase();
        let found = self
            .catalog
            .fetch_single(PROFILES.name, &request, self.catalog.base_headers(), |response| {
                expect_status(response, 200)?;
                let profiles: Vec<QualityProfile> = response.json()?;
                Ok(profiles
                    .into_iter()
                    .find(|profile| profile.name.to_lowercase() == wanted)
                    .map(|profile| profile.id))
            })
            .await?;

        Ok(match found {
            Some(Some(id)) => {
                debug!(id, "Found profile");
                Fetched::Found(id)
            }
            Some(None) => {
                debug!("No profile matched");
                Fetched::Empty
            }
            None => Fetched::Unavailable,
        })
    }

    /// Adds a series.
    ///
    /// `Created` requires a 201 echoing the same `tvdbId`. A 401 carrying an
    /// `errorMessage` is a rejection and is not retried; everything else is
    /// retried and ends as `Unavailable`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`].
    #[instrument(skip(self, series), fields(tvdb_id = series.tvdb_id, title = %series.title))]
    pub async fn add_series(&self, series: &NewSeries) -> Result<WriteOutcome, FetchError> {
        let body = serde_json::to_value(series.payload())?;
        let request = self.catalog.request(&ADD_SERIES, &[])?.with_body(body);

        let answer = self
            .catalog
            .fetch_single(ADD_SERIES.name, &request, self.catalog.base_headers(), |response| {
                interpret_add(response, series.tvdb_id)
            })
            .await?;

        Ok(match answer {
            Some(AddAnswer::Created) => {
                debug!("Series added");
                WriteOutcome::Created
            }
            Some(AddAnswer::Rejected(reason)) => {
                error!(reason = %reason, "Sonarr rejected the series");
                WriteOutcome::Rejected(reason)
            }
            None => WriteOutcome::Unavailable,
        })
    }
}

fn expect_status(response: &ApiResponse, status: u16) -> Result<(), FetchError> {
    if response.status_code() == status {
        Ok(())
    } else {
        Err(FetchError::unexpected_status(
            response.status_code(),
            &response.body,
        ))
    }
}

fn interpret_add(response: &ApiResponse, tvdb_id: u64) -> Result<AddAnswer, FetchError> {
    match response.status_code() {
        201 => {
            let created: CreatedSeries = response.json()?;
            if created.tvdb_id == tvdb_id {
                Ok(AddAnswer::Created)
            } else {
                Ok(AddAnswer::Rejected(format!(
                    "created tvdbId {} does not match {tvdb_id}",
                    created.tvdb_id
                )))
            }
        }
        401 => match response.json::<ErrorBody>() {
            Ok(body) => Ok(AddAnswer::Rejected(body.error_message)),
            Err(_) => Err(FetchError::unexpected_status(401, &response.body)),
        },
        status => Err(FetchError::unexpected_status(status, &response.body)),
    }
}
