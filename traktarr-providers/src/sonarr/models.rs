//! Sonarr wire types.

use serde::{Deserialize, Serialize};

/// A series to add to the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSeries {
    /// TheTVDB id.
    pub tvdb_id: u64,
    /// Title.
    pub title: String,
    /// URL slug.
    pub title_slug: String,
    /// Quality profile id, see [`super::SonarrClient::profile_id`].
    pub quality_profile_id: u64,
    /// Root folder the series is stored under.
    pub root_folder: String,
    /// Whether Sonarr should search for missing episodes right away.
    pub search_missing: bool,
}

impl NewSeries {
    /// Request body for `POST api/series`.
    pub fn payload(&self) -> SeriesPayload<'_> {
        SeriesPayload {
            tvdb_id: self.tvdb_id,
            title: &self.title,
            title_slug: &self.title_slug,
            quality_profile_id: self.quality_profile_id,
            images: Vec::new(),
            seasons: Vec::new(),
            season_folder: true,
            monitored: true,
            root_folder_path: &self.root_folder,
            add_options: AddOptions {
                ignore_episodes_with_files: false,
                ignore_episodes_without_files: false,
                search_for_missing_episodes: self.search_missing,
            },
        }
    }
}

/// Body of `POST api/series`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPayload<'a> {
    tvdb_id: u64,
    title: &'a str,
    title_slug: &'a str,
    quality_profile_id: u64,
    images: Vec<serde_json::Value>,
    seasons: Vec<serde_json::Value>,
    season_folder: bool,
    monitored: bool,
    root_folder_path: &'a str,
    add_options: AddOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddOptions {
    ignore_episodes_with_files: bool,
    ignore_episodes_without_files: bool,
    search_for_missing_episodes: bool,
}

/// Entry of `GET api/profile`.
#[derive(Debug, Clone, Deserialize)]
pub struct QualityProfile {
    /// Profile id.
    pub id: u64,
    /// Profile name.
    pub name: String,
}

/// Body of a `201` answer to `POST api/series`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSeries {
    /// TheTVDB id of the created series.
    pub tvdb_id: u64,
}

/// Body of a rejected write.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Reason given by Sonarr.
    pub error_message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_shape() {
        let series = NewSeries {
            tvdb_id: 81189,
            title: "Breaking Bad".to_string(),
            title_slug: "breaking-bad".to_string(),
            quality_profile_id: 1,
            root_folder: "/tv/".to_string(),
            search_missing: true,
        };

        let value = serde_json::to_value(series.payload()).unwrap();
        assert_eq!(
            value,
            json!({
                "tvdbId": 81189,
                "title": "Breaking Bad",
                "titleSlug": "breaking-bad",
                "qualityProfileId": 1,
                "images": [],
                "seasons": [],
                "seasonFolder": true,
                "monitored": true,
                "rootFolderPath": "/tv/",
                "addOptions": {
                    "ignoreEpisodesWithFiles": false,
                    "ignoreEpisodesWithoutFiles": false,
                    "searchForMissingEpisodes": true
                }
            })
        );
    }
}
