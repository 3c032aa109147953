//! JSON output formatting.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use traktarr_core::{Fetched, WriteOutcome};
use traktarr_providers::DeviceAuthOutcome;

use super::status_label;

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for a fetched list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOutput<'a> {
    pub source: &'a str,
    pub list: &'a str,
    pub status: &'static str,
    pub count: usize,
    pub items: &'a [Value],
}

impl<'a> ListOutput<'a> {
    /// Builds the output for `fetched`.
    pub fn new(source: &'a str, list: &'a str, fetched: &'a Fetched<Vec<Value>>) -> Self {
        let items = fetched.as_found().map_or(&[][..], Vec::as_slice);
        Self {
            source,
            list,
            status: status_label(fetched),
            count: items.len(),
            items,
        }
    }
}

/// JSON output for one key check.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutput {
    pub service: String,
    pub configured: bool,
    pub valid: bool,
}

/// JSON output for the device flow.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthOutput {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub message: String,
}

impl From<&DeviceAuthOutcome> for AuthOutput {
    fn from(outcome: &DeviceAuthOutcome) -> Self {
        let (label, owner) = match outcome {
            DeviceAuthOutcome::Succeeded { owner } => ("succeeded", Some(owner.clone())),
            DeviceAuthOutcome::Denied => ("denied", None),
            DeviceAuthOutcome::Expired => ("expired", None),
            DeviceAuthOutcome::Conflict => ("conflict", None),
            DeviceAuthOutcome::AbortedUnknown(_) => ("aborted", None),
        };
        Self {
            outcome: label,
            owner,
            message: outcome.reason(),
        }
    }
}

/// JSON output for a write.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutput {
    pub tvdb_id: u64,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl WriteOutput {
    /// Builds the output for `outcome`.
    pub fn new(tvdb_id: u64, outcome: &WriteOutcome) -> Self {
        let (status, reason) = match outcome {
            WriteOutcome::Created => ("created", None),
            WriteOutcome::Rejected(reason) => ("rejected", Some(reason.clone())),
            WriteOutcome::Unavailable => ("unavailable", None),
        };
        Self {
            tvdb_id,
            status,
            reason,
        }
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }
}
