//! Text output formatting with colors.

use chrono::DateTime;
use serde_json::Value;
use traktarr_core::{Credential, Fetched, WriteOutcome};
use traktarr_providers::DeviceAuthOutcome;
use traktarr_providers::trakt::DeviceAuthSession;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

// ============================================================================
// Media Entry
// ============================================================================

/// Display fields of one catalog record.
///
/// Trakt wraps records as `{"show": {...}}` or `{"movie": {...}}`; Sonarr
/// records are bare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    pub title: String,
    pub year: Option<u64>,
    pub id: Option<String>,
}

impl MediaEntry {
    /// Reads the entry from `record`, looking under `wrapper` first.
    pub fn from_record(record: &Value, wrapper: &str) -> Self {
        let media = record.get(wrapper).unwrap_or(record);

        let title = media
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("<untitled>")
            .to_string();
        let year = media.get("year").and_then(Value::as_u64);

        let id = media
            .get("ids")
            .and_then(|ids| {
                ["tvdb", "tmdb", "trakt"].iter().find_map(|key| {
                    ids.get(*key)
                        .and_then(Value::as_u64)
                        .map(|id| format!("{key}:{id}"))
                })
            })
            .or_else(|| {
                media
                    .get("tvdbId")
                    .and_then(Value::as_u64)
                    .map(|id| format!("tvdb:{id}"))
            });

        Self { title, year, id }
    }
}

// ============================================================================
// Text Formatter
// ============================================================================

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats a fetched list. `wrapper` is the record key of the media
    /// (`show` or `movie`); `heading` names the list.
    pub fn format_list(
        &self,
        heading: &str,
        wrapper: &str,
        fetched: &Fetched<Vec<Value>>,
    ) -> String {
        match fetched {
            Fetched::Found(items) => {
                let mut lines = vec![format!("{} ({})", self.bold(heading), items.len())];
                lines.extend(
                    items
                        .iter()
                        .map(|record| self.format_entry(&MediaEntry::from_record(record, wrapper))),
                );
                lines.join("\n")
            }
            Fetched::Empty => format!("{}: {}", self.bold(heading), self.dim("no items")),
            Fetched::Unavailable => format!(
                "{}: {}",
                self.bold(heading),
                self.red("unavailable, try again later")
            ),
        }
    }

    /// Formats one entry line.
    pub fn format_entry(&self, entry: &MediaEntry) -> String {
        let mut line = format!("  {}", entry.title);
        if let Some(year) = entry.year {
            line.push_str(&format!(" ({year})"));
        }
        if let Some(id) = &entry.id {
            line.push_str(&format!("  {}", self.dim(id)));
        }
        line
    }

    /// Formats one key check.
    pub fn format_validation(&self, service: &str, configured: bool, valid: bool) -> String {
        let status = match (configured, valid) {
            (false, _) => self.dim("− not configured"),
            (true, true) => self.green("✓ valid"),
            (true, false) => self.red("✗ invalid"),
        };
        format!("{service:<10} {status}")
    }

    /// Formats the operator instructions of the device flow.
    pub fn format_auth_prompt(&self, session: &DeviceAuthSession) -> String {
        format!(
            "Go to {} and enter the code {}\nWaiting up to {} seconds for approval...",
            self.cyan(&session.verification_url),
            self.bold(&session.user_code),
            session.expires_in.as_secs()
        )
    }

    /// Formats the end of the device flow.
    pub fn format_auth_outcome(&self, outcome: &DeviceAuthOutcome) -> String {
        if outcome.is_success() {
            self.green(&capitalize(&outcome.reason()))
        } else {
            self.red(&capitalize(&outcome.reason()))
        }
    }

    /// Formats a stored credential.
    pub fn format_credential(&self, credential: &Credential) -> String {
        let expires = DateTime::from_timestamp(credential.expires_at(), 0)
            .map_or_else(
                || "unknown".to_string(),
                |at| at.format("%Y-%m-%d %H:%M UTC").to_string(),
            );
        let state = if credential.is_expired() {
            self.yellow("expired")
        } else {
            self.green("valid")
        };
        format!("  {:<16} {state}, expires {expires}", credential.owner)
    }

    /// Formats the result of adding a series.
    pub fn format_write(&self, title: &str, outcome: &WriteOutcome) -> String {
        match outcome {
            WriteOutcome::Created => format!("{} {title}", self.green("Added")),
            WriteOutcome::Rejected(reason) => {
                format!("{} {title}: {reason}", self.red("Rejected"))
            }
            WriteOutcome::Unavailable => format!(
                "{} {title}: Sonarr is unavailable, try again later",
                self.yellow("Not added")
            ),
        }
    }

    /// Formats a heading line.
    pub fn format_heading(&self, heading: &str) -> String {
        format!("{}\n{}", self.bold(heading), "─".repeat(40))
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
