//! Tagged results for catalog operations.
//!
//! A remote read either produced data, confirmed that there is none, or gave
//! up after transient failures. Keeping those apart lets callers retry only
//! the last case. Fatal conditions are not represented here; they travel as
//! errors.

use serde::{Deserialize, Serialize};

// ============================================================================
// Fetched
// ============================================================================

/// Result of a read operation after retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Fetched<T> {
    /// The upstream returned data.
    Found(T),
    /// Every request succeeded but the upstream returned nothing.
    Empty,
    /// Transient failures exhausted the retry budget ("no result").
    Unavailable,
}

impl<T> Fetched<T> {
    /// Returns true if data was found.
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Returns true if the operation gave up after transient failures.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    /// Returns the found value, if any.
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Empty | Self::Unavailable => None,
        }
    }

    /// Returns a reference to the found value, if any.
    pub fn as_found(&self) -> Option<&T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Empty | Self::Unavailable => None,
        }
    }

    /// Maps the found value.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Fetched<U> {
        match self {
            Self::Found(value) => Fetched::Found(f(value)),
            Self::Empty => Fetched::Empty,
            Self::Unavailable => Fetched::Unavailable,
        }
    }
}

impl<T> Fetched<Vec<T>> {
    /// Builds `Found` for a non-empty list and `Empty` otherwise.
    pub fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            Self::Empty
        } else {
            Self::Found(items)
        }
    }

    /// Number of items found (zero for `Empty` and `Unavailable`).
    pub fn len(&self) -> usize {
        self.as_found().map_or(0, Vec::len)
    }

    /// Returns true if no items were found.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Write Outcome
// ============================================================================

/// Result of a write operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum WriteOutcome {
    /// The upstream confirmed the write.
    Created,
    /// The upstream explicitly rejected the write. Not retried.
    Rejected(String),
    /// Transient failures exhausted the retry budget.
    Unavailable,
}

impl WriteOutcome {
    /// Returns true if the write was confirmed.
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created)
    }

    /// Confirmed result as a boolean, `None` when no answer was obtained.
    pub fn confirmed(&self) -> Option<bool> {
        match self {
            Self::Created => Some(true),
            Self::Rejected(_) => Some(false),
            Self::Unavailable => None,
        }
    }
}
