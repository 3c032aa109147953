//! Upstream service types.

use serde::{Deserialize, Serialize};

// ============================================================================
// Service Kind
// ============================================================================

/// Supported upstream catalog services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// Sonarr, the library manager.
    Sonarr,
    /// Trakt, the recommendation and tracking service.
    Trakt,
}

impl ServiceKind {
    /// Returns the display name for this service.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Sonarr => "Sonarr",
            Self::Trakt => "Trakt",
        }
    }

    /// Returns all service kinds.
    pub fn all() -> &'static [ServiceKind] {
        &[Self::Sonarr, Self::Trakt]
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
