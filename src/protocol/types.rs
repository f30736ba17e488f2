//! Data types issued by the embedded collaborator.
//!
//! - [`SessionEndpoints`] - URLs delivered with the session-established signal
//! - [`ApplicationSection`] / [`Room`] - navigation targets from the sections query
//! - [`SectionsResponse`] - body of the sections query
//!
//! Field names follow the collaborator's camelCase wire format.

// Rust guideline compliant 2026-01

use serde::{Deserialize, Serialize};

/// Endpoints issued after a successful authentication.
///
/// Immutable once received; held for the lifetime of one embedding session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEndpoints {
    /// Credentialed URL listing the sections available to the user.
    pub application_sections_url: String,
    /// URL that ends the collaborator session.
    pub log_off_url: String,
    /// Prefix turning a deep-link value into a surface URL.
    pub shared_link_prefix: String,
}

/// A top-level application section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSection {
    /// Stable section identifier (e.g. `analytics`).
    pub section_id: String,
    /// Display name.
    pub section_name: String,
    /// Root URL of the section. May be missing in degraded responses.
    #[serde(default)]
    pub section_url: Option<String>,
    /// Rooms in collaborator order.
    #[serde(default)]
    pub available_rooms: Vec<Room>,
}

/// A room (subsection) inside an [`ApplicationSection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Stable room identifier (e.g. `home`).
    pub room_id: String,
    /// Display name.
    pub room_name: String,
    /// URL loading this room in the surface.
    pub room_url: String,
}

/// Body of the sections query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionsResponse {
    /// Sections in collaborator order. Absent is treated like empty.
    #[serde(default)]
    pub available_sections: Vec<ApplicationSection>,
}

impl SectionsResponse {
    /// Returns the sections when the response is usable for navigation.
    ///
    /// Usable means non-empty with a URL on the first section.
    pub fn into_usable(self) -> Option<Vec<ApplicationSection>> {
        let first_has_url = self
            .available_sections
            .first()
            .and_then(|s| s.section_url.as_deref())
            .is_some_and(|url| !url.is_empty());
        first_has_url.then_some(self.available_sections)
    }
}
