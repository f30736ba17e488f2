//! Navigation menu built from the application sections.
//!
//! The menu is two levels deep: one header per section, each owning its
//! rooms in collaborator order. Selecting an entry resolves to a
//! [`NavigationAction`] that depends on whether the surface has finished its
//! first load:
//!
//! ```text
//! NotLoaded ── select ──► Reload { url }          (full surface load)
//! Loaded    ── select ──► Post(Navigate { id })   (no reload)
//! ```

use serde::Serialize;

use super::context::EmbeddingStatus;
use crate::protocol::{ApplicationSection, ControlSignal};

/// Level of a menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Section header.
    Section,
    /// Room link.
    Room,
}

/// A clickable menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    /// Section or room id.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Target URL. Section headers may lack one.
    pub url: Option<String>,
    /// Header or room.
    pub kind: EntryKind,
}

/// A section header and its room links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavSection {
    /// The header entry.
    pub header: NavEntry,
    /// Room entries in collaborator order.
    pub rooms: Vec<NavEntry>,
}

/// The full navigation menu.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NavigationMenu {
    /// Sections in collaborator order.
    pub sections: Vec<NavSection>,
}

impl NavigationMenu {
    /// Project sections into a menu.
    pub fn build(sections: &[ApplicationSection]) -> Self {
        let sections = sections
            .iter()
            .map(|section| NavSection {
                header: NavEntry {
                    id: section.section_id.clone(),
                    label: section.section_name.clone(),
                    url: section.section_url.clone(),
                    kind: EntryKind::Section,
                },
                rooms: section
                    .available_rooms
                    .iter()
                    .map(|room| NavEntry {
                        id: room.room_id.clone(),
                        label: room.room_name.clone(),
                        url: Some(room.room_url.clone()),
                        kind: EntryKind::Room,
                    })
                    .collect(),
            })
            .collect();
        Self { sections }
    }

    /// All entries, headers first within each section.
    pub fn entries(&self) -> impl Iterator<Item = &NavEntry> {
        self.sections
            .iter()
            .flat_map(|s| std::iter::once(&s.header).chain(s.rooms.iter()))
    }

    /// Total number of entries (headers and rooms).
    pub fn entry_count(&self) -> usize {
        self.entries().count()
    }

    /// First entry with the given id.
    ///
    /// Ids are not guaranteed unique across sections; the first match in
    /// menu order wins.
    pub fn find(&self, id: &str) -> Option<&NavEntry> {
        self.entries().find(|e| e.id == id)
    }
}

/// What selecting a menu entry does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationAction {
    /// Load the surface at this URL.
    Reload {
        /// Target URL.
        url: String,
    },
    /// Post this signal to the loaded surface.
    Post(ControlSignal),
}

/// Resolve the action for selecting `entry` given the embedding status.
///
/// Returns `None` when the surface is not loaded yet and the entry has no URL.
pub fn navigation_action(status: EmbeddingStatus, entry: &NavEntry) -> Option<NavigationAction> {
    match status {
        EmbeddingStatus::NotLoaded => entry
            .url
            .clone()
            .map(|url| NavigationAction::Reload { url }),
        EmbeddingStatus::Loaded => Some(NavigationAction::Post(ControlSignal::Navigate {
            target_room: entry.id.clone(),
        })),
    }
}
