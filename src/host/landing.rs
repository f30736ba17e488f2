//! Landing target resolution.
//!
//! A deep link on the host page (`analysis_url`, then `user_preferences_url`)
//! wins; its decoded value is appended to the session's shared-link prefix.
//! Otherwise the default room of the default section is used, falling back
//! to the first section and its first room.

use reqwest::Url;

use crate::constants::DEEP_LINK_PARAMS;
use crate::protocol::ApplicationSection;

/// Base used to parse a bare query string (`?a=b`) or a relative page path.
const PAGE_BASE: &str = "http://host.invalid/";

/// Read the first deep-link parameter from the host page URL, decoded.
///
/// Accepts an absolute URL, a relative path with a query, or a bare query.
pub fn deep_link_value(page_url: &str) -> Option<String> {
    let base = Url::parse(PAGE_BASE).ok()?;
    let url = Url::parse(page_url).or_else(|_| base.join(page_url)).ok()?;

    DEEP_LINK_PARAMS.iter().find_map(|param| {
        url.query_pairs()
            .find(|(key, value)| key == *param && !value.is_empty())
            .map(|(_, value)| value.into_owned())
    })
}

/// Deep-link landing target: shared-link prefix plus the decoded value.
pub fn deep_link_target(page_url: &str, shared_link_prefix: &str) -> Option<String> {
    deep_link_value(page_url).map(|value| format!("{shared_link_prefix}{value}"))
}

/// Default landing target from the sections list.
pub fn default_landing(
    sections: &[ApplicationSection],
    default_section_id: &str,
    default_room_id: &str,
) -> Option<String> {
    let section = sections
        .iter()
        .find(|s| s.section_id == default_section_id)
        .or_else(|| sections.first())?;

    section
        .available_rooms
        .iter()
        .find(|r| r.room_id == default_room_id)
        .or_else(|| section.available_rooms.first())
        .map(|r| r.room_url.clone())
        .or_else(|| section.section_url.clone())
}
