//! Protocol and timing constants for the embedding host.
//!
//! Constants are grouped by domain. Wire strings live here so the decode and
//! encode paths cannot drift apart.

use std::time::Duration;

// ============================================================================
// Timing
// ============================================================================

/// Default keep-alive period (10 minutes).
///
/// Must stay shorter than [`DEFAULT_SESSION_LIFETIME`]; the collaborator
/// recommends renewing every 10-15 minutes.
pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(600);

/// Documented lifetime of an idle collaborator session (55 minutes).
pub const DEFAULT_SESSION_LIFETIME: Duration = Duration::from_secs(55 * 60);

/// Lower bound of the recommended renewal window.
pub const RECOMMENDED_RENEWAL_MIN: Duration = Duration::from_secs(10 * 60);

/// Upper bound of the recommended renewal window.
pub const RECOMMENDED_RENEWAL_MAX: Duration = Duration::from_secs(15 * 60);

/// HTTP request timeout for collaborator calls.
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Host surfaces
// ============================================================================

/// Host route that posts a fresh assertion and establishes the embedded session.
pub const CONNECT_SESSION_URL: &str = "./connectVisierSession";

/// Host route rendering the "unavailable" error view.
pub const ERROR_VIEW_URL: &str = "./visierError";

/// Host sign-in entry point used after cleanup.
pub const SIGN_IN_URL: &str = "../";

/// Section selected when no deep link is present.
pub const DEFAULT_SECTION_ID: &str = "analytics";

/// Room selected inside the default section.
pub const DEFAULT_ROOM_ID: &str = "home";

// ============================================================================
// Deep links
// ============================================================================

/// Query parameters that redirect the landing target, in match order.
pub const DEEP_LINK_PARAMS: &[&str] = &["analysis_url", "user_preferences_url"];

// ============================================================================
// User-visible messages
// ============================================================================

/// Shown when the sections lookup fails or returns nothing usable.
pub const SECTIONS_UNAVAILABLE_MESSAGE: &str = "Could not retrieve application sections.";

/// Shown when the embedded application rejects the assertion.
pub const AUTHENTICATION_FAILED_MESSAGE: &str =
    "The user could not be logged into the embedded application.";

/// Shown when auto-provisioning of a new embedded user fails.
pub const AUTO_PROVISION_FAILED_MESSAGE: &str = "Auto-provisioning failed.";

/// Shown when the embedded application is down.
pub const APP_DOWN_MESSAGE: &str = "The embedded application is currently unavailable.";

/// Shown when the embedded application ejects the session.
pub const SESSION_EJECTED_MESSAGE: &str = "The embedded session was ended by the application.";
