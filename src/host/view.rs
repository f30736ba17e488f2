//! Host page port.
//!
//! [`EmbeddingHost`] is everything the controller does to the host page:
//! point the surface somewhere, toggle the loading placeholder, post control
//! signals, show notices, render or hide navigation, and leave the page.
//! Browser bindings implement it against real frames; [`RecordingHost`]
//! records and logs every call for headless runs and tests.

use serde::Serialize;

use super::navigation::NavigationMenu;
use crate::protocol::ControlSignal;

/// Side effects the controller performs on the host page.
pub trait EmbeddingHost {
    /// Point the embedded surface at `url`.
    fn load_surface(&mut self, url: &str);
    /// Reload the surface at its current URL.
    fn reload_surface(&mut self);
    /// Make the surface visible.
    fn reveal_surface(&mut self);
    /// Show or hide the loading placeholder.
    fn set_loading_indicator(&mut self, visible: bool);
    /// Post a control signal to the surface.
    fn post_control(&mut self, signal: &ControlSignal);
    /// Show a blocking notice to the user.
    fn show_notice(&mut self, message: &str);
    /// Render the navigation menu.
    fn render_menu(&mut self, menu: &NavigationMenu);
    /// Hide the navigation menu.
    fn hide_navigation(&mut self);
    /// Navigate the host window away (e.g. back to sign-in).
    fn navigate_host(&mut self, url: &str);
}

/// One recorded host call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ViewAction {
    /// Surface pointed at a URL.
    LoadSurface {
        /// Target URL.
        url: String,
    },
    /// Surface reloaded in place.
    ReloadSurface,
    /// Surface made visible.
    RevealSurface,
    /// Loading placeholder toggled.
    LoadingIndicator {
        /// New visibility.
        visible: bool,
    },
    /// Control signal posted (wire form).
    PostControl {
        /// JSON-string envelope.
        message: String,
    },
    /// Blocking notice shown.
    Notice {
        /// Notice text.
        message: String,
    },
    /// Menu rendered.
    RenderMenu {
        /// Number of entries rendered.
        entries: usize,
    },
    /// Navigation hidden.
    HideNavigation,
    /// Host window left.
    NavigateHost {
        /// Destination.
        url: String,
    },
}

/// Host that records every call and mirrors it to the log.
#[derive(Debug, Default)]
pub struct RecordingHost {
    actions: Vec<ViewAction>,
}

impl RecordingHost {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    pub fn actions(&self) -> &[ViewAction] {
        &self.actions
    }

    /// Drain recorded actions.
    pub fn take_actions(&mut self) -> Vec<ViewAction> {
        std::mem::take(&mut self.actions)
    }

    /// Wire messages posted to the surface, in order.
    pub fn posted(&self) -> Vec<&str> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                ViewAction::PostControl { message } => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    /// URLs the surface was pointed at, in order.
    pub fn loaded_urls(&self) -> Vec<&str> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                ViewAction::LoadSurface { url } => Some(url.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Notices shown, in order.
    pub fn notices(&self) -> Vec<&str> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                ViewAction::Notice { message } => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of menu renders.
    pub fn menu_renders(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, ViewAction::RenderMenu { .. }))
            .count()
    }

    fn record(&mut self, action: ViewAction) {
        log::debug!("Host action: {:?}", action);
        self.actions.push(action);
    }
}

impl EmbeddingHost for RecordingHost {
    fn load_surface(&mut self, url: &str) {
        self.record(ViewAction::LoadSurface {
            url: url.to_string(),
        });
    }

    fn reload_surface(&mut self) {
        self.record(ViewAction::ReloadSurface);
    }

    fn reveal_surface(&mut self) {
        self.record(ViewAction::RevealSurface);
    }

    fn set_loading_indicator(&mut self, visible: bool) {
        self.record(ViewAction::LoadingIndicator { visible });
    }

    fn post_control(&mut self, signal: &ControlSignal) {
        self.record(ViewAction::PostControl {
            message: signal.to_wire(),
        });
    }

    fn show_notice(&mut self, message: &str) {
        self.record(ViewAction::Notice {
            message: message.to_string(),
        });
    }

    fn render_menu(&mut self, menu: &NavigationMenu) {
        self.record(ViewAction::RenderMenu {
            entries: menu.entry_count(),
        });
    }

    fn hide_navigation(&mut self) {
        self.record(ViewAction::HideNavigation);
    }

    fn navigate_host(&mut self, url: &str) {
        self.record(ViewAction::NavigateHost {
            url: url.to_string(),
        });
    }
}
