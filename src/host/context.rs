//! Explicit per-embedding session state.
//!
//! Every handler receives the [`SessionContext`] by reference; there is no
//! process-wide state.

use serde::Serialize;
use uuid::Uuid;

use super::keepalive::KeepAliveTimer;
use super::navigation::NavigationMenu;
use crate::protocol::SessionEndpoints;

/// Whether the main application finished its first load.
///
/// Moves once from `NotLoaded` to `Loaded` and never reverts within one
/// embedding session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingStatus {
    /// No `APP_LOADED` seen yet.
    #[default]
    NotLoaded,
    /// The surface reported its first load.
    Loaded,
}

/// What the host page currently shows in place of the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    /// Loading placeholder, nothing rendered yet.
    #[default]
    NotLoaded,
    /// Surface pointed at a target, waiting for it.
    Loading,
    /// Surface shows the application.
    Loaded,
    /// Surface shows the error view.
    Error,
}

/// State of one embedding session, owned by the host controller.
#[derive(Debug)]
pub struct SessionContext {
    /// Correlates log lines of this embedding session.
    pub embedding_id: Uuid,
    /// URL of the host page, used for deep links.
    pub(crate) page_url: Option<String>,
    pub(crate) status: EmbeddingStatus,
    pub(crate) view: ViewState,
    pub(crate) endpoints: Option<SessionEndpoints>,
    pub(crate) menu: Option<NavigationMenu>,
    pub(crate) keep_alive: KeepAliveTimer,
    /// Current URL of the embedded surface.
    pub(crate) surface_url: Option<String>,
    /// Generation of the latest sections request.
    pub(crate) sections_generation: u64,
    /// Set by an eject; blocks navigation, bootstrap and keep-alive.
    pub(crate) frozen: bool,
    /// A logoff request is in flight; the host leaves when it settles.
    pub(crate) log_off_pending: bool,
    /// The host has navigated away; no further events are processed.
    pub(crate) finished: bool,
}

impl SessionContext {
    /// Fresh context for the host page at `page_url`.
    pub fn new(page_url: Option<String>) -> Self {
        Self {
            embedding_id: Uuid::new_v4(),
            page_url,
            status: EmbeddingStatus::NotLoaded,
            view: ViewState::NotLoaded,
            endpoints: None,
            menu: None,
            keep_alive: KeepAliveTimer::new(),
            surface_url: None,
            sections_generation: 0,
            frozen: false,
            log_off_pending: false,
            finished: false,
        }
    }

    /// Embedding status.
    pub fn status(&self) -> EmbeddingStatus {
        self.status
    }

    /// Presentation state.
    pub fn view(&self) -> ViewState {
        self.view
    }

    /// Endpoints of the current session, once established.
    pub fn endpoints(&self) -> Option<&SessionEndpoints> {
        self.endpoints.as_ref()
    }

    /// The navigation menu, once built.
    pub fn menu(&self) -> Option<&NavigationMenu> {
        self.menu.as_ref()
    }

    /// The keep-alive timer.
    pub fn keep_alive(&self) -> &KeepAliveTimer {
        &self.keep_alive
    }

    /// Current surface URL.
    pub fn surface_url(&self) -> Option<&str> {
        self.surface_url.as_deref()
    }

    /// Whether an eject froze the session.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Whether the host navigated away.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Generation of the latest sections request.
    pub fn sections_generation(&self) -> u64 {
        self.sections_generation
    }

    /// Move to `Loaded`. Idempotent.
    pub(crate) fn mark_loaded(&mut self) {
        if self.status == EmbeddingStatus::NotLoaded {
            log::info!("[{}] Embedded application loaded", self.embedding_id);
        }
        self.status = EmbeddingStatus::Loaded;
    }

    /// Start a new sections request generation, superseding older ones.
    pub(crate) fn next_sections_generation(&mut self) -> u64 {
        self.sections_generation += 1;
        self.sections_generation
    }

    /// Whether a response for `generation` is still wanted.
    pub(crate) fn is_current_generation(&self, generation: u64) -> bool {
        generation == self.sections_generation
    }
}
