//! Host controller for the embedded session.
//!
//! The controller owns the [`SessionContext`], a host-page port
//! ([`EmbeddingHost`]) and a [`Collaborator`]. Everything that happens to the
//! session arrives as a [`HostEvent`] on a single channel and is handled to
//! completion before the next one:
//!
//! ```text
//! window messages ─┐
//! SDK events      ─┤
//! sections fetch  ─┼─► HostEvent ─► HostController::handle_event ─► EmbeddingHost
//! logoff          ─┤
//! keep-alive tick ─┤
//! user actions    ─┘
//! ```

// Rust guideline compliant 2026-01

pub mod context;
pub(crate) mod dispatch;
pub mod keepalive;
pub mod landing;
pub mod navigation;
pub mod view;

use std::time::Instant;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::collaborator::Collaborator;
use crate::config::Config;
use crate::error::EmbedResult;
use crate::protocol::{InboundMessage, SectionsResponse, SignalEnvelope};

pub use context::{EmbeddingStatus, SessionContext, ViewState};
pub use keepalive::KeepAliveTimer;
pub use navigation::{NavEntry, NavigationAction, NavigationMenu};
pub use view::{EmbeddingHost, RecordingHost, ViewAction};

use dispatch::Ports;

/// Event delivered to the host event loop.
#[derive(Debug)]
pub enum HostEvent {
    /// Raw window message from some frame.
    WindowMessage(InboundMessage),
    /// Event from the embedding SDK (already structured, trusted transport).
    SdkSignal(SignalEnvelope),
    /// A sections request settled.
    SectionsFetched {
        /// Generation the request was issued with.
        generation: u64,
        /// Parsed body or the failure.
        result: EmbedResult<SectionsResponse>,
    },
    /// A logoff request settled.
    LogOffFinished {
        /// Outcome of the request.
        result: EmbedResult<()>,
    },
    /// The keep-alive timer fired.
    KeepAliveTick {
        /// Id of the timer that fired.
        timer_id: u64,
    },
    /// The user selected a navigation entry.
    Navigate {
        /// Section or room id.
        entry_id: String,
    },
    /// The host is ending its own session.
    Cleanup,
    /// Stop the event loop.
    Shutdown,
}

/// Host-side protocol state machine.
#[derive(Debug)]
pub struct HostController<H, C> {
    ctx: SessionContext,
    host: H,
    collaborator: C,
    config: Config,
}

impl<H: EmbeddingHost, C: Collaborator> HostController<H, C> {
    /// Create a controller for the host page at `page_url`.
    ///
    /// Keep-alive ticks use deadline polling until
    /// [`with_event_channel`](Self::with_event_channel) is called.
    pub fn new(config: Config, page_url: Option<String>, host: H, collaborator: C) -> Self {
        let ctx = SessionContext::new(page_url);
        log::info!("[{}] Host controller created", ctx.embedding_id);
        Self {
            ctx,
            host,
            collaborator,
            config,
        }
    }

    /// Deliver keep-alive ticks as [`HostEvent::KeepAliveTick`] from tasks
    /// spawned on `runtime`.
    pub fn with_event_channel(
        mut self,
        tx: UnboundedSender<HostEvent>,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        self.ctx.keep_alive.set_event_channel(tx, runtime);
        self
    }

    /// Session state.
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// The host-page port.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host-page port.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The collaborator port.
    pub fn collaborator(&self) -> &C {
        &self.collaborator
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle one event. Returns `false` once the loop should stop.
    pub fn handle_event(&mut self, event: HostEvent) -> bool {
        if self.ctx.finished {
            log::debug!("[{}] Host already left, dropping {:?}", self.ctx.embedding_id, event);
            return false;
        }

        let mut ports = Ports {
            host: &mut self.host,
            collaborator: &self.collaborator,
            config: &self.config,
        };
        let ctx = &mut self.ctx;

        match event {
            HostEvent::WindowMessage(message) => {
                dispatch::handle_window_message(ctx, &mut ports, &message);
            }
            HostEvent::SdkSignal(envelope) => {
                dispatch::handle_sdk_envelope(ctx, &mut ports, envelope);
            }
            HostEvent::SectionsFetched { generation, result } => {
                dispatch::complete_bootstrap(ctx, &mut ports, generation, result);
            }
            HostEvent::LogOffFinished { result } => {
                dispatch::log_off_finished(ctx, &mut ports, result);
            }
            HostEvent::KeepAliveTick { timer_id } => {
                dispatch::keep_alive_tick(ctx, &mut ports, timer_id);
            }
            HostEvent::Navigate { entry_id } => {
                dispatch::navigate(ctx, &mut ports, &entry_id);
            }
            HostEvent::Cleanup => dispatch::cleanup(ctx, &mut ports),
            HostEvent::Shutdown => {
                log::info!("[{}] Host loop shutting down", ctx.embedding_id);
                ctx.keep_alive.cancel();
                return false;
            }
        }
        !self.ctx.finished
    }

    /// Fire a due keep-alive in deadline-polling mode.
    pub fn poll_timers(&mut self, now: Instant) {
        if let Some(timer_id) = self.ctx.keep_alive.poll_due(now) {
            self.handle_event(HostEvent::KeepAliveTick { timer_id });
        }
    }

    /// Run until the channel closes, the host leaves, or a shutdown arrives.
    pub async fn run(&mut self, rx: &mut UnboundedReceiver<HostEvent>) {
        log::info!("[{}] Host event loop starting", self.ctx.embedding_id);
        while let Some(event) = rx.recv().await {
            if !self.handle_event(event) {
                break;
            }
        }
        log::info!("[{}] Host event loop exiting", self.ctx.embedding_id);
    }
}
