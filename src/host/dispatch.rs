//! Signal dispatch, bootstrap sequencing, navigation and cleanup.
//!
//! Handlers are regular functions over an explicit [`SessionContext`] and a
//! set of [`Ports`], which keeps the state machine testable without a
//! browser or a network.
//!
//! # Bootstrap
//!
//! ```text
//! SESSION_ESTABLISHED(endpoints)
//!     └─► request sections (generation N)
//!             └─► SectionsFetched(N)   stale N? drop
//!                     ├─ unusable ──► error surface, stop keep-alive
//!                     └─ usable   ──► load landing target
//!                                     build menu (first time only)
//!                                     (re)arm keep-alive
//! ```

// Rust guideline compliant 2026-01

use serde_json::Value;

use super::context::{EmbeddingStatus, SessionContext, ViewState};
use super::landing;
use super::navigation::{navigation_action, NavigationAction, NavigationMenu};
use super::view::EmbeddingHost;
use crate::collaborator::Collaborator;
use crate::config::Config;
use crate::constants;
use crate::error::{EmbedError, EmbedResult};
use crate::protocol::{
    decode_envelope, decode_payload, ControlSignal, InboundMessage, InboundSignal,
    SectionsResponse, SessionEndpoints, SignalEnvelope,
};

/// Everything a handler may act on besides the session context.
pub(crate) struct Ports<'a> {
    pub host: &'a mut dyn EmbeddingHost,
    pub collaborator: &'a dyn Collaborator,
    pub config: &'a Config,
}

// =============================================================================
// Inbound messages
// =============================================================================

/// Validate and decode a raw window message, then dispatch it.
///
/// Foreign senders and undecodable payloads are logged and dropped.
pub(crate) fn handle_window_message(
    ctx: &mut SessionContext,
    ports: &mut Ports<'_>,
    message: &InboundMessage,
) {
    if !message.is_trusted() {
        log::warn!(
            "[{}] Dropping message from untrusted source {:?}",
            ctx.embedding_id,
            message.source
        );
        return;
    }

    match decode_payload(&message.payload) {
        Ok(signal) => {
            log::info!("[{}] {} received", ctx.embedding_id, signal.name());
            dispatch_signal(ctx, ports, signal);
        }
        Err(e) => log::info!("[{}] Dropping message: {e}", ctx.embedding_id),
    }
}

/// Decode an SDK envelope, then dispatch it.
pub(crate) fn handle_sdk_envelope(
    ctx: &mut SessionContext,
    ports: &mut Ports<'_>,
    envelope: SignalEnvelope,
) {
    match decode_envelope(envelope) {
        Ok(signal) => dispatch_signal(ctx, ports, signal),
        Err(e) => log::debug!("[{}] Ignoring SDK event: {e}", ctx.embedding_id),
    }
}

/// Drive host state from one decoded signal.
pub(crate) fn dispatch_signal(
    ctx: &mut SessionContext,
    ports: &mut Ports<'_>,
    signal: InboundSignal,
) {
    match signal {
        InboundSignal::SessionEstablished { endpoints } => {
            handle_session_established(ctx, ports, endpoints);
        }
        InboundSignal::SessionError { message, detail } => {
            let message =
                message.unwrap_or_else(|| constants::AUTHENTICATION_FAILED_MESSAGE.to_string());
            show_error(ctx, ports, &message, detail.as_ref());
        }
        InboundSignal::EjectSession { message } => {
            let message = message.unwrap_or_else(|| constants::SESSION_EJECTED_MESSAGE.to_string());
            show_error(ctx, ports, &message, None);
            ports.host.hide_navigation();
            ctx.keep_alive.cancel();
            ctx.frozen = true;
            log::warn!("[{}] Session ejected, embedding frozen", ctx.embedding_id);
        }
        InboundSignal::AutoProvisionSucceeded => {
            log::info!("[{}] User successfully auto-provisioned", ctx.embedding_id);
            if ports.config.reload_on_auto_provision {
                reauthenticate(ctx, ports);
            }
        }
        InboundSignal::AutoProvisionFailed { message } => {
            let message =
                message.unwrap_or_else(|| constants::AUTO_PROVISION_FAILED_MESSAGE.to_string());
            show_error(ctx, ports, &message, None);
        }
        InboundSignal::SessionAlive => {
            // Host sessions in this integration do not expire.
        }
        InboundSignal::SessionExpired => {
            log::info!("[{}] Embedded session expired, re-authenticating", ctx.embedding_id);
            reauthenticate(ctx, ports);
        }
        InboundSignal::Fault { kind, message } => {
            let message = message.unwrap_or_else(|| kind.default_message());
            show_error(ctx, ports, &message, None);
        }
        InboundSignal::AppLoaded => {
            ctx.mark_loaded();
            if ctx.view != ViewState::Error {
                ctx.view = ViewState::Loaded;
            }
        }
        InboundSignal::Debug { code, message } => {
            if ports.config.debug_enabled {
                log::debug!(
                    "[{}] debug {code}: {}",
                    ctx.embedding_id,
                    message.as_deref().unwrap_or("")
                );
            }
        }
        InboundSignal::Unrecognized { category, code } => {
            let category = category.map_or_else(|| "raw".to_string(), |c| c.to_string());
            log::info!(
                "[{}] Ignoring unrecognized {category} signal {code}",
                ctx.embedding_id
            );
        }
    }
}

// =============================================================================
// Bootstrap
// =============================================================================

fn handle_session_established(
    ctx: &mut SessionContext,
    ports: &mut Ports<'_>,
    endpoints: Option<SessionEndpoints>,
) {
    if ctx.frozen || ctx.log_off_pending {
        log::warn!(
            "[{}] Ignoring session start on a frozen or departing embedding",
            ctx.embedding_id
        );
        return;
    }

    match endpoints {
        Some(endpoints) => begin_bootstrap(ctx, ports, endpoints),
        None => {
            // SDK transport: the surface is already pointed at its target.
            ports.host.set_loading_indicator(false);
            ports.host.reveal_surface();
            ctx.keep_alive.start(ports.config.keep_alive_interval());
        }
    }
}

/// Store the endpoints and request the sections list.
pub(crate) fn begin_bootstrap(
    ctx: &mut SessionContext,
    ports: &mut Ports<'_>,
    endpoints: SessionEndpoints,
) {
    let generation = ctx.next_sections_generation();
    log::info!(
        "[{}] Bootstrapping (sections request {generation})",
        ctx.embedding_id
    );
    ports
        .collaborator
        .request_sections(&endpoints.application_sections_url, generation);
    ctx.endpoints = Some(endpoints);
}

/// Finish the bootstrap once the sections response settles.
pub(crate) fn complete_bootstrap(
    ctx: &mut SessionContext,
    ports: &mut Ports<'_>,
    generation: u64,
    result: EmbedResult<SectionsResponse>,
) {
    if !ctx.is_current_generation(generation) {
        log::debug!(
            "[{}] Discarding stale sections response {generation} (current {})",
            ctx.embedding_id,
            ctx.sections_generation
        );
        return;
    }
    if ctx.frozen || ctx.log_off_pending {
        return;
    }

    let sections = match result.map(SectionsResponse::into_usable) {
        Ok(Some(sections)) => sections,
        Ok(None) => {
            sections_unavailable(ctx, ports, &EmbedError::SectionsUnavailable);
            return;
        }
        Err(e) => {
            sections_unavailable(ctx, ports, &e);
            return;
        }
    };

    let deep_link = match (ctx.page_url.as_deref(), ctx.endpoints.as_ref()) {
        (Some(page), Some(endpoints)) => {
            landing::deep_link_target(page, &endpoints.shared_link_prefix)
        }
        _ => None,
    };
    let target = deep_link.or_else(|| {
        landing::default_landing(
            &sections,
            &ports.config.default_section_id,
            &ports.config.default_room_id,
        )
    });

    match target {
        Some(url) => render_surface(ctx, ports, &url),
        None => {
            sections_unavailable(ctx, ports, &EmbedError::SectionsUnavailable);
            return;
        }
    }

    if ctx.status == EmbeddingStatus::NotLoaded && ctx.menu.is_none() {
        let menu = NavigationMenu::build(&sections);
        ports.host.render_menu(&menu);
        ctx.menu = Some(menu);
    }
    ctx.keep_alive.start(ports.config.keep_alive_interval());
}

/// The sections list cannot drive the surface: stop renewing and show the
/// error view.
fn sections_unavailable(ctx: &mut SessionContext, ports: &mut Ports<'_>, cause: &EmbedError) {
    ctx.keep_alive.cancel();
    let detail = Value::String(cause.to_string());
    show_error(ctx, ports, constants::SECTIONS_UNAVAILABLE_MESSAGE, Some(&detail));
}

/// Re-run the embedding bootstrap from authentication.
///
/// The keep-alive stops and in-flight sections requests are superseded; the
/// next `SESSION_ESTABLISHED` starts the sequence again.
fn reauthenticate(ctx: &mut SessionContext, ports: &mut Ports<'_>) {
    if ctx.frozen || ctx.log_off_pending {
        log::debug!(
            "[{}] Not re-authenticating a frozen or departing embedding",
            ctx.embedding_id
        );
        return;
    }
    ctx.keep_alive.cancel();
    ctx.next_sections_generation();

    let connect_url = ports.config.connect_session_url.clone();
    if ctx.surface_url.as_deref() == Some(connect_url.as_str()) {
        ports.host.reload_surface();
        ctx.view = ViewState::Loading;
    } else {
        render_surface(ctx, ports, &connect_url);
    }
}

// =============================================================================
// Navigation
// =============================================================================

/// Act on the user selecting menu entry `entry_id`.
pub(crate) fn navigate(ctx: &mut SessionContext, ports: &mut Ports<'_>, entry_id: &str) {
    if ctx.frozen || ctx.log_off_pending {
        log::debug!(
            "[{}] Navigation ignored on a frozen or departing embedding",
            ctx.embedding_id
        );
        return;
    }
    let Some(entry) = ctx.menu.as_ref().and_then(|m| m.find(entry_id)) else {
        log::warn!("[{}] No navigation entry {entry_id:?}", ctx.embedding_id);
        return;
    };

    match navigation_action(ctx.status, entry) {
        Some(NavigationAction::Reload { url }) => render_surface(ctx, ports, &url),
        Some(NavigationAction::Post(signal)) => ports.host.post_control(&signal),
        None => log::debug!("[{}] Entry {entry_id:?} has no target yet", ctx.embedding_id),
    }
}

// =============================================================================
// Keep-alive, errors and cleanup
// =============================================================================

/// Post a keep-alive if `timer_id` is the armed timer.
pub(crate) fn keep_alive_tick(ctx: &mut SessionContext, ports: &mut Ports<'_>, timer_id: u64) {
    if !ctx.keep_alive.is_current(timer_id) || ctx.frozen || ctx.log_off_pending {
        log::debug!("[{}] Ignoring tick from timer {timer_id}", ctx.embedding_id);
        return;
    }
    ports.host.post_control(&ControlSignal::ParentSessionAlive);
    log::info!("[{}] PARENT_SESSION_ALIVE posted", ctx.embedding_id);
}

/// Point the surface at the error view and tell the user. Valid in any state.
pub(crate) fn show_error(
    ctx: &mut SessionContext,
    ports: &mut Ports<'_>,
    message: &str,
    detail: Option<&Value>,
) {
    let error_view = ports.config.error_view_url.clone();
    ports.host.set_loading_indicator(false);
    ports.host.load_surface(&error_view);
    ports.host.reveal_surface();
    ctx.surface_url = Some(error_view);
    ctx.view = ViewState::Error;

    match detail {
        Some(detail) => log::error!("[{}] {message} {detail}", ctx.embedding_id),
        None => log::error!(
            "[{}] {message} No additional information supplied.",
            ctx.embedding_id
        ),
    }
    ports.host.show_notice(message);
}

/// Tear down the collaborator session and leave the host page.
///
/// In-flight sections responses are superseded. While the logoff is pending
/// further cleanups, bootstraps, navigation and ticks are ignored.
pub(crate) fn cleanup(ctx: &mut SessionContext, ports: &mut Ports<'_>) {
    if ctx.log_off_pending {
        log::debug!("[{}] Cleanup already waiting on logoff", ctx.embedding_id);
        return;
    }
    ctx.keep_alive.cancel();
    ctx.next_sections_generation();

    if ctx.status == EmbeddingStatus::Loaded {
        ports.host.post_control(&ControlSignal::ParentSessionCleanup);
    } else if let Some(endpoints) = ctx.endpoints.as_ref() {
        ports.collaborator.request_log_off(&endpoints.log_off_url);
        ctx.log_off_pending = true;
        return;
    } else {
        log::error!(
            "[{}] Cannot clean up embedded session as it is not connected",
            ctx.embedding_id
        );
    }
    leave(ctx, ports);
}

/// Logoff settled: leave regardless of outcome.
pub(crate) fn log_off_finished(ctx: &mut SessionContext, ports: &mut Ports<'_>, result: EmbedResult<()>) {
    if !ctx.log_off_pending {
        log::debug!("[{}] Unexpected logoff completion", ctx.embedding_id);
        return;
    }
    ctx.log_off_pending = false;
    if let Err(e) = result {
        log::error!("[{}] There was an error logging the user out: {e}", ctx.embedding_id);
    }
    leave(ctx, ports);
}

fn leave(ctx: &mut SessionContext, ports: &mut Ports<'_>) {
    ctx.keep_alive.cancel();
    let sign_in = ports.config.sign_in_url.clone();
    ports.host.navigate_host(&sign_in);
    ctx.finished = true;
}

fn render_surface(ctx: &mut SessionContext, ports: &mut Ports<'_>, url: &str) {
    ports.host.set_loading_indicator(false);
    ports.host.load_surface(url);
    ports.host.reveal_surface();
    ctx.surface_url = Some(url.to_string());
    ctx.view = ViewState::Loading;
}
