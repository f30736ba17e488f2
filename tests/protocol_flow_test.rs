//! End-to-end tests of the host controller.
//!
//! Events are fed by hand; the recording host and collaborator capture every
//! side effect so each lifecycle step can be asserted on.

use std::cell::RefCell;
use std::time::{Duration, Instant};

use embedding_host::constants::{
    APP_DOWN_MESSAGE, AUTHENTICATION_FAILED_MESSAGE, SECTIONS_UNAVAILABLE_MESSAGE,
};
use embedding_host::host::landing::deep_link_target;
use embedding_host::protocol::{
    ApplicationSection, FrameId, InboundMessage, MessageSource, Room, SectionsResponse,
    SignalEnvelope,
};
use embedding_host::{
    Collaborator, Config, EmbedError, EmbeddingStatus, HostController, HostEvent, RecordingHost,
    StaticCollaborator, ViewAction, ViewState,
};
use serde_json::{json, Value};

#[derive(Debug, Default)]
struct RecordingCollaborator {
    sections_requests: RefCell<Vec<(String, u64)>>,
    log_off_requests: RefCell<Vec<String>>,
}

impl Collaborator for RecordingCollaborator {
    fn request_sections(&self, url: &str, generation: u64) {
        self.sections_requests
            .borrow_mut()
            .push((url.to_string(), generation));
    }

    fn request_log_off(&self, url: &str) {
        self.log_off_requests.borrow_mut().push(url.to_string());
    }
}

type Controller = HostController<RecordingHost, RecordingCollaborator>;

fn controller_with(config: Config, page_url: Option<&str>) -> Controller {
    HostController::new(
        config,
        page_url.map(str::to_string),
        RecordingHost::new(),
        RecordingCollaborator::default(),
    )
}

fn controller() -> Controller {
    controller_with(Config::default(), None)
}

fn raw(message_type: &str, data: Option<Value>) -> HostEvent {
    let mut message = json!({ "messageType": message_type });
    if let Some(data) = data {
        message["data"] = data;
    }
    HostEvent::WindowMessage(InboundMessage::from_frame(
        FrameId::App,
        json!({ "visier": message }).to_string(),
    ))
}

fn sdk(category: &str, code: &str, message: Option<&str>) -> HostEvent {
    HostEvent::SdkSignal(SignalEnvelope {
        category: category.to_string(),
        code: code.to_string(),
        message: message.map(str::to_string),
        data: None,
    })
}

fn connected() -> HostEvent {
    raw(
        "SESSION_CONNECTED",
        Some(json!({
            "applicationSectionsUrl": "https://x/sections",
            "logOffUrl": "https://x/logoff",
            "sharedLinkPrefix": "https://x/"
        })),
    )
}

fn room(id: &str, section: &str) -> Room {
    Room {
        room_id: id.to_string(),
        room_name: id.to_uppercase(),
        room_url: format!("https://x/{section}/{id}"),
    }
}

fn sections() -> SectionsResponse {
    SectionsResponse {
        available_sections: vec![
            ApplicationSection {
                section_id: "analytics".to_string(),
                section_name: "Analytics".to_string(),
                section_url: Some("https://x/analytics".to_string()),
                available_rooms: vec![room("home", "analytics"), room("explore", "analytics")],
            },
            ApplicationSection {
                section_id: "admin".to_string(),
                section_name: "Admin".to_string(),
                section_url: Some("https://x/admin".to_string()),
                available_rooms: vec![room("users", "admin")],
            },
        ],
    }
}

fn deliver_sections(c: &mut Controller, result: Result<SectionsResponse, EmbedError>) {
    let generation = c.context().sections_generation();
    c.handle_event(HostEvent::SectionsFetched { generation, result });
}

fn bootstrap(c: &mut Controller) {
    c.handle_event(connected());
    deliver_sections(c, Ok(sections()));
}

fn posted_values(c: &Controller) -> Vec<Value> {
    c.host()
        .posted()
        .into_iter()
        .map(|m| serde_json::from_str(m).unwrap())
        .collect()
}

#[test]
fn test_established_bootstraps_menu_landing_and_keep_alive() {
    let mut c = controller();
    c.handle_event(connected());

    assert_eq!(
        *c.collaborator().sections_requests.borrow(),
        vec![("https://x/sections".to_string(), 1)]
    );
    assert_eq!(
        c.context().endpoints().unwrap().log_off_url,
        "https://x/logoff"
    );

    deliver_sections(&mut c, Ok(sections()));

    assert_eq!(c.host().loaded_urls(), vec!["https://x/analytics/home"]);
    assert_eq!(c.host().menu_renders(), 1);
    assert_eq!(c.context().menu().unwrap().entry_count(), 5);
    assert_eq!(c.context().keep_alive().active_count(), 1);
    assert_eq!(c.context().view(), ViewState::Loading);

    c.handle_event(raw("visier_app_loaded", None));
    assert_eq!(c.context().status(), EmbeddingStatus::Loaded);
    assert_eq!(c.context().view(), ViewState::Loaded);
}

#[test]
fn test_empty_sections_show_error_without_keep_alive() {
    let mut c = controller();
    c.handle_event(connected());
    deliver_sections(&mut c, Ok(SectionsResponse::default()));

    assert_eq!(c.host().loaded_urls(), vec!["./visierError"]);
    assert_eq!(c.host().notices(), vec![SECTIONS_UNAVAILABLE_MESSAGE]);
    assert_eq!(c.host().menu_renders(), 0);
    assert!(!c.context().keep_alive().is_active());
    assert_eq!(c.context().view(), ViewState::Error);
}

#[test]
fn test_failed_sections_request_shows_error() {
    let mut c = controller();
    c.handle_event(connected());
    deliver_sections(
        &mut c,
        Err(EmbedError::UnexpectedStatus {
            status: 500,
            url: "https://x/sections".to_string(),
        }),
    );

    assert_eq!(c.host().notices(), vec![SECTIONS_UNAVAILABLE_MESSAGE]);
    assert!(!c.context().keep_alive().is_active());
}

#[test]
fn test_second_bootstrap_after_load_keeps_single_menu_and_timer() {
    let mut c = controller();
    bootstrap(&mut c);
    c.handle_event(raw("VISIER_APP_LOADED", None));
    let first_timer = c.context().keep_alive().current_id().unwrap();

    bootstrap(&mut c);

    assert_eq!(c.host().menu_renders(), 1);
    assert_eq!(c.context().keep_alive().active_count(), 1);
    assert_ne!(c.context().keep_alive().current_id(), Some(first_timer));
    assert_eq!(c.host().loaded_urls().len(), 2);
}

#[test]
fn test_expired_session_reauthenticates_and_discards_stale_sections() {
    let mut c = controller();
    c.handle_event(connected());
    let stale = c.context().sections_generation();
    deliver_sections(&mut c, Ok(sections()));
    assert!(c.context().keep_alive().is_active());

    c.handle_event(raw("VISIER_SESSION_EXPIRED", None));

    assert!(!c.context().keep_alive().is_active());
    assert_eq!(
        c.host().loaded_urls().last().copied(),
        Some("./connectVisierSession")
    );
    assert!(c.context().sections_generation() > stale);

    let loads = c.host().loaded_urls().len();
    c.handle_event(HostEvent::SectionsFetched {
        generation: stale,
        result: Ok(sections()),
    });
    assert_eq!(c.host().loaded_urls().len(), loads);
    assert!(!c.context().keep_alive().is_active());

    // The new session bootstraps normally.
    bootstrap(&mut c);
    assert!(c.context().keep_alive().is_active());
    assert_eq!(c.host().menu_renders(), 1);
}

#[test]
fn test_expiry_while_on_connect_route_reloads() {
    let mut c = controller();
    c.handle_event(raw("VISIER_SESSION_EXPIRED", None));
    c.handle_event(raw("VISIER_SESSION_EXPIRED", None));

    assert_eq!(c.host().loaded_urls(), vec!["./connectVisierSession"]);
    assert!(c.host().actions().contains(&ViewAction::ReloadSurface));
}

#[test]
fn test_navigation_before_and_after_first_load() {
    let mut c = controller();
    bootstrap(&mut c);

    c.handle_event(HostEvent::Navigate {
        entry_id: "explore".to_string(),
    });
    assert_eq!(
        c.host().loaded_urls().last().copied(),
        Some("https://x/analytics/explore")
    );
    assert!(c.host().posted().is_empty());

    c.handle_event(raw("VISIER_APP_LOADED", None));
    let loads = c.host().loaded_urls().len();
    c.handle_event(HostEvent::Navigate {
        entry_id: "users".to_string(),
    });

    assert_eq!(c.host().loaded_urls().len(), loads);
    assert_eq!(
        posted_values(&c),
        vec![json!({"visier": {"messageType": "NAVIGATION", "data": {"targetRoom": "users"}}})]
    );
}

#[test]
fn test_navigation_to_unknown_entry_is_ignored() {
    let mut c = controller();
    bootstrap(&mut c);
    let before = c.host().actions().len();
    c.handle_event(HostEvent::Navigate {
        entry_id: "missing".to_string(),
    });
    assert_eq!(c.host().actions().len(), before);
}

#[test]
fn test_keep_alive_tick_posts_alive() {
    let mut c = controller();
    bootstrap(&mut c);
    let timer_id = c.context().keep_alive().current_id().unwrap();

    c.handle_event(HostEvent::KeepAliveTick {
        timer_id: timer_id + 100,
    });
    assert!(c.host().posted().is_empty());

    c.handle_event(HostEvent::KeepAliveTick { timer_id });
    assert_eq!(
        posted_values(&c),
        vec![json!({"visier": {"messageType": "PARENT_SESSION_ALIVE"}})]
    );
}

#[test]
fn test_poll_timers_fires_due_keep_alive() {
    let mut c = controller();
    bootstrap(&mut c);

    c.poll_timers(Instant::now());
    assert!(c.host().posted().is_empty());

    c.poll_timers(Instant::now() + Duration::from_secs(601));
    assert_eq!(c.host().posted().len(), 1);
}

#[test]
fn test_eject_freezes_embedding() {
    let mut c = controller();
    bootstrap(&mut c);

    c.handle_event(sdk("session", "EJECT_SESSION", Some("Signed in elsewhere")));

    assert!(c.context().is_frozen());
    assert!(!c.context().keep_alive().is_active());
    assert_eq!(c.host().notices(), vec!["Signed in elsewhere"]);
    assert!(c.host().actions().contains(&ViewAction::HideNavigation));
    assert_eq!(c.context().view(), ViewState::Error);

    let before = c.host().actions().len();
    c.handle_event(HostEvent::Navigate {
        entry_id: "explore".to_string(),
    });
    c.handle_event(connected());
    assert_eq!(c.host().actions().len(), before);
    assert_eq!(c.collaborator().sections_requests.borrow().len(), 1);
}

#[test]
fn test_cleanup_after_load_posts_and_leaves() {
    let mut c = controller();
    bootstrap(&mut c);
    c.handle_event(raw("VISIER_APP_LOADED", None));

    let running = c.handle_event(HostEvent::Cleanup);

    assert!(!running);
    assert!(c.context().is_finished());
    assert!(!c.context().keep_alive().is_active());
    assert_eq!(
        posted_values(&c),
        vec![json!({"visier": {"messageType": "PARENT_SESSION_CLEANUP", "data": {}}})]
    );
    assert_eq!(
        c.host().actions().last(),
        Some(&ViewAction::NavigateHost {
            url: "../".to_string()
        })
    );
    assert!(c.collaborator().log_off_requests.borrow().is_empty());

    // Nothing is processed once the host left.
    assert!(!c.handle_event(raw("VISIER_APP_LOADED", None)));
}

#[test]
fn test_cleanup_before_load_logs_off_then_leaves() {
    let mut c = controller();
    bootstrap(&mut c);

    assert!(c.handle_event(HostEvent::Cleanup));
    assert_eq!(
        *c.collaborator().log_off_requests.borrow(),
        vec!["https://x/logoff".to_string()]
    );
    assert!(!c.context().is_finished());

    c.handle_event(HostEvent::LogOffFinished {
        result: Err(EmbedError::UnexpectedStatus {
            status: 502,
            url: "https://x/logoff".to_string(),
        }),
    });

    assert!(c.context().is_finished());
    assert_eq!(
        c.host().actions().last(),
        Some(&ViewAction::NavigateHost {
            url: "../".to_string()
        })
    );
}

#[test]
fn test_sections_arriving_during_logoff_are_discarded() {
    let mut c = controller();
    c.handle_event(connected());
    let generation = c.context().sections_generation();

    c.handle_event(HostEvent::Cleanup);
    c.handle_event(HostEvent::SectionsFetched {
        generation,
        result: Ok(sections()),
    });

    assert!(!c.context().keep_alive().is_active());
    assert_eq!(c.host().menu_renders(), 0);
    assert!(c.host().loaded_urls().is_empty());

    c.handle_event(HostEvent::LogOffFinished { result: Ok(()) });

    assert!(c.context().is_finished());
    assert!(!c.context().keep_alive().is_active());
    assert!(c.host().loaded_urls().is_empty());
}

#[test]
fn test_events_during_logoff_are_ignored() {
    let mut c = controller();
    bootstrap(&mut c);
    let timer_id = c.context().keep_alive().current_id().unwrap();
    c.handle_event(HostEvent::Cleanup);
    let before = c.host().actions().len();

    c.handle_event(raw("VISIER_SESSION_EXPIRED", None));
    c.handle_event(HostEvent::Navigate {
        entry_id: "explore".to_string(),
    });
    c.handle_event(HostEvent::KeepAliveTick { timer_id });
    c.handle_event(connected());
    c.handle_event(HostEvent::Cleanup);

    assert_eq!(c.host().actions().len(), before);
    assert_eq!(c.collaborator().log_off_requests.borrow().len(), 1);
    assert_eq!(c.collaborator().sections_requests.borrow().len(), 1);
    assert!(!c.context().keep_alive().is_active());
    assert!(!c.context().is_finished());

    c.handle_event(HostEvent::LogOffFinished { result: Ok(()) });
    assert!(c.context().is_finished());
}

#[test]
fn test_unusable_sections_stop_running_keep_alive() {
    let mut c = controller();
    bootstrap(&mut c);
    assert!(c.context().keep_alive().is_active());

    c.handle_event(connected());
    deliver_sections(&mut c, Ok(SectionsResponse::default()));

    assert!(!c.context().keep_alive().is_active());
    assert_eq!(c.context().view(), ViewState::Error);
}

#[test]
fn test_cleanup_without_session_leaves_directly() {
    let mut c = controller();
    c.handle_event(HostEvent::Cleanup);
    assert!(c.context().is_finished());
    assert_eq!(
        c.host().actions(),
        &[ViewAction::NavigateHost {
            url: "../".to_string()
        }]
    );
}

#[test]
fn test_deep_link_overrides_default_landing() {
    let mut c = controller_with(
        Config::default(),
        Some("https://partner.example/embed?analysis_url=foo%2Fbar"),
    );
    bootstrap(&mut c);

    assert_eq!(c.host().loaded_urls(), vec!["https://x/foo/bar"]);
    assert_eq!(
        deep_link_target("?user_preferences_url=prefs", "https://x/").as_deref(),
        Some("https://x/prefs")
    );
}

#[test]
fn test_untrusted_and_malformed_messages_are_dropped() {
    let mut c = controller();

    let connected_payload = match connected() {
        HostEvent::WindowMessage(message) => message.payload,
        other => panic!("Expected WindowMessage, got {:?}", other),
    };
    c.handle_event(HostEvent::WindowMessage(InboundMessage {
        source: MessageSource::Foreign,
        payload: connected_payload,
    }));
    c.handle_event(HostEvent::WindowMessage(InboundMessage::from_frame(
        FrameId::Session,
        "{not json",
    )));
    c.handle_event(HostEvent::WindowMessage(InboundMessage::from_frame(
        FrameId::App,
        r#"{"hello": "world"}"#,
    )));

    assert!(c.collaborator().sections_requests.borrow().is_empty());
    assert!(c.host().actions().is_empty());
    assert!(c.context().endpoints().is_none());
}

#[test]
fn test_unknown_signals_change_nothing() {
    let mut c = controller();
    bootstrap(&mut c);
    let before = c.host().actions().len();

    c.handle_event(raw("SOMETHING_NEW", None));
    c.handle_event(sdk("info", "SOMETHING_NEW", None));
    c.handle_event(sdk("error", "SOMETHING_NEW", None));
    c.handle_event(sdk("telemetry", "PING", None));
    c.handle_event(sdk("debug", "TRACE", Some("frame ready")));
    c.handle_event(raw("VISIER_SESSION_ALIVE", None));

    assert_eq!(c.host().actions().len(), before);
    assert_eq!(c.context().status(), EmbeddingStatus::NotLoaded);
    assert_eq!(c.context().view(), ViewState::Loading);
    assert!(c.context().keep_alive().is_active());
}

#[test]
fn test_error_signals_show_messages() {
    let mut c = controller();

    c.handle_event(raw("AUTHENTICATION_ERROR", Some(json!({"reason": "bad assertion"}))));
    c.handle_event(sdk("error", "APP_DOWN", None));
    c.handle_event(sdk("error", "SESSION_TIMEOUT", Some("Too slow")));
    c.handle_event(sdk("session", "USER_AUTO_PROVISION_FAILED", Some("No seat")));

    assert_eq!(
        c.host().notices(),
        vec![
            AUTHENTICATION_FAILED_MESSAGE,
            APP_DOWN_MESSAGE,
            "Too slow",
            "No seat"
        ]
    );
    assert_eq!(c.context().view(), ViewState::Error);
}

#[test]
fn test_app_loaded_keeps_error_view() {
    let mut c = controller();
    c.handle_event(sdk("error", "APP_DOWN", None));
    c.handle_event(sdk("info", "APP_LOADED", None));

    assert_eq!(c.context().status(), EmbeddingStatus::Loaded);
    assert_eq!(c.context().view(), ViewState::Error);
}

#[test]
fn test_auto_provision_success_reload_is_opt_in() {
    let mut c = controller();
    c.handle_event(raw("USER_AUTOPROVISION_SUCCESS", None));
    assert!(c.host().actions().is_empty());

    let config = Config {
        reload_on_auto_provision: true,
        ..Config::default()
    };
    let mut c = controller_with(config, None);
    c.handle_event(sdk("session", "USER_AUTO_PROVISION_SUCCESS", None));
    assert_eq!(c.host().loaded_urls(), vec!["./connectVisierSession"]);
}

#[test]
fn test_sdk_established_without_endpoints_reveals_surface() {
    let mut c = controller();
    c.handle_event(sdk("session", "SESSION_ESTABLISHED", None));

    assert!(c.collaborator().sections_requests.borrow().is_empty());
    assert!(c.host().actions().contains(&ViewAction::RevealSurface));
    assert!(c.context().keep_alive().is_active());
}

#[tokio::test(start_paused = true)]
async fn test_event_loop_with_static_collaborator() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let collaborator = StaticCollaborator::new(Some(sections()), tx.clone());
    let mut c = HostController::new(Config::default(), None, RecordingHost::new(), collaborator)
        .with_event_channel(tx.clone(), tokio::runtime::Handle::current());

    tx.send(connected()).unwrap();
    let shutdown = tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(601)).await;
        shutdown.send(HostEvent::Shutdown).unwrap();
    });

    c.run(&mut rx).await;

    assert_eq!(c.host().loaded_urls(), vec!["https://x/analytics/home"]);
    assert_eq!(c.host().posted().len(), 1);
    assert!(!c.context().keep_alive().is_active());
}
