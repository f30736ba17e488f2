//! Calls to the embedded collaborator's HTTP endpoints.
//!
//! Two requests leave the host: the credentialed sections query and the
//! direct logoff used when the surface never finished loading. Both run off
//! the event loop and report back as [`HostEvent`]s.
//!
//! # Design
//!
//! [`fetch_sections`] and [`log_off`] are regular async functions over a
//! [`reqwest::Client`], testable against a mock server. The [`Collaborator`]
//! trait is the seam the controller calls; [`HttpCollaborator`] spawns those
//! functions on the runtime, [`StaticCollaborator`] answers from memory for
//! offline replay.

// Rust guideline compliant 2026-01

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use tokio::sync::mpsc::UnboundedSender;

use crate::config::Config;
use crate::error::{EmbedError, EmbedResult};
use crate::host::HostEvent;
use crate::protocol::SectionsResponse;

/// Requests the controller issues to the collaborator.
///
/// Implementations must not block; results arrive later as
/// [`HostEvent::SectionsFetched`] and [`HostEvent::LogOffFinished`].
pub trait Collaborator {
    /// Fetch the sections list, tagged with `generation`.
    fn request_sections(&self, url: &str, generation: u64);
    /// End the collaborator session through `url`.
    fn request_log_off(&self, url: &str);
}

/// Build the HTTP client used for collaborator calls.
///
/// The cookie jar carries the collaborator's session cookies, which is what
/// makes the requests credentialed.
pub fn build_client(config: &Config, jar: Arc<Jar>) -> EmbedResult<Client> {
    let client = Client::builder()
        .cookie_provider(jar)
        .timeout(config.http_timeout())
        .build()?;
    Ok(client)
}

/// GET the sections list.
///
/// Any status other than `200 OK` and undecodable bodies are errors; an
/// empty list is returned as-is for the caller to judge.
pub async fn fetch_sections(client: &Client, url: &str) -> EmbedResult<SectionsResponse> {
    let response = client
        .get(url)
        .header(ACCEPT, "application/json")
        .send()
        .await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(EmbedError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let body = response.text().await?;
    let sections: SectionsResponse = serde_json::from_str(&body)?;
    log::debug!(
        "Fetched {} application sections",
        sections.available_sections.len()
    );
    Ok(sections)
}

/// GET the logoff URL.
pub async fn log_off(client: &Client, url: &str) -> EmbedResult<()> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(EmbedError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }
}

/// Collaborator backed by real HTTP calls on a tokio runtime.
#[derive(Debug, Clone)]
pub struct HttpCollaborator {
    client: Client,
    events: UnboundedSender<HostEvent>,
    runtime: tokio::runtime::Handle,
}

impl HttpCollaborator {
    /// Create with a fresh cookie jar.
    pub fn new(
        config: &Config,
        events: UnboundedSender<HostEvent>,
        runtime: tokio::runtime::Handle,
    ) -> EmbedResult<Self> {
        Self::with_cookie_jar(config, Arc::new(Jar::default()), events, runtime)
    }

    /// Create sharing an existing cookie jar (e.g. one seeded by the
    /// authentication handshake).
    pub fn with_cookie_jar(
        config: &Config,
        jar: Arc<Jar>,
        events: UnboundedSender<HostEvent>,
        runtime: tokio::runtime::Handle,
    ) -> EmbedResult<Self> {
        Ok(Self {
            client: build_client(config, jar)?,
            events,
            runtime,
        })
    }
}

impl Collaborator for HttpCollaborator {
    fn request_sections(&self, url: &str, generation: u64) {
        let client = self.client.clone();
        let events = self.events.clone();
        let url = url.to_string();
        self.runtime.spawn(async move {
            let result = fetch_sections(&client, &url).await;
            if let Err(e) = &result {
                log::warn!("Sections request {generation} failed: {e}");
            }
            if events
                .send(HostEvent::SectionsFetched { generation, result })
                .is_err()
            {
                log::debug!("Host loop gone before sections request {generation} settled");
            }
        });
    }

    fn request_log_off(&self, url: &str) {
        let client = self.client.clone();
        let events = self.events.clone();
        let url = url.to_string();
        self.runtime.spawn(async move {
            let result = log_off(&client, &url).await;
            if events.send(HostEvent::LogOffFinished { result }).is_err() {
                log::debug!("Host loop gone before logoff settled");
            }
        });
    }
}

/// Collaborator that answers from memory, synchronously enqueueing results.
///
/// Used by offline replay: sections come from a fixture (or fail when none
/// is configured) and logoff always succeeds.
#[derive(Debug, Clone)]
pub struct StaticCollaborator {
    sections: Option<SectionsResponse>,
    events: UnboundedSender<HostEvent>,
}

impl StaticCollaborator {
    /// Create answering sections queries with `sections`.
    pub fn new(sections: Option<SectionsResponse>, events: UnboundedSender<HostEvent>) -> Self {
        Self { sections, events }
    }
}

impl Collaborator for StaticCollaborator {
    fn request_sections(&self, url: &str, generation: u64) {
        let result = self
            .sections
            .clone()
            .ok_or_else(|| EmbedError::UnexpectedStatus {
                status: 404,
                url: url.to_string(),
            });
        if self
            .events
            .send(HostEvent::SectionsFetched { generation, result })
            .is_err()
        {
            log::debug!("Host loop gone before sections request {generation} settled");
        }
    }

    fn request_log_off(&self, _url: &str) {
        if self
            .events
            .send(HostEvent::LogOffFinished { result: Ok(()) })
            .is_err()
        {
            log::debug!("Host loop gone before logoff settled");
        }
    }
}
