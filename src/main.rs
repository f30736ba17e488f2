//! Embedding Host CLI.
//!
//! Headless tooling around the host controller: inspect configuration,
//! resolve deep links and sign-in redirects, map partner users to claims,
//! probe the sections endpoint, and replay message transcripts. See the `embedding_host` library for the protocol itself.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use embedding_host::claims::{sign_in_redirect_for_page, PartnerUser};
use embedding_host::collaborator::{build_client, fetch_sections};
use embedding_host::env::Environment;
use embedding_host::host::landing::deep_link_target;
use embedding_host::host::NavigationMenu;
use embedding_host::protocol::{FrameId, InboundMessage, MessageSource, SectionsResponse};
use embedding_host::{Config, HostController, HostEvent, RecordingHost, StaticCollaborator};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "embedding-host")]
#[command(version)]
#[command(about = "Host-side session lifecycle for an embedded analytics application")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configuration
    Config,
    /// Resolve the deep-link landing target for a host page URL
    ResolveLanding {
        /// Host page URL (absolute, relative, or a bare query string)
        #[arg(long)]
        page_url: String,
        /// Shared-link prefix issued with the session
        #[arg(long)]
        shared_link_prefix: String,
    },
    /// Fetch the sections list and print the navigation menu
    Sections {
        /// Application sections URL
        url: String,
        /// Cookie to send, as `name=value` (repeatable)
        #[arg(long = "cookie")]
        cookies: Vec<String>,
    },
    /// Print the assertion claims and NameID for a partner user
    Claims {
        /// Partner user as JSON, e.g. `{"id": "u-1", "userEmail": "a@b.c"}`
        #[arg(long)]
        user: String,
    },
    /// Print the sign-in redirect for an anonymous visit to a host page
    SignInRedirect {
        /// Host page URL (absolute, relative, or a bare query string)
        #[arg(long)]
        page_url: String,
    },
    /// Replay a JSON-lines message transcript through a headless controller
    Replay {
        /// Transcript file, one message per line
        transcript: PathBuf,
        /// Sections response served to the bootstrap
        #[arg(long)]
        sections: Option<PathBuf>,
        /// Host page URL, for deep links
        #[arg(long)]
        page_url: Option<String>,
    },
}

fn main() -> Result<()> {
    init_logging()?;

    let cli = Cli::parse();
    log::debug!(
        "embedding-host {} ({})",
        env!("CARGO_PKG_VERSION"),
        Environment::current()
    );

    match cli.command {
        Commands::Config => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::ResolveLanding {
            page_url,
            shared_link_prefix,
        } => {
            if let Some(target) = deep_link_target(&page_url, &shared_link_prefix) {
                println!("{target}");
            }
        }
        Commands::Sections { url, cookies } => {
            let config = Config::load()?;
            probe_sections(&config, &url, &cookies)?;
        }
        Commands::Claims { user } => {
            let user: PartnerUser =
                serde_json::from_str(&user).context("Invalid partner user JSON")?;
            let output = serde_json::json!({
                "claims": user.claims(),
                "nameId": user.name_identifier(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::SignInRedirect { page_url } => {
            println!("{}", sign_in_redirect_for_page(&page_url));
        }
        Commands::Replay {
            transcript,
            sections,
            page_url,
        } => {
            let config = Config::load()?;
            replay(config, &transcript, sections.as_deref(), page_url)?;
        }
    }

    Ok(())
}

/// Log to `EMBED_LOG_FILE` when set, stderr otherwise.
fn init_logging() -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format_timestamp_secs();
    if let Ok(path) = std::env::var("EMBED_LOG_FILE") {
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create log file at {path}"))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn probe_sections(config: &Config, url: &str, cookies: &[String]) -> Result<()> {
    let parsed = reqwest::Url::parse(url).with_context(|| format!("Invalid URL {url}"))?;
    let jar = Arc::new(reqwest::cookie::Jar::default());
    for cookie in cookies {
        jar.add_cookie_str(cookie, &parsed);
    }
    let client = build_client(config, jar)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let response = runtime.block_on(fetch_sections(&client, url))?;
    let menu = NavigationMenu::build(&response.available_sections);
    println!("{}", serde_json::to_string_pretty(&menu)?);
    Ok(())
}

fn replay(
    config: Config,
    transcript: &Path,
    sections: Option<&Path>,
    page_url: Option<String>,
) -> Result<()> {
    let sections: Option<SectionsResponse> = match sections {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Some(serde_json::from_str(&content).context("Invalid sections fixture")?)
        }
        None => None,
    };
    let content = std::fs::read_to_string(transcript)
        .with_context(|| format!("Failed to read {}", transcript.display()))?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let collaborator = StaticCollaborator::new(sections, tx);
    let mut controller = HostController::new(config, page_url, RecordingHost::new(), collaborator);

    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        let Some(event) = transcript_event(&controller, line) else {
            continue;
        };
        let mut running = controller.handle_event(event);
        while running {
            match rx.try_recv() {
                Ok(event) => running = controller.handle_event(event),
                Err(_) => break,
            }
        }
        if !running {
            break;
        }
    }

    for action in controller.host().actions() {
        println!("{}", serde_json::to_string(action)?);
    }
    let ctx = controller.context();
    let summary = serde_json::json!({
        "status": ctx.status(),
        "view": ctx.view(),
        "menu_entries": ctx.menu().map_or(0, NavigationMenu::entry_count),
        "keep_alive_active": ctx.keep_alive().is_active(),
        "finished": ctx.is_finished(),
    });
    println!("{summary}");
    Ok(())
}

/// Map one transcript line to a host event.
///
/// Directives: `{"navigate": id}`, `{"cleanup": true}`, `{"tick": true}`,
/// `{"foreign": payload}`. Anything else is a message from the app frame.
fn transcript_event(
    controller: &HostController<RecordingHost, StaticCollaborator>,
    line: &str,
) -> Option<HostEvent> {
    let app_message = || HostEvent::WindowMessage(InboundMessage::from_frame(FrameId::App, line));
    let Ok(value) = serde_json::from_str::<Value>(line) else {
        return Some(app_message());
    };

    if let Some(entry_id) = value.get("navigate").and_then(Value::as_str) {
        return Some(HostEvent::Navigate {
            entry_id: entry_id.to_string(),
        });
    }
    if value.get("cleanup").is_some() {
        return Some(HostEvent::Cleanup);
    }
    if value.get("tick").is_some() {
        let timer_id = controller.context().keep_alive().current_id();
        if timer_id.is_none() {
            log::warn!("Transcript tick with no keep-alive armed");
        }
        return timer_id.map(|timer_id| HostEvent::KeepAliveTick { timer_id });
    }
    if let Some(payload) = value.get("foreign") {
        return Some(HostEvent::WindowMessage(InboundMessage {
            source: MessageSource::Foreign,
            payload: payload.to_string(),
        }));
    }
    Some(app_message())
}
