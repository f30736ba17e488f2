//! Embedding Host - host-side session lifecycle for an embedded analytics
//! application.
//!
//! A partner page embeds the collaborator's application in frames. After
//! single sign-on establishes the embedded session, the host and the surface
//! coordinate over a message channel: bootstrap, keep-alive, navigation,
//! and expiry or cleanup.
//!
//! # Architecture
//!
//! - **Protocol** - typed inbound signals and outbound control signals
//! - **Host** - controller, explicit session context, dispatcher
//! - **Collaborator** - sections and logoff HTTP calls
//! - **Claims** - partner user to assertion attributes
//!
//! # Modules
//!
//! - [`protocol`] - wire types and decoding
//! - [`host`] - controller and state machine
//! - [`collaborator`] - HTTP calls to the embedded collaborator
//! - [`config`] - configuration loading

pub mod claims;
pub mod collaborator;
pub mod config;
pub mod constants;
pub mod env;
pub mod error;
pub mod host;
pub mod protocol;

// Re-export commonly used types
pub use collaborator::{Collaborator, HttpCollaborator, StaticCollaborator};
pub use config::Config;
pub use error::{EmbedError, EmbedResult};
pub use host::{
    EmbeddingHost, EmbeddingStatus, HostController, HostEvent, RecordingHost, SessionContext,
    ViewAction, ViewState,
};
pub use protocol::{ControlSignal, InboundMessage, InboundSignal};
