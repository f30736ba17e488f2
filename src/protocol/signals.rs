//! Inbound lifecycle signals and outbound control signals.
//!
//! Two inbound transports decode to the same [`InboundSignal`]:
//!
//! ```text
//! raw window message   {"visier": {"messageType": "...", "data": {...}}}  ─┐
//!                                                                          ├─► InboundSignal
//! SDK event envelope   {"category": "...", "code": "...", "message": ...} ─┘
//! ```
//!
//! Outbound [`ControlSignal`]s always use the raw envelope, JSON-string encoded.
//!
//! Unknown codes inside a known category decode to
//! [`InboundSignal::Unrecognized`] so the dispatcher can log them. Unknown
//! categories and malformed payloads are decode errors, which callers log
//! and drop.

// Rust guideline compliant 2026-01

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::types::SessionEndpoints;

/// Which child frame a window message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameId {
    /// The frame performing the authentication handshake.
    Session,
    /// The frame hosting the main application.
    App,
}

/// Origin of a raw window message, as seen by the host window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSource {
    /// A frame whose parent is the host window.
    ChildFrame(FrameId),
    /// Anything else (other windows, grandchildren, unknown senders).
    Foreign,
}

/// A raw window message before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Where the message came from.
    pub source: MessageSource,
    /// JSON-string encoded payload.
    pub payload: String,
}

impl InboundMessage {
    /// Message from one of the host's own frames.
    pub fn from_frame(frame: FrameId, payload: impl Into<String>) -> Self {
        Self {
            source: MessageSource::ChildFrame(frame),
            payload: payload.into(),
        }
    }

    /// Whether the sender is a descendant frame of the host window.
    pub fn is_trusted(&self) -> bool {
        matches!(self.source, MessageSource::ChildFrame(_))
    }
}

/// Signal categories of the SDK envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalCategory {
    /// Session lifecycle.
    Session,
    /// Operational errors reported by the collaborator.
    Error,
    /// Informational events.
    Info,
    /// Diagnostics.
    Debug,
}

impl SignalCategory {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "session" => Some(Self::Session),
            "error" => Some(Self::Error),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            _ => None,
        }
    }
}

impl std::fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session => write!(f, "session"),
            Self::Error => write!(f, "error"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
        }
    }
}

/// Operational failures reported in the `error` category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultKind {
    /// The host container for the surface was not found.
    ContainerMissing,
    /// The surface URL was rejected.
    InvalidAppUrl,
    /// A collaborator step timed out; carries the full code (`*_TIMEOUT`).
    Timeout(String),
    /// The collaborator application is down.
    AppDown,
}

impl FaultKind {
    fn from_code(code: &str) -> Option<Self> {
        match code {
            "CONTAINER_MISSING" => Some(Self::ContainerMissing),
            "INVALID_APP_URL" => Some(Self::InvalidAppUrl),
            "APP_DOWN" => Some(Self::AppDown),
            c if c.ends_with("_TIMEOUT") => Some(Self::Timeout(c.to_string())),
            _ => None,
        }
    }

    /// Wire code of this fault.
    pub fn code(&self) -> &str {
        match self {
            Self::ContainerMissing => "CONTAINER_MISSING",
            Self::InvalidAppUrl => "INVALID_APP_URL",
            Self::Timeout(code) => code,
            Self::AppDown => "APP_DOWN",
        }
    }

    /// Message shown when the collaborator did not supply one.
    pub fn default_message(&self) -> String {
        match self {
            Self::ContainerMissing => "The embedding container is missing.".to_string(),
            Self::InvalidAppUrl => "The embedded application URL is invalid.".to_string(),
            Self::Timeout(code) => format!("The embedded application timed out ({code})."),
            Self::AppDown => crate::constants::APP_DOWN_MESSAGE.to_string(),
        }
    }
}

/// A decoded lifecycle signal from the embedded collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundSignal {
    /// Authentication succeeded. Endpoints are present on the raw transport
    /// and optional on the SDK transport.
    SessionEstablished {
        /// Endpoints for the new session.
        endpoints: Option<SessionEndpoints>,
    },
    /// Authentication failed.
    SessionError {
        /// Collaborator-supplied message.
        message: Option<String>,
        /// Technical detail, logged only.
        detail: Option<Value>,
    },
    /// The collaborator ended the session from its side.
    EjectSession {
        /// Collaborator-supplied message.
        message: Option<String>,
    },
    /// A new collaborator user was provisioned for this host user.
    AutoProvisionSucceeded,
    /// Provisioning a new collaborator user failed.
    AutoProvisionFailed {
        /// Collaborator-supplied message.
        message: Option<String>,
    },
    /// The user is active inside the surface.
    SessionAlive,
    /// The collaborator session expired.
    SessionExpired,
    /// Operational error from the `error` category.
    Fault {
        /// Which failure.
        kind: FaultKind,
        /// Collaborator-supplied message.
        message: Option<String>,
    },
    /// The main application finished its first load.
    AppLoaded,
    /// Diagnostic event.
    Debug {
        /// Debug code.
        code: String,
        /// Optional text.
        message: Option<String>,
    },
    /// A code this host does not know, inside a known category (or a raw
    /// message type with no mapping).
    Unrecognized {
        /// Category, when the transport carries one.
        category: Option<SignalCategory>,
        /// The code as received.
        code: String,
    },
}

impl InboundSignal {
    /// Short name for log lines.
    pub fn name(&self) -> &str {
        match self {
            Self::SessionEstablished { .. } => "SESSION_ESTABLISHED",
            Self::SessionError { .. } => "SESSION_ERROR",
            Self::EjectSession { .. } => "EJECT_SESSION",
            Self::AutoProvisionSucceeded => "USER_AUTO_PROVISION_SUCCESS",
            Self::AutoProvisionFailed { .. } => "USER_AUTO_PROVISION_FAILED",
            Self::SessionAlive => "VISIER_SESSION_ALIVE",
            Self::SessionExpired => "VISIER_SESSION_EXPIRED",
            Self::Fault { kind, .. } => kind.code(),
            Self::AppLoaded => "APP_LOADED",
            Self::Debug { code, .. } | Self::Unrecognized { code, .. } => code,
        }
    }
}

/// Why an inbound payload was dropped.
#[derive(Debug, Error)]
pub enum SignalDecodeError {
    /// Not valid JSON.
    #[error("message is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Valid JSON, but neither envelope shape.
    #[error("message is not a protocol envelope")]
    NotProtocol,
    /// Raw envelope without a message type.
    #[error("raw envelope has no messageType")]
    MissingMessageType,
    /// SDK envelope with a category this host does not handle.
    #[error("unknown signal category {0:?}")]
    UnknownCategory(String),
    /// Known code whose data did not match its payload shape.
    #[error("invalid payload for {code}: {source}")]
    InvalidPayload {
        /// Code whose payload failed.
        code: String,
        /// Underlying decode error.
        source: serde_json::Error,
    },
}

/// SDK-style event envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEnvelope {
    /// Category name.
    pub category: String,
    /// Code within the category.
    pub code: String,
    /// Optional human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Optional structured data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    visier: RawMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    #[serde(default)]
    message_type: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

/// Decode a JSON-string payload in either envelope shape.
pub fn decode_payload(payload: &str) -> Result<InboundSignal, SignalDecodeError> {
    let value: Value = serde_json::from_str(payload)?;
    if value.get("visier").is_some() {
        let raw: RawEnvelope = serde_json::from_value(value)?;
        let message_type = raw
            .visier
            .message_type
            .ok_or(SignalDecodeError::MissingMessageType)?;
        return decode_raw(&message_type, raw.visier.data);
    }
    if value.get("category").is_some() {
        let envelope: SignalEnvelope = serde_json::from_value(value)?;
        return decode_envelope(envelope);
    }
    Err(SignalDecodeError::NotProtocol)
}

/// Decode a raw window message by its `messageType`.
///
/// Message types are matched case-insensitively.
pub fn decode_raw(message_type: &str, data: Option<Value>) -> Result<InboundSignal, SignalDecodeError> {
    let code = message_type.to_ascii_uppercase();
    let signal = match code.as_str() {
        "SESSION_CONNECTED" => InboundSignal::SessionEstablished {
            endpoints: Some(parse_endpoints(&code, data.unwrap_or(Value::Null))?),
        },
        "AUTHENTICATION_ERROR" => InboundSignal::SessionError {
            message: None,
            detail: data,
        },
        "VISIER_SESSION_ALIVE" => InboundSignal::SessionAlive,
        "VISIER_SESSION_EXPIRED" => InboundSignal::SessionExpired,
        "VISIER_APP_LOADED" => InboundSignal::AppLoaded,
        "VISIER_APP_DOWN" => InboundSignal::Fault {
            kind: FaultKind::AppDown,
            message: None,
        },
        "USER_AUTOPROVISION_SUCCESS" => InboundSignal::AutoProvisionSucceeded,
        "USER_AUTOPROVISION_FAILED" => InboundSignal::AutoProvisionFailed { message: None },
        _ => InboundSignal::Unrecognized {
            category: None,
            code,
        },
    };
    Ok(signal)
}

/// Decode an SDK envelope.
pub fn decode_envelope(envelope: SignalEnvelope) -> Result<InboundSignal, SignalDecodeError> {
    let SignalEnvelope {
        category,
        code,
        message,
        data,
    } = envelope;
    let category =
        SignalCategory::parse(&category).ok_or(SignalDecodeError::UnknownCategory(category))?;

    let signal = match category {
        SignalCategory::Session => match code.as_str() {
            "SESSION_ESTABLISHED" => {
                let endpoints = match data {
                    None | Some(Value::Null) => None,
                    Some(value) => Some(parse_endpoints(&code, value)?),
                };
                InboundSignal::SessionEstablished { endpoints }
            }
            "SESSION_ERROR" => InboundSignal::SessionError {
                message,
                detail: data,
            },
            "EJECT_SESSION" => InboundSignal::EjectSession { message },
            "USER_AUTO_PROVISION_SUCCESS" => InboundSignal::AutoProvisionSucceeded,
            "USER_AUTO_PROVISION_FAILED" => InboundSignal::AutoProvisionFailed { message },
            "VISIER_SESSION_ALIVE" => InboundSignal::SessionAlive,
            "VISIER_SESSION_EXPIRED" => InboundSignal::SessionExpired,
            _ => unrecognized(category, code),
        },
        SignalCategory::Error => match FaultKind::from_code(&code) {
            Some(kind) => InboundSignal::Fault { kind, message },
            None => unrecognized(category, code),
        },
        SignalCategory::Info => match code.as_str() {
            "APP_LOADED" => InboundSignal::AppLoaded,
            _ => unrecognized(category, code),
        },
        SignalCategory::Debug => InboundSignal::Debug { code, message },
    };
    Ok(signal)
}

fn unrecognized(category: SignalCategory, code: String) -> InboundSignal {
    InboundSignal::Unrecognized {
        category: Some(category),
        code,
    }
}

fn parse_endpoints(code: &str, data: Value) -> Result<SessionEndpoints, SignalDecodeError> {
    serde_json::from_value(data).map_err(|source| SignalDecodeError::InvalidPayload {
        code: code.to_string(),
        source,
    })
}

/// Control signals the host posts to the embedded surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlSignal {
    /// Renew the collaborator session.
    ParentSessionAlive,
    /// Tear down the collaborator session.
    ParentSessionCleanup,
    /// Navigate the loaded surface to a section or room.
    Navigate {
        /// Section or room id.
        target_room: String,
    },
}

impl ControlSignal {
    /// Wire message type.
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::ParentSessionAlive => "PARENT_SESSION_ALIVE",
            Self::ParentSessionCleanup => "PARENT_SESSION_CLEANUP",
            Self::Navigate { .. } => "NAVIGATION",
        }
    }

    /// Raw envelope as a JSON value.
    pub fn to_envelope(&self) -> Value {
        let mut message = serde_json::json!({ "messageType": self.message_type() });
        match self {
            Self::ParentSessionAlive => {}
            Self::ParentSessionCleanup => {
                message["data"] = serde_json::json!({});
            }
            Self::Navigate { target_room } => {
                message["data"] = serde_json::json!({ "targetRoom": target_room });
            }
        }
        serde_json::json!({ "visier": message })
    }

    /// JSON-string encoded raw envelope, ready to post.
    pub fn to_wire(&self) -> String {
        self.to_envelope().to_string()
    }
}
