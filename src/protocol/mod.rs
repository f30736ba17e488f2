//! Wire protocol between the host window and the embedded surface.
//!
//! - [`types`] - data issued by the collaborator (endpoints, sections, rooms)
//! - [`signals`] - inbound lifecycle signals and outbound control signals

pub mod signals;
pub mod types;

pub use signals::{
    decode_envelope, decode_payload, decode_raw, ControlSignal, FaultKind, FrameId,
    InboundMessage, InboundSignal, MessageSource, SignalCategory, SignalDecodeError,
    SignalEnvelope,
};
pub use types::{ApplicationSection, Room, SectionsResponse, SessionEndpoints};
