//! Error types for collaborator calls and payload decoding.

use thiserror::Error;

/// Errors raised while talking to the embedded collaborator.
///
/// None of these are fatal to the host: the controller routes every one of
/// them to the error surface.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The sections response was empty or its first entry had no URL.
    #[error("no usable application sections in response")]
    SectionsUnavailable,

    /// The collaborator answered with a non-success status.
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// Transport-level failure (connect, timeout, TLS).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A payload could not be decoded.
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result alias for collaborator operations.
pub type EmbedResult<T> = Result<T, EmbedError>;
