//! Error types for transpose-client.

use thiserror::Error;

/// Broad category of a [`ClientError`].
///
/// None of the categories is retried automatically; the class only tells the
/// caller how far the damage reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rejected locally before any byte hit the wire.
    LocalValidation,
    /// The response did not match the framing contract. Unread reply bytes
    /// may still be in the stream, so the session is unusable afterwards.
    Protocol,
    /// The byte stream itself failed. The session is unusable afterwards.
    Transport,
    /// The remote service answered with `status=1`.
    Remote,
    /// Configuration could not be loaded or holds an unusable value.
    Config,
}

/// Main error type for all client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Token count is not a perfect square.
    #[error("Matrix is not square: {count} elements")]
    NotSquare { count: usize },

    /// No supported numeric kind represents every token exactly.
    #[error("Type inference failed for token {token:?}: {reason}")]
    TypeInference { token: String, reason: String },

    /// Payload length disagrees with `dimension² · width`.
    #[error("Size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The index was never sent from this client.
    #[error("There was no matrix registered for index {0}")]
    UnknownIndex(u8),

    /// `start_calculation` without an index, but nothing is queued.
    #[error("No matrix has been sent that is waiting to be transposed")]
    NoPendingJob,

    /// `get_status` without an index, but nothing is running.
    #[error("There are no running jobs to check the status of")]
    NoRunningJob,

    /// A caller-supplied argument was rejected.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unexpected status byte, phase byte, or frame shape.
    #[error("Protocol error: {0}")]
    ProtocolViolation(String),

    /// A single write did not transfer the whole frame.
    #[error("Sent only {sent} bytes out of {expected}")]
    ShortWrite { sent: usize, expected: usize },

    /// Zero-length read: the remote endpoint closed the connection.
    #[error("The server disconnected")]
    RemoteClosed,

    /// The remote service rejected the request.
    #[error("Remote error: {0}")]
    Remote(String),

    /// JSON configuration error.
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Classify this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            ClientError::NotSquare { .. }
            | ClientError::TypeInference { .. }
            | ClientError::UnknownIndex(_)
            | ClientError::NoPendingJob
            | ClientError::NoRunningJob
            | ClientError::InvalidArgument(_) => ErrorClass::LocalValidation,
            ClientError::ProtocolViolation(_) | ClientError::SizeMismatch { .. } => {
                ErrorClass::Protocol
            }
            ClientError::Io(_) | ClientError::ShortWrite { .. } | ClientError::RemoteClosed => {
                ErrorClass::Transport
            }
            ClientError::Remote(_) => ErrorClass::Remote,
            ClientError::Config(_) | ClientError::InvalidConfig(_) => ErrorClass::Config,
        }
    }

    /// Whether the connection must be abandoned after this error.
    #[inline]
    pub fn is_fatal_to_session(&self) -> bool {
        matches!(self.class(), ErrorClass::Transport | ErrorClass::Protocol)
    }

    pub(crate) fn inference(token: &str, reason: impl Into<String>) -> Self {
        ClientError::TypeInference {
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using ClientError.
pub type Result<T> = std::result::Result<T, ClientError>;
