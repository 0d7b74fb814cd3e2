//! Shared error type across chatrelay crates.

use thiserror::Error;

/// Stable error codes (logged and exposed in metrics labels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed envelope or media payload.
    DecodeError,
    /// Send attempted while the connection is not active.
    NotConnected,
    /// Transport failed or timed out.
    TransportError,
    /// Configuration rejected at load time.
    BadConfig,
    /// Unsupported config/protocol version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::DecodeError => "DECODE_ERROR",
            ErrorCode::NotConnected => "NOT_CONNECTED",
            ErrorCode::TransportError => "TRANSPORT_ERROR",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Unified error type used by core, client and dashboard.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("decode error: {0}")]
    Decode(String),
    #[error("not connected")]
    NotConnected,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl RelayError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            RelayError::Decode(_) => ErrorCode::DecodeError,
            RelayError::NotConnected => ErrorCode::NotConnected,
            RelayError::Transport(_) => ErrorCode::TransportError,
            RelayError::BadConfig(_) => ErrorCode::BadConfig,
            RelayError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            RelayError::Internal(_) => ErrorCode::Internal,
        }
    }
}
