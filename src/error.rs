//! Error types for channeld.
//!
//! Nothing here is fatal to the server process: every error ends (at most)
//! a single connection. Each enum carries a static `error_code()` used as a
//! metrics label.

use channeld_proto::ProtocolError;
use thiserror::Error;

// ============================================================================
// Disconnect reasons
// ============================================================================

/// Why a connection was closed.
///
/// A connection records the first reason it is closed with; later close
/// attempts are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DisconnectReason {
    #[error("connection closed by client")]
    Eof,

    #[error("read error")]
    ReadError,

    #[error("write error")]
    WriteError,

    #[error("write deadline exceeded")]
    WriteTimeout,

    #[error("line too long")]
    LineTooLong,

    #[error("excess flood")]
    Flood,

    #[error("outbound queue full")]
    SendQueueFull,

    #[error("client quit")]
    Quit,

    #[error("registration failed")]
    HandshakeFailed,

    #[error("server shutting down")]
    Shutdown,
}

impl DisconnectReason {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Eof => "eof",
            Self::ReadError => "read_error",
            Self::WriteError => "write_error",
            Self::WriteTimeout => "write_timeout",
            Self::LineTooLong => "line_too_long",
            Self::Flood => "flood",
            Self::SendQueueFull => "sendq_full",
            Self::Quit => "quit",
            Self::HandshakeFailed => "handshake_failed",
            Self::Shutdown => "shutdown",
        }
    }
}

impl From<&ProtocolError> for DisconnectReason {
    fn from(err: &ProtocolError) -> Self {
        match err {
            ProtocolError::LineTooLong { .. } => Self::LineTooLong,
            _ => Self::ReadError,
        }
    }
}

// ============================================================================
// Handshake errors
// ============================================================================

/// Why a registration handshake failed.
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("client disconnected during registration")]
    Closed,

    #[error("client quit during registration")]
    Quit,

    #[error("transport error: {0}")]
    Transport(#[from] ProtocolError),

    #[error("write deadline exceeded")]
    WriteTimeout,

    #[error("no NICK and USER within {0} messages")]
    Incomplete(usize),

    #[error("nickname rejected {0} times")]
    TooManyAttempts(u32),

    #[error("registry unavailable")]
    RegistryGone,
}

impl HandshakeError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Quit => "quit",
            Self::Transport(_) => "transport",
            Self::WriteTimeout => "write_timeout",
            Self::Incomplete(_) => "incomplete",
            Self::TooManyAttempts(_) => "too_many_attempts",
            Self::RegistryGone => "registry_gone",
        }
    }

    /// The close reason recorded on the connection.
    pub fn disconnect_reason(&self) -> DisconnectReason {
        match self {
            Self::Closed => DisconnectReason::Eof,
            Self::Quit => DisconnectReason::Quit,
            Self::Transport(e) => DisconnectReason::from(e),
            Self::WriteTimeout => DisconnectReason::WriteTimeout,
            Self::Incomplete(_) | Self::TooManyAttempts(_) => DisconnectReason::HandshakeFailed,
            Self::RegistryGone => DisconnectReason::Shutdown,
        }
    }
}
