//! Error types for the protocol library.
//!
//! Message classification itself never fails (malformed lines become
//! [`Message::Unknown`](crate::Message::Unknown)); errors only arise while
//! framing bytes into lines.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Framing errors raised by the line codec.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Line exceeded the maximum allowed length.
    #[error("line too long: {actual} bytes (limit: {limit})")]
    LineTooLong {
        /// Observed length.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },
}
