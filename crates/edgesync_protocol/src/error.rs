//! Error types for the wire protocol.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Encoding to CBOR failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// Decoding from CBOR failed.
    #[error("decode error: {0}")]
    Decode(String),

    /// The message decoded but violates a structural rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl ProtocolError {
    /// Creates an invalid message error.
    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self::InvalidMessage(message.into())
    }
}

impl<T: std::fmt::Debug> From<ciborium::ser::Error<T>> for ProtocolError {
    fn from(err: ciborium::ser::Error<T>) -> Self {
        Self::Encode(err.to_string())
    }
}

impl<T: std::fmt::Debug> From<ciborium::de::Error<T>> for ProtocolError {
    fn from(err: ciborium::de::Error<T>) -> Self {
        Self::Decode(err.to_string())
    }
}
