//! Error types for the sync engine.

use edgesync_core::{CoreError, EntityKind};
use edgesync_protocol::ProtocolError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// No translator is registered for the kind.
    #[error("no translator registered for {0}")]
    UnregisteredKind(EntityKind),

    /// A second translator was registered for the same kind.
    #[error("translator for {0} registered twice")]
    DuplicateTranslator(EntityKind),

    /// A message could not be interpreted.
    #[error("invalid {kind} payload: {reason}")]
    InvalidPayload {
        /// Kind the message claimed.
        kind: EntityKind,
        /// What was wrong with it.
        reason: String,
    },

    /// Local storage failed.
    #[error("store error: {0}")]
    Store(#[from] CoreError),

    /// Encoding or decoding failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The session the follow-up channel belonged to has gone away.
    #[error("follow-up channel closed")]
    ChannelClosed,

    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },
}

impl SyncError {
    /// Creates an invalid payload error.
    pub fn invalid_payload(kind: EntityKind, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            kind,
            reason: reason.into(),
        }
    }

    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Store(err) => err.is_transient(),
            _ => false,
        }
    }

    /// Returns true if the error means the node is misconfigured and
    /// processing should stop.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::UnregisteredKind(_) | SyncError::DuplicateTranslator(_)
        )
    }
}
