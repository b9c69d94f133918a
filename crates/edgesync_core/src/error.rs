//! Error types for EdgeSync core.

use crate::ids::EntityId;
use edgesync_protocol::EntityKind;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The storage backend failed; the operation may succeed if retried.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the failure.
        message: String,
    },

    /// An entity failed validation before being written.
    #[error("invalid {kind} {id}: {reason}")]
    InvalidEntity {
        /// Kind of the rejected entity.
        kind: EntityKind,
        /// Id of the rejected entity.
        id: EntityId,
        /// Why it was rejected.
        reason: String,
    },

    /// The change-event queue is full; the write was not applied.
    #[error("event queue full ({limit} pending)")]
    QueueFull {
        /// Configured pending limit.
        limit: usize,
    },
}

impl CoreError {
    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates an invalid entity error.
    pub fn invalid_entity(kind: EntityKind, id: EntityId, reason: impl Into<String>) -> Self {
        Self::InvalidEntity {
            kind,
            id,
            reason: reason.into(),
        }
    }

    /// Returns true if retrying the operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::Storage { .. } | CoreError::QueueFull { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(CoreError::storage("disk full").is_transient());
        assert!(CoreError::QueueFull { limit: 8 }.is_transient());
        let err = CoreError::invalid_entity(
            EntityKind::Asset,
            EntityId::from_bytes([0; 16]),
            "empty name",
        );
        assert!(!err.is_transient());
        assert!(err.to_string().contains("asset"));
        assert!(err.to_string().contains("empty name"));
    }
}
