//! Event queue configuration.

/// Configuration for an [`EventQueue`](crate::EventQueue).
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Maximum number of pending events; further local changes are refused
    /// until some are retired.
    pub max_pending: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_pending: 100_000,
        }
    }
}

impl QueueConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pending event limit (at least 1).
    #[must_use]
    pub const fn max_pending(mut self, limit: usize) -> Self {
        self.max_pending = if limit == 0 { 1 } else { limit };
        self
    }
}
