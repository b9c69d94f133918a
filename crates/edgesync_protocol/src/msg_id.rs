//! Positive message id allocation.

use std::sync::atomic::{AtomicU32, Ordering};

/// Largest id handed out; peers store ids as signed 32-bit integers.
const MAX_MESSAGE_ID: u32 = i32::MAX as u32;

/// Allocates message ids for one session.
///
/// Ids start at 1, increase by one per envelope and wrap back to 1 after
/// `i32::MAX`, so they are always positive.
#[derive(Debug)]
pub struct MessageIdGenerator {
    next: AtomicU32,
}

impl MessageIdGenerator {
    /// Creates a generator starting at 1.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates a generator whose first id is `first` (clamped into range).
    pub fn starting_at(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first.clamp(1, MAX_MESSAGE_ID)),
        }
    }

    /// Returns the next positive id.
    pub fn next_positive(&self) -> u32 {
        let mut current = self.next.load(Ordering::Relaxed);
        loop {
            let following = if current >= MAX_MESSAGE_ID {
                1
            } else {
                current + 1
            };
            match self.next.compare_exchange_weak(
                current,
                following,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return current,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for MessageIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
