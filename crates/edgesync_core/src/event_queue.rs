//! Ordered queue of pending change events.
//!
//! The queue is the local change log that outbound synchronization drains.
//! Events are appended by the store's change hook after a local mutation
//! commits, read in sequence order to build outbound messages, and retired
//! once the peer has been sent them. An event that fails to send is simply
//! left pending and read again, so delivery is at least once.
//!
//! A full queue refuses new local changes rather than losing pending ones;
//! the store fails the write and the caller may retry once the queue drains.

use crate::config::QueueConfig;
use crate::echo_guard;
use crate::error::{CoreError, CoreResult};
use crate::ids::{EntityId, TenantId};
use edgesync_protocol::{ChangeAction, ChangeEvent, EntityKind};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<ChangeEvent>,
    last_sequence: u64,
}

/// Pending change events in sequence order.
#[derive(Debug)]
pub struct EventQueue {
    state: RwLock<QueueState>,
    notify: Notify,
    config: QueueConfig,
    suppressed: AtomicU64,
    refused: AtomicU64,
}

impl EventQueue {
    /// Creates an empty queue with default configuration.
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// Creates an empty queue.
    pub fn with_config(config: QueueConfig) -> Self {
        Self {
            state: RwLock::new(QueueState::default()),
            notify: Notify::new(),
            config,
            suppressed: AtomicU64::new(0),
            refused: AtomicU64::new(0),
        }
    }

    /// Records a local change.
    ///
    /// Returns the assigned sequence, or `None` when the current task is
    /// applying an inbound message and the change must not be echoed back.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::QueueFull`] when `max_pending` events are
    /// already waiting. Nothing is recorded and no sequence is consumed.
    pub fn record(
        &self,
        tenant_id: TenantId,
        kind: EntityKind,
        entity_id: EntityId,
        action: ChangeAction,
    ) -> CoreResult<Option<u64>> {
        if echo_guard::is_active() {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(%kind, %entity_id, ?action, "change applied from peer, not recorded");
            return Ok(None);
        }

        let sequence = {
            let mut state = self.state.write();
            if state.pending.len() >= self.config.max_pending {
                self.refused.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    %kind,
                    %entity_id,
                    limit = self.config.max_pending,
                    "event queue full, refusing local change"
                );
                return Err(CoreError::QueueFull {
                    limit: self.config.max_pending,
                });
            }
            state.last_sequence += 1;
            let sequence = state.last_sequence;
            state.pending.push_back(
                ChangeEvent::new(tenant_id.to_bytes(), kind, entity_id.to_bytes(), action)
                    .with_sequence(sequence),
            );
            sequence
        };

        tracing::trace!(sequence, %kind, %entity_id, ?action, "change recorded");
        self.notify.notify_waiters();
        Ok(Some(sequence))
    }

    /// Returns up to `limit` pending events, oldest first.
    pub fn pending(&self, limit: usize) -> Vec<ChangeEvent> {
        self.state
            .read()
            .pending
            .iter()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Retires the event with the given sequence.
    ///
    /// Returns false if no such event is pending; retiring twice is harmless.
    pub fn retire(&self, sequence: u64) -> bool {
        let mut state = self.state.write();
        match state
            .pending
            .binary_search_by_key(&sequence, |event| event.sequence)
        {
            Ok(index) => {
                state.pending.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    /// Retires every pending event with a sequence up to and including
    /// `sequence`. Returns how many were retired.
    pub fn retire_up_to(&self, sequence: u64) -> usize {
        let mut state = self.state.write();
        let count = state
            .pending
            .iter()
            .take_while(|event| event.sequence <= sequence)
            .count();
        state.pending.drain(..count);
        count
    }

    /// Returns the most recently assigned sequence (0 if none).
    ///
    /// This is the causal-start marker for follow-up requests. It is only
    /// meaningful to this queue; the peer has its own sequence space.
    pub fn latest_sequence(&self) -> u64 {
        self.state.read().last_sequence
    }

    /// Returns the number of pending events.
    pub fn len(&self) -> usize {
        self.state.read().pending.len()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waits until at least one event is pending.
    pub async fn wait_for_events(&self) {
        loop {
            let notified = self.notify.notified();
            if !self.is_empty() {
                return;
            }
            notified.await;
        }
    }

    /// Returns how many changes were not recorded because the echo guard
    /// was active.
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }

    /// Returns how many local changes were refused because the queue was
    /// full.
    pub fn refused_count(&self) -> u64 {
        self.refused.load(Ordering::Relaxed)
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn record(queue: &EventQueue, action: ChangeAction) -> Option<u64> {
        queue
            .record(TenantId::new(), EntityKind::Asset, EntityId::new(), action)
            .unwrap()
    }

    #[test]
    fn sequences_increase() {
        let queue = EventQueue::new();
        assert_eq!(queue.latest_sequence(), 0);
        assert_eq!(record(&queue, ChangeAction::Created), Some(1));
        assert_eq!(record(&queue, ChangeAction::Updated), Some(2));
        assert_eq!(queue.latest_sequence(), 2);

        let pending = queue.pending(10);
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].sequence, 1);
        assert_eq!(pending[1].action, ChangeAction::Updated);
    }

    #[test]
    fn pending_respects_limit() {
        let queue = EventQueue::new();
        for _ in 0..5 {
            record(&queue, ChangeAction::Created);
        }
        assert_eq!(queue.pending(3).len(), 3);
        assert_eq!(queue.len(), 5);
    }

    #[test]
    fn retire_single_and_range() {
        let queue = EventQueue::new();
        for _ in 0..5 {
            record(&queue, ChangeAction::Created);
        }
        assert!(queue.retire(3));
        assert!(!queue.retire(3));
        assert_eq!(queue.retire_up_to(4), 3);
        let left: Vec<_> = queue.pending(10).iter().map(|e| e.sequence).collect();
        assert_eq!(left, vec![5]);
        // sequences are not reused after retirement
        assert_eq!(record(&queue, ChangeAction::Deleted), Some(6));
    }

    #[test]
    fn guarded_changes_are_suppressed() {
        let queue = EventQueue::new();
        let seq = echo_guard::sync_guarded(|| record(&queue, ChangeAction::Created));
        assert_eq!(seq, None);
        assert!(queue.is_empty());
        assert_eq!(queue.suppressed_count(), 1);
        assert_eq!(queue.latest_sequence(), 0);
    }

    #[test]
    fn full_queue_refuses_without_losing_pending() {
        let queue = EventQueue::with_config(QueueConfig::new().max_pending(2));
        record(&queue, ChangeAction::Created);
        record(&queue, ChangeAction::Updated);

        let err = queue
            .record(TenantId::new(), EntityKind::Asset, EntityId::new(), ChangeAction::Created)
            .unwrap_err();
        assert!(matches!(err, CoreError::QueueFull { limit: 2 }));
        assert!(err.is_transient());
        assert_eq!(queue.refused_count(), 1);

        let seqs: Vec<_> = queue.pending(10).iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![1, 2]);
        assert_eq!(queue.latest_sequence(), 2);

        assert!(queue.retire(1));
        assert_eq!(record(&queue, ChangeAction::Created), Some(3));
    }

    #[test]
    fn full_queue_still_suppresses_guarded_changes() {
        let queue = EventQueue::with_config(QueueConfig::new().max_pending(1));
        record(&queue, ChangeAction::Created);
        let seq = echo_guard::sync_guarded(|| {
            queue.record(TenantId::new(), EntityKind::Asset, EntityId::new(), ChangeAction::Updated)
        });
        assert_eq!(seq.unwrap(), None);
        assert_eq!(queue.refused_count(), 0);
    }

    #[tokio::test]
    async fn wait_returns_when_event_recorded() {
        let queue = Arc::new(EventQueue::new());
        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.wait_for_events().await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        record(&queue, ChangeAction::Created);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn wait_returns_immediately_when_pending() {
        let queue = EventQueue::new();
        record(&queue, ChangeAction::Created);
        tokio::time::timeout(Duration::from_millis(100), queue.wait_for_events())
            .await
            .unwrap();
    }

    proptest::proptest! {
        #[test]
        fn pending_stays_ordered(ops in proptest::collection::vec(0u8..4, 1..64)) {
            let queue = EventQueue::new();
            for op in ops {
                if op == 0 {
                    if let Some(first) = queue.pending(1).first() {
                        queue.retire(first.sequence);
                    }
                } else {
                    record(&queue, ChangeAction::Updated);
                }
            }
            let seqs: Vec<_> = queue.pending(usize::MAX).iter().map(|e| e.sequence).collect();
            proptest::prop_assert!(seqs.windows(2).all(|w| w[0] < w[1]));
            proptest::prop_assert!(seqs.last().map_or(true, |last| *last == queue.latest_sequence()));
        }
    }
}
