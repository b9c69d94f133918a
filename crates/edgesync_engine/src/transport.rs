//! Uplink transport abstraction.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use edgesync_protocol::OutboundEnvelope;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Carries outbound envelopes to the peer.
///
/// Delivery is assumed at least once and possibly reordered; the
/// receiving side is idempotent on top of it.
#[async_trait]
pub trait UplinkTransport: Send + Sync {
    /// Sends one envelope.
    async fn send(&self, envelope: OutboundEnvelope) -> SyncResult<()>;
}

/// In-process transport passing CBOR-encoded envelopes over a channel.
#[derive(Debug)]
pub struct LoopbackTransport {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    sent: AtomicU64,
}

/// Receiving end of a [`LoopbackTransport`].
#[derive(Debug)]
pub struct LoopbackReceiver {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl LoopbackTransport {
    /// Creates a connected transport and receiver.
    pub fn channel() -> (Self, LoopbackReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                sent: AtomicU64::new(0),
            },
            LoopbackReceiver { rx },
        )
    }

    /// Returns the number of envelopes sent.
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl UplinkTransport for LoopbackTransport {
    async fn send(&self, envelope: OutboundEnvelope) -> SyncResult<()> {
        let bytes = envelope.encode()?;
        self.tx
            .send(bytes)
            .map_err(|_| SyncError::transport_fatal("loopback peer disconnected"))?;
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl LoopbackReceiver {
    /// Waits for the next envelope. Returns `None` once the transport is
    /// dropped and drained.
    pub async fn recv(&mut self) -> Option<SyncResult<OutboundEnvelope>> {
        let bytes = self.rx.recv().await?;
        Some(OutboundEnvelope::decode(&bytes).map_err(SyncError::from))
    }

    /// Takes every envelope already delivered.
    pub fn drain(&mut self) -> SyncResult<Vec<OutboundEnvelope>> {
        let mut envelopes = Vec::new();
        while let Ok(bytes) = self.rx.try_recv() {
            envelopes.push(OutboundEnvelope::decode(&bytes)?);
        }
        Ok(envelopes)
    }
}

/// A transport for testing that records envelopes and can be told to fail.
#[derive(Debug, Default)]
pub struct MockTransport {
    sent: Mutex<Vec<OutboundEnvelope>>,
    failures: Mutex<VecDeque<SyncError>>,
    attempts: AtomicU64,
}

impl MockTransport {
    /// Creates a mock transport that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next sends fail with the given errors, in order.
    pub fn fail_next(&self, errors: impl IntoIterator<Item = SyncError>) {
        self.failures.lock().extend(errors);
    }

    /// Returns the envelopes accepted so far.
    pub fn sent(&self) -> Vec<OutboundEnvelope> {
        self.sent.lock().clone()
    }

    /// Returns the number of send attempts, failed ones included.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl UplinkTransport for MockTransport {
    async fn send(&self, envelope: OutboundEnvelope) -> SyncResult<()> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = self.failures.lock().pop_front() {
            return Err(err);
        }
        self.sent.lock().push(envelope);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgesync_protocol::{EntityKind, EntityUpdateMsg};

    fn envelope(id: u32) -> OutboundEnvelope {
        OutboundEnvelope::single(id, EntityUpdateMsg::delete(EntityKind::Asset, [4; 16]))
    }

    #[tokio::test]
    async fn loopback_round_trip() {
        let (transport, mut receiver) = LoopbackTransport::channel();
        transport.send(envelope(1)).await.unwrap();
        transport.send(envelope(2)).await.unwrap();
        assert_eq!(transport.sent_count(), 2);

        assert_eq!(receiver.recv().await.unwrap().unwrap(), envelope(1));
        assert_eq!(receiver.drain().unwrap(), vec![envelope(2)]);
    }

    #[tokio::test]
    async fn loopback_reports_disconnect() {
        let (transport, receiver) = LoopbackTransport::channel();
        drop(receiver);
        let err = transport.send(envelope(1)).await.unwrap_err();
        assert!(matches!(err, SyncError::Transport { retryable: false, .. }));
    }

    #[tokio::test]
    async fn mock_fails_then_accepts() {
        let transport = MockTransport::new();
        transport.fail_next([SyncError::transport_retryable("timeout")]);
        assert!(transport.send(envelope(1)).await.is_err());
        transport.send(envelope(1)).await.unwrap();
        assert_eq!(transport.attempts(), 2);
        assert_eq!(transport.sent().len(), 1);
    }
}
