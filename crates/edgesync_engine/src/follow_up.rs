//! Follow-up data requests.
//!
//! Some updates cannot carry everything the receiving node needs (device
//! attributes, user credentials). After applying such an update the node
//! asks the peer for the rest, naming the causal-start marker the reply
//! must not predate.
//!
//! The channel returned by [`channel`] merges requests for the same
//! `(tenant, kind, id)` while one is still waiting to be taken, keeping the
//! larger marker.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use edgesync_core::{EntityId, EntityKind, TenantId};
use edgesync_protocol::DataRequestMsg;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A request for data an update did not inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowUpRequest {
    /// Tenant the entity belongs to.
    pub tenant_id: TenantId,
    /// Kind of the entity.
    pub kind: EntityKind,
    /// The entity.
    pub entity_id: EntityId,
    /// Local change-log sequence when the update arrived; see
    /// [`DataRequestMsg::causal_start`](edgesync_protocol::DataRequestMsg).
    pub causal_start: u64,
}

type RequestKey = (TenantId, EntityKind, EntityId);

impl FollowUpRequest {
    fn key(&self) -> RequestKey {
        (self.tenant_id, self.kind, self.entity_id)
    }

    /// Converts to the wire request sent to the peer.
    pub fn to_data_request(&self) -> DataRequestMsg {
        DataRequestMsg {
            kind: self.kind,
            entity_id: self.entity_id.to_bytes(),
            causal_start: self.causal_start,
        }
    }
}

/// Sends follow-up requests to the peer's data service.
#[async_trait]
pub trait FollowUpRequester: Send + Sync {
    /// Queues a request.
    ///
    /// # Errors
    ///
    /// Returns `ChannelClosed` if the session has gone away.
    async fn request(&self, request: FollowUpRequest) -> SyncResult<()>;
}

#[derive(Debug, Default)]
struct Pending {
    markers: HashMap<RequestKey, u64>,
}

/// Sending half of a follow-up channel.
#[derive(Debug, Clone)]
pub struct ChannelRequester {
    tx: mpsc::UnboundedSender<FollowUpRequest>,
    pending: Arc<Mutex<Pending>>,
    coalesce: bool,
    coalesced: Arc<AtomicU64>,
}

/// Receiving half of a follow-up channel.
#[derive(Debug)]
pub struct FollowUpReceiver {
    rx: mpsc::UnboundedReceiver<FollowUpRequest>,
    pending: Arc<Mutex<Pending>>,
}

/// Creates a coalescing follow-up channel.
pub fn channel() -> (ChannelRequester, FollowUpReceiver) {
    channel_with(true)
}

/// Creates a follow-up channel, coalescing pending requests if asked to.
pub fn channel_with(coalesce: bool) -> (ChannelRequester, FollowUpReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let pending = Arc::new(Mutex::new(Pending::default()));
    (
        ChannelRequester {
            tx,
            pending: Arc::clone(&pending),
            coalesce,
            coalesced: Arc::new(AtomicU64::new(0)),
        },
        FollowUpReceiver { rx, pending },
    )
}

impl ChannelRequester {
    /// Returns how many requests were merged into a pending one.
    pub fn coalesced_count(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }

    fn send(&self, request: FollowUpRequest) -> SyncResult<()> {
        self.tx.send(request).map_err(|_| SyncError::ChannelClosed)
    }
}

#[async_trait]
impl FollowUpRequester for ChannelRequester {
    async fn request(&self, request: FollowUpRequest) -> SyncResult<()> {
        if self.tx.is_closed() {
            tracing::warn!(
                kind = %request.kind,
                entity_id = %request.entity_id,
                "follow-up channel closed"
            );
            return Err(SyncError::ChannelClosed);
        }
        if !self.coalesce {
            return self.send(request);
        }

        let mut pending = self.pending.lock();
        match pending.markers.get_mut(&request.key()) {
            Some(marker) => {
                *marker = (*marker).max(request.causal_start);
                self.coalesced.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(
                    kind = %request.kind,
                    entity_id = %request.entity_id,
                    "follow-up merged"
                );
                Ok(())
            }
            None => {
                self.send(request)?;
                pending.markers.insert(request.key(), request.causal_start);
                Ok(())
            }
        }
    }
}

impl FollowUpReceiver {
    /// Waits for the next request. Returns `None` once every requester is
    /// gone and the queue is empty.
    pub async fn recv(&mut self) -> Option<FollowUpRequest> {
        let request = self.rx.recv().await?;
        Some(self.take(request))
    }

    /// Takes the next request if one is queued.
    pub fn try_recv(&mut self) -> Option<FollowUpRequest> {
        let request = self.rx.try_recv().ok()?;
        Some(self.take(request))
    }

    /// Takes every queued request.
    pub fn drain(&mut self) -> Vec<FollowUpRequest> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    fn take(&self, mut request: FollowUpRequest) -> FollowUpRequest {
        if let Some(marker) = self.pending.lock().markers.remove(&request.key()) {
            request.causal_start = request.causal_start.max(marker);
        }
        request
    }
}
