//! Test nodes and links.
//!
//! A [`TestNode`] is one side of the replication: in-memory stores, the
//! standard translator registry, a coordinator and the receiving end of its
//! follow-up channel. A [`TestLink`] connects an edge node to a cloud node
//! of the same tenant and moves envelopes between them through the CBOR
//! codec, the way a real transport would.

use edgesync_core::{EventQueue, Stores, TenantId};
use edgesync_engine::follow_up::{self, ChannelRequester, FollowUpReceiver, FollowUpRequest};
use edgesync_engine::{
    InboundOutcome, SyncConfig, SyncCoordinator, SyncResult, TranslatorRegistry,
};
use edgesync_protocol::{InboundEnvelope, OutboundEnvelope};
use parking_lot::Mutex;
use std::sync::Arc;

/// One synchronizing node backed by in-memory stores.
pub struct TestNode {
    /// Node name.
    pub name: String,
    /// Tenant the node replicates.
    pub tenant_id: TenantId,
    /// Local repositories and event queue.
    pub stores: Stores,
    /// The node's coordinator.
    pub coordinator: Arc<SyncCoordinator>,
    requester: ChannelRequester,
    follow_ups: Mutex<FollowUpReceiver>,
}

impl TestNode {
    /// Creates a node with the standard registry.
    pub fn new(name: impl Into<String>, tenant_id: TenantId) -> Self {
        Self::with_config(name, tenant_id, &SyncConfig::default())
    }

    /// Creates a node with the standard registry and the given config.
    pub fn with_config(name: impl Into<String>, tenant_id: TenantId, config: &SyncConfig) -> Self {
        Self::with_registry(name, tenant_id, config, TranslatorRegistry::standard)
    }

    /// Creates a node whose registry is built by `registry`.
    pub fn with_registry(
        name: impl Into<String>,
        tenant_id: TenantId,
        config: &SyncConfig,
        registry: impl FnOnce(&Stores) -> TranslatorRegistry,
    ) -> Self {
        let stores = Stores::in_memory(Arc::new(EventQueue::new()));
        Self::with_stores(name, tenant_id, config, stores, registry)
    }

    /// Creates a node over existing stores.
    pub fn with_stores(
        name: impl Into<String>,
        tenant_id: TenantId,
        config: &SyncConfig,
        stores: Stores,
        registry: impl FnOnce(&Stores) -> TranslatorRegistry,
    ) -> Self {
        let (requester, receiver) = follow_up::channel_with(config.coalesce_follow_ups);
        let coordinator = Arc::new(SyncCoordinator::new(
            registry(&stores),
            Arc::new(requester.clone()),
        ));
        Self {
            name: name.into(),
            tenant_id,
            stores,
            coordinator,
            requester,
            follow_ups: Mutex::new(receiver),
        }
    }

    /// Builds envelopes for every pending change event and retires them.
    pub async fn outbound(&self) -> SyncResult<Vec<OutboundEnvelope>> {
        let mut envelopes = Vec::new();
        for event in self.stores.events.pending(usize::MAX) {
            if let Some(envelope) = self.coordinator.build_outbound(&event).await? {
                envelopes.push(envelope);
            }
            self.stores.events.retire(event.sequence);
        }
        Ok(envelopes)
    }

    /// Applies an envelope sent by the peer.
    ///
    /// The causal-start marker is this node's own queue position at arrival,
    /// never a sequence from the sender's queue.
    pub async fn receive(
        &self,
        envelope: &OutboundEnvelope,
    ) -> SyncResult<Vec<SyncResult<InboundOutcome>>> {
        let bytes = envelope.encode()?;
        let decoded = OutboundEnvelope::decode(&bytes)?;
        let inbound = InboundEnvelope::from_outbound(&decoded);
        let causal_start = self.stores.events.latest_sequence();
        self.coordinator
            .process_envelope(self.tenant_id, None, &inbound, causal_start)
            .await
    }

    /// Takes every follow-up request queued so far.
    pub fn take_follow_ups(&self) -> Vec<FollowUpRequest> {
        self.follow_ups.lock().drain()
    }

    /// Returns how many follow-up requests were merged.
    pub fn coalesced_follow_ups(&self) -> u64 {
        self.requester.coalesced_count()
    }

    /// Returns the number of pending change events.
    pub fn pending_events(&self) -> usize {
        self.stores.events.len()
    }
}

impl std::fmt::Debug for TestNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestNode")
            .field("name", &self.name)
            .field("tenant_id", &self.tenant_id)
            .field("pending_events", &self.pending_events())
            .finish_non_exhaustive()
    }
}

/// An edge and a cloud node replicating the same tenant.
#[derive(Debug)]
pub struct TestLink {
    /// The edge node.
    pub edge: TestNode,
    /// The cloud node.
    pub cloud: TestNode,
}

impl TestLink {
    /// Creates two nodes sharing a fresh tenant.
    pub fn new() -> Self {
        Self::with_config(&SyncConfig::default())
    }

    /// Creates two nodes sharing a fresh tenant and config.
    pub fn with_config(config: &SyncConfig) -> Self {
        let tenant_id = TenantId::new();
        Self {
            edge: TestNode::with_config("edge", tenant_id, config),
            cloud: TestNode::with_config("cloud", tenant_id, config),
        }
    }

    /// Returns the shared tenant.
    pub fn tenant_id(&self) -> TenantId {
        self.edge.tenant_id
    }

    /// Moves the edge's pending changes to the cloud. Returns the number of
    /// envelopes delivered.
    pub async fn sync_edge_to_cloud(&self) -> usize {
        Self::deliver(&self.edge, &self.cloud).await
    }

    /// Moves the cloud's pending changes to the edge.
    pub async fn sync_cloud_to_edge(&self) -> usize {
        Self::deliver(&self.cloud, &self.edge).await
    }

    /// Syncs both ways until neither side has anything to send.
    pub async fn sync_until_quiet(&self) -> usize {
        let mut total = 0;
        loop {
            let moved = self.sync_edge_to_cloud().await + self.sync_cloud_to_edge().await;
            if moved == 0 {
                return total;
            }
            total += moved;
        }
    }

    async fn deliver(from: &TestNode, to: &TestNode) -> usize {
        let envelopes = from.outbound().await.expect("build outbound envelopes");
        for envelope in &envelopes {
            for result in to.receive(envelope).await.expect("receive envelope") {
                result.expect("apply inbound message");
            }
        }
        envelopes.len()
    }
}

impl Default for TestLink {
    fn default() -> Self {
        Self::new()
    }
}
