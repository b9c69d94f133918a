//! Sync coordinator.
//!
//! Entry point for both directions of entity synchronization:
//!
//! - inbound, a peer message is routed to its kind's translator and applied
//!   inside the echo guard, so the local write is not recorded as a new
//!   change; if the translator reports missing dependent data, a follow-up
//!   request is queued;
//! - outbound, a recorded change event is turned into a message by its
//!   kind's translator and wrapped in an envelope with a fresh message id.

use crate::error::{SyncError, SyncResult};
use crate::follow_up::{FollowUpRequest, FollowUpRequester};
use crate::registry::TranslatorRegistry;
use crate::translator::{ApplyOutcome, InboundContext};
use edgesync_core::{echo_guard, ChangeEvent, CustomerId, EntityId, EntityKind, TenantId};
use edgesync_protocol::{
    EntityUpdateMsg, InboundEnvelope, MessageIdGenerator, OutboundEnvelope, UplinkPayload,
};
use std::sync::Arc;

/// Processing state of one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState {
    /// Message has arrived.
    Received,
    /// Translator is applying it under the echo guard.
    Applying,
    /// Applied; dependent data was requested from the peer.
    FollowUpRequested,
    /// Applied (or reported unsupported) with nothing left to do.
    Done,
    /// Could not be resolved, parsed or stored.
    Failed,
}

impl MessageState {
    /// Returns true if moving to `next` is legal.
    pub fn can_transition_to(&self, next: MessageState) -> bool {
        use MessageState::*;
        matches!(
            (*self, next),
            (Received, Applying)
                | (Received, Failed)
                | (Applying, Done)
                | (Applying, FollowUpRequested)
                | (Applying, Failed)
        )
    }

    /// Returns true if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MessageState::Done | MessageState::FollowUpRequested | MessageState::Failed
        )
    }
}

/// Result of processing one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Applied with nothing left to do.
    Done,
    /// Applied; the request was queued.
    FollowUpRequested(FollowUpRequest),
    /// Action code not understood; nothing was changed.
    Unsupported {
        /// The raw action code.
        raw: u8,
    },
}

/// Tracks one message through its states.
struct MessageTrace {
    state: MessageState,
    kind: EntityKind,
    entity_id: EntityId,
}

impl MessageTrace {
    fn new(msg: &EntityUpdateMsg) -> Self {
        Self {
            state: MessageState::Received,
            kind: msg.kind,
            entity_id: EntityId::from_bytes(msg.entity_id),
        }
    }

    fn advance(&mut self, next: MessageState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {next:?}",
            self.state
        );
        tracing::trace!(
            kind = %self.kind,
            entity_id = %self.entity_id,
            from = ?self.state,
            to = ?next,
            "message state"
        );
        self.state = next;
    }
}

/// Routes inbound messages to translators and builds outbound envelopes.
pub struct SyncCoordinator {
    registry: TranslatorRegistry,
    follow_ups: Arc<dyn FollowUpRequester>,
    message_ids: MessageIdGenerator,
}

impl SyncCoordinator {
    /// Creates a coordinator.
    pub fn new(registry: TranslatorRegistry, follow_ups: Arc<dyn FollowUpRequester>) -> Self {
        Self {
            registry,
            follow_ups,
            message_ids: MessageIdGenerator::new(),
        }
    }

    /// Returns the registry.
    pub fn registry(&self) -> &TranslatorRegistry {
        &self.registry
    }

    /// Returns a fresh positive message id.
    pub fn next_message_id(&self) -> u32 {
        self.message_ids.next_positive()
    }

    /// Applies one message from the peer.
    ///
    /// `causal_start` is the local queue position the follow-up reply, if
    /// one is requested, must not predate.
    ///
    /// # Errors
    ///
    /// `UnregisteredKind` if no translator handles the kind, otherwise
    /// whatever the translator or the follow-up channel fails with.
    pub async fn process_inbound(
        &self,
        tenant_id: TenantId,
        owner_hint: Option<CustomerId>,
        msg: &EntityUpdateMsg,
        causal_start: u64,
    ) -> SyncResult<InboundOutcome> {
        let mut trace = MessageTrace::new(msg);

        let translator = match self.registry.resolve(msg.kind) {
            Ok(translator) => translator,
            Err(err) => {
                trace.advance(MessageState::Failed);
                return Err(err);
            }
        };

        trace.advance(MessageState::Applying);
        let ctx = InboundContext::new(tenant_id).with_owner_hint(owner_hint);
        let applied = echo_guard::guarded(translator.apply_inbound(&ctx, msg)).await;

        let outcome = match applied {
            Ok(outcome) => outcome,
            Err(err) => {
                trace.advance(MessageState::Failed);
                return Err(err);
            }
        };

        match outcome {
            ApplyOutcome::Applied { follow_up: true } => {
                let request = FollowUpRequest {
                    tenant_id,
                    kind: msg.kind,
                    entity_id: trace.entity_id,
                    causal_start,
                };
                if let Err(err) = self.follow_ups.request(request).await {
                    trace.advance(MessageState::Failed);
                    return Err(err);
                }
                trace.advance(MessageState::FollowUpRequested);
                Ok(InboundOutcome::FollowUpRequested(request))
            }
            ApplyOutcome::Unsupported { raw } => {
                trace.advance(MessageState::Done);
                Ok(InboundOutcome::Unsupported { raw })
            }
            ApplyOutcome::Applied { follow_up: false }
            | ApplyOutcome::Deleted
            | ApplyOutcome::AlreadyAbsent => {
                trace.advance(MessageState::Done);
                Ok(InboundOutcome::Done)
            }
        }
    }

    /// Applies every message of an envelope in order.
    ///
    /// A failed or unsupported message does not stop the rest; an
    /// unregistered kind aborts the envelope.
    pub async fn process_envelope(
        &self,
        tenant_id: TenantId,
        owner_hint: Option<CustomerId>,
        envelope: &InboundEnvelope,
        causal_start: u64,
    ) -> SyncResult<Vec<SyncResult<InboundOutcome>>> {
        let mut results = Vec::with_capacity(envelope.messages.len());
        for msg in &envelope.messages {
            let result = self
                .process_inbound(tenant_id, owner_hint, msg, causal_start)
                .await;
            match result {
                Err(SyncError::UnregisteredKind(kind)) => {
                    tracing::error!(
                        message_id = envelope.message_id,
                        %kind,
                        "no translator registered, aborting envelope"
                    );
                    return Err(SyncError::UnregisteredKind(kind));
                }
                Err(err) => {
                    tracing::warn!(
                        message_id = envelope.message_id,
                        kind = %msg.kind,
                        error = %err,
                        "inbound message failed"
                    );
                    results.push(Err(err));
                }
                Ok(outcome) => results.push(Ok(outcome)),
            }
        }
        Ok(results)
    }

    /// Builds the envelope propagating a local change, or `None` if the
    /// entity no longer exists.
    pub async fn build_outbound(&self, event: &ChangeEvent) -> SyncResult<Option<OutboundEnvelope>> {
        let translator = self.registry.resolve(event.kind)?;
        let Some(msg) = translator.build_outbound(event).await? else {
            return Ok(None);
        };
        Ok(Some(OutboundEnvelope::single(self.next_message_id(), msg)))
    }

    /// Wraps a follow-up request in an envelope for the peer.
    pub fn follow_up_envelope(&self, request: &FollowUpRequest) -> OutboundEnvelope {
        OutboundEnvelope::with_payloads(
            self.next_message_id(),
            vec![UplinkPayload::DataRequest(request.to_data_request())],
        )
    }
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
