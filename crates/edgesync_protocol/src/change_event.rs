//! Locally committed changes awaiting propagation.

use crate::kind::EntityKind;
use crate::messages::UpdateMsgType;
use serde::{Deserialize, Serialize};

/// What happened to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeAction {
    /// Entity was created.
    Created,
    /// Entity attributes changed.
    Updated,
    /// Entity was deleted.
    Deleted,
    /// Entity was assigned to a customer.
    AssignedToOwner,
    /// Entity was unassigned from its customer.
    UnassignedFromOwner,
}

impl ChangeAction {
    /// Every action, in declaration order.
    pub const ALL: [ChangeAction; 5] = [
        ChangeAction::Created,
        ChangeAction::Updated,
        ChangeAction::Deleted,
        ChangeAction::AssignedToOwner,
        ChangeAction::UnassignedFromOwner,
    ];

    /// Maps the local action to the wire message type that propagates it.
    ///
    /// Owner changes travel as plain updates carrying the new owner.
    pub const fn to_msg_type(&self) -> UpdateMsgType {
        match self {
            ChangeAction::Created => UpdateMsgType::Created,
            ChangeAction::Updated
            | ChangeAction::AssignedToOwner
            | ChangeAction::UnassignedFromOwner => UpdateMsgType::Updated,
            ChangeAction::Deleted => UpdateMsgType::Deleted,
        }
    }

    /// Returns true if building a message for this action needs the
    /// current entity state.
    pub const fn needs_lookup(&self) -> bool {
        !matches!(self, ChangeAction::Deleted)
    }
}

/// A change event recorded by the local store.
///
/// Events are produced only for mutations made outside an inbound apply,
/// read once to build an outbound message, then retired. They are never
/// mutated after recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Sequence number assigned by the event queue (logical timestamp).
    pub sequence: u64,
    /// Owning tenant.
    pub tenant_id: [u8; 16],
    /// Kind of the changed entity.
    pub kind: EntityKind,
    /// Changed entity.
    pub entity_id: [u8; 16],
    /// What happened.
    pub action: ChangeAction,
}

impl ChangeEvent {
    /// Creates an event; the sequence is assigned when it is recorded.
    pub fn new(
        tenant_id: [u8; 16],
        kind: EntityKind,
        entity_id: [u8; 16],
        action: ChangeAction,
    ) -> Self {
        Self {
            sequence: 0,
            tenant_id,
            kind,
            entity_id,
            action,
        }
    }

    /// Creates a created event.
    pub fn created(tenant_id: [u8; 16], kind: EntityKind, entity_id: [u8; 16]) -> Self {
        Self::new(tenant_id, kind, entity_id, ChangeAction::Created)
    }

    /// Creates an updated event.
    pub fn updated(tenant_id: [u8; 16], kind: EntityKind, entity_id: [u8; 16]) -> Self {
        Self::new(tenant_id, kind, entity_id, ChangeAction::Updated)
    }

    /// Creates a deleted event.
    pub fn deleted(tenant_id: [u8; 16], kind: EntityKind, entity_id: [u8; 16]) -> Self {
        Self::new(tenant_id, kind, entity_id, ChangeAction::Deleted)
    }

    /// Returns a copy with the given sequence.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }
}
