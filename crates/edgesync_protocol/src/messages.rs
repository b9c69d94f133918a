//! Protocol messages exchanged between edge and cloud.

use crate::body::EntityBody;
use crate::error::{ProtocolError, ProtocolResult};
use crate::kind::EntityKind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Wire action of an entity update message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateMsgType {
    /// Entity was created on the sender.
    Created,
    /// Entity was updated (including owner changes) on the sender.
    Updated,
    /// Entity was deleted on the sender.
    Deleted,
}

impl UpdateMsgType {
    /// Every wire action, in code order.
    pub const ALL: [UpdateMsgType; 3] = [
        UpdateMsgType::Created,
        UpdateMsgType::Updated,
        UpdateMsgType::Deleted,
    ];

    /// Converts to a numeric wire code.
    pub const fn to_code(&self) -> u8 {
        match self {
            UpdateMsgType::Created => 1,
            UpdateMsgType::Updated => 2,
            UpdateMsgType::Deleted => 3,
        }
    }

    /// Converts from a numeric wire code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(UpdateMsgType::Created),
            2 => Some(UpdateMsgType::Updated),
            3 => Some(UpdateMsgType::Deleted),
            _ => None,
        }
    }
}

/// A change to one entity, as carried on the wire.
///
/// The action is kept as its raw code so that messages from a newer peer
/// still decode; `msg_type()` interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityUpdateMsg {
    /// Kind of the changed entity.
    pub kind: EntityKind,
    /// Raw wire action code.
    pub msg_type: u8,
    /// Changed entity.
    pub entity_id: [u8; 16],
    /// Owning customer, when the sender knows one.
    pub customer_id: Option<[u8; 16]>,
    /// Kind-specific attributes; absent for deletes.
    pub body: Option<EntityBody>,
}

impl EntityUpdateMsg {
    /// Creates a created/updated message.
    pub fn update(
        kind: EntityKind,
        msg_type: UpdateMsgType,
        entity_id: [u8; 16],
        customer_id: Option<[u8; 16]>,
        body: EntityBody,
    ) -> Self {
        Self {
            kind,
            msg_type: msg_type.to_code(),
            entity_id,
            customer_id,
            body: Some(body),
        }
    }

    /// Creates a delete message.
    pub fn delete(kind: EntityKind, entity_id: [u8; 16]) -> Self {
        Self {
            kind,
            msg_type: UpdateMsgType::Deleted.to_code(),
            entity_id,
            customer_id: None,
            body: None,
        }
    }

    /// Interprets the raw action code.
    pub fn msg_type(&self) -> Option<UpdateMsgType> {
        UpdateMsgType::from_code(self.msg_type)
    }
}

/// Request for data that an update could not carry inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRequestMsg {
    /// Kind of the entity whose dependent data is needed.
    pub kind: EntityKind,
    /// Entity whose dependent data is needed.
    pub entity_id: [u8; 16],
    /// Sequence of the requester's own change log when the update arrived.
    ///
    /// The marker lives in the requester's sequence space and is opaque to
    /// the peer, which answers with its current data. The requester uses it
    /// to tell whether local changes made after that point still need to
    /// win over the reply.
    pub causal_start: u64,
}

/// A single payload inside an outbound envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UplinkPayload {
    /// Entity create/update/delete.
    Entity(EntityUpdateMsg),
    /// Follow-up data request.
    DataRequest(DataRequestMsg),
}

/// Container for messages sent to the peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    /// Positive id, unique per envelope within a session.
    pub message_id: u32,
    /// Payloads in send order.
    pub payloads: Vec<UplinkPayload>,
}

impl OutboundEnvelope {
    /// Creates an envelope holding a single entity message.
    pub fn single(message_id: u32, msg: EntityUpdateMsg) -> Self {
        Self::with_payloads(message_id, vec![UplinkPayload::Entity(msg)])
    }

    /// Creates an envelope holding the given payloads.
    pub fn with_payloads(message_id: u32, payloads: Vec<UplinkPayload>) -> Self {
        Self {
            message_id,
            payloads,
        }
    }

    /// Returns the entity messages, skipping data requests.
    pub fn entity_messages(&self) -> impl Iterator<Item = &EntityUpdateMsg> {
        self.payloads.iter().filter_map(|p| match p {
            UplinkPayload::Entity(msg) => Some(msg),
            UplinkPayload::DataRequest(_) => None,
        })
    }

    /// Encodes to CBOR bytes.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        encode_cbor(self)
    }

    /// Decodes from CBOR bytes.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        let envelope: Self = decode_cbor(bytes)?;
        check_message_id(envelope.message_id)?;
        Ok(envelope)
    }
}

/// Container for messages received from the peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEnvelope {
    /// The peer's message id, echoed back in acknowledgements.
    pub message_id: u32,
    /// Entity messages in delivery order.
    pub messages: Vec<EntityUpdateMsg>,
}

impl InboundEnvelope {
    /// Creates an envelope.
    pub fn new(message_id: u32, messages: Vec<EntityUpdateMsg>) -> Self {
        Self {
            message_id,
            messages,
        }
    }

    /// Converts what a peer sent into what this node receives.
    ///
    /// Data requests are answered by the peer's data service, not by the
    /// entity translators, so only entity messages are kept.
    pub fn from_outbound(envelope: &OutboundEnvelope) -> Self {
        Self::new(
            envelope.message_id,
            envelope.entity_messages().cloned().collect(),
        )
    }

    /// Encodes to CBOR bytes.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        encode_cbor(self)
    }

    /// Decodes from CBOR bytes.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        let envelope: Self = decode_cbor(bytes)?;
        check_message_id(envelope.message_id)?;
        Ok(envelope)
    }
}

fn encode_cbor<T: Serialize>(value: &T) -> ProtocolResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes)?;
    Ok(bytes)
}

fn decode_cbor<T: DeserializeOwned>(bytes: &[u8]) -> ProtocolResult<T> {
    Ok(ciborium::from_reader(bytes)?)
}

fn check_message_id(message_id: u32) -> ProtocolResult<()> {
    if message_id == 0 || message_id > i32::MAX as u32 {
        return Err(ProtocolError::invalid_message(format!(
            "message id out of range: {message_id}"
        )));
    }
    Ok(())
}
