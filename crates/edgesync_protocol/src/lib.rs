//! # EdgeSync Protocol
//!
//! Wire types and CBOR codecs for edge-to-cloud entity replication.
//!
//! This crate provides:
//! - `EntityKind` and `ChangeAction` tags
//! - `ChangeEvent` for locally committed changes awaiting propagation
//! - `EntityUpdateMsg` and kind-specific bodies
//! - Outbound and inbound envelopes with CBOR encoding/decoding
//! - Positive message id allocation
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod body;
mod change_event;
mod error;
mod kind;
mod messages;
mod msg_id;

pub use body::{
    AssetBody, CustomerBody, DashboardBody, DeviceBody, DeviceCredentialsBody, EntityBody,
    EntityRef, EntityViewBody, RelationBody, UserBody,
};
pub use change_event::{ChangeAction, ChangeEvent};
pub use error::{ProtocolError, ProtocolResult};
pub use kind::EntityKind;
pub use messages::{
    DataRequestMsg, EntityUpdateMsg, InboundEnvelope, OutboundEnvelope, UpdateMsgType,
    UplinkPayload,
};
pub use msg_id::MessageIdGenerator;

/// Wire protocol version.
pub const PROTOCOL_VERSION: u16 = 1;
