//! # EdgeSync Engine
//!
//! Translation between local storage and the wire for edge-to-cloud
//! entity replication.
//!
//! This crate provides:
//! - One translator per entity kind (inbound apply, outbound build)
//! - The immutable kind-to-translator registry
//! - The sync coordinator, which applies inbound messages under the echo
//!   guard and wraps outbound messages in envelopes
//! - The coalescing follow-up request channel
//! - The outbound pump draining the change-event queue to a transport
//!
//! ## Key Invariants
//!
//! - A change applied from the peer is never sent back to it
//! - Applying the same message twice leaves the same state as applying it
//!   once
//! - Every kind has exactly one translator
//! - Every outbound envelope carries a fresh positive message id

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
pub mod coordinator;
mod error;
pub mod follow_up;
pub mod outbound;
pub mod registry;
pub mod translator;
pub mod transport;

pub use config::{RetryConfig, SyncConfig};
pub use coordinator::{InboundOutcome, MessageState, SyncCoordinator};
pub use error::{SyncError, SyncResult};
pub use follow_up::{ChannelRequester, FollowUpReceiver, FollowUpRequest, FollowUpRequester};
pub use outbound::{DrainReport, OutboundPump};
pub use registry::{RegistryBuilder, TranslatorRegistry};
pub use translator::{ApplyOutcome, InboundContext, Translator};
pub use transport::{LoopbackReceiver, LoopbackTransport, MockTransport, UplinkTransport};
