//! # EdgeSync Core
//!
//! Local side of edge-to-cloud entity replication.
//!
//! This crate provides:
//! - Typed ids and entity models
//! - The echo guard marking work done on behalf of an inbound message
//! - The ordered queue of pending change events
//! - Repository traits and an in-memory implementation whose change hook
//!   records events for local mutations only
//!
//! ## Key Invariants
//!
//! - A mutation made while the echo guard is active never produces a
//!   change event
//! - Change events are retired at least once, never mutated
//! - Deleting an absent entity is not an error

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
pub mod echo_guard;
mod error;
mod event_queue;
mod ids;
pub mod model;
pub mod store;

pub use config::QueueConfig;
pub use error::{CoreError, CoreResult};
pub use event_queue::EventQueue;
pub use ids::{CustomerId, EntityId, TenantId};
pub use model::{
    Asset, Customer, Dashboard, Device, DeviceCredentials, EntityView, Relation, User,
};
pub use store::{EntityRepository, MemoryRepository, Stores, StoredEntity};

pub use edgesync_protocol::{ChangeAction, ChangeEvent, EntityKind, EntityRef};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
