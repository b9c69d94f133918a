//! # EdgeSync Testkit
//!
//! Test utilities for EdgeSync.
//!
//! This crate provides:
//! - Test nodes wired with in-memory stores, and links between two nodes
//! - Repository and follow-up doubles that fail on demand
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use edgesync_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn replicates() {
//!     let link = TestLink::new();
//!     let asset = Asset::new(link.tenant_id(), "Pump", "pump");
//!     link.edge.stores.assets.upsert(link.tenant_id(), asset).await.unwrap();
//!     link.sync_edge_to_cloud().await;
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod doubles;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::doubles::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use edgesync_core::{
        Asset, ChangeAction, ChangeEvent, Customer, CustomerId, Dashboard, Device,
        DeviceCredentials, EntityId, EntityKind, EntityRef, EntityRepository, EntityView,
        EventQueue, Relation, Stores, TenantId, User,
    };
    pub use edgesync_engine::{
        ApplyOutcome, InboundContext, InboundOutcome, SyncCoordinator, SyncError,
        TranslatorRegistry,
    };
}

pub use doubles::*;
pub use fixtures::*;
pub use generators::*;
