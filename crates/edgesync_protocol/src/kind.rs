//! Entity kind tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a replicated entity.
///
/// The set is closed: adding a kind means adding a variant here, a
/// translator for it and a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A physical or logical asset.
    Asset,
    /// A connected device.
    Device,
    /// A projection of another entity's telemetry and attributes.
    EntityView,
    /// A dashboard definition.
    Dashboard,
    /// A customer grouping owned entities.
    Customer,
    /// A user account.
    User,
    /// A typed link between two entities.
    Relation,
}

impl EntityKind {
    /// Every kind, in declaration order.
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Asset,
        EntityKind::Device,
        EntityKind::EntityView,
        EntityKind::Dashboard,
        EntityKind::Customer,
        EntityKind::User,
        EntityKind::Relation,
    ];

    /// Returns the stable string tag.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Asset => "asset",
            EntityKind::Device => "device",
            EntityKind::EntityView => "entity_view",
            EntityKind::Dashboard => "dashboard",
            EntityKind::Customer => "customer",
            EntityKind::User => "user",
            EntityKind::Relation => "relation",
        }
    }

    /// Parses a string tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }

    /// Returns true if entities of this kind can be assigned to a customer.
    pub const fn is_ownable(&self) -> bool {
        matches!(
            self,
            EntityKind::Asset | EntityKind::Device | EntityKind::EntityView | EntityKind::User
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
