//! Kind-specific message bodies.

use crate::kind::EntityKind;
use serde::{Deserialize, Serialize};

/// Reference to another entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    /// Kind of the referenced entity.
    pub kind: EntityKind,
    /// Id of the referenced entity.
    pub id: [u8; 16],
}

impl EntityRef {
    /// Creates a reference.
    pub fn new(kind: EntityKind, id: [u8; 16]) -> Self {
        Self { kind, id }
    }
}

/// Asset attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetBody {
    /// Display name, unique per tenant.
    pub name: String,
    /// Free-form asset type.
    pub asset_type: String,
    /// Optional label.
    pub label: Option<String>,
    /// Asset profile, if any.
    pub asset_profile_id: Option<[u8; 16]>,
    /// Arbitrary JSON metadata.
    pub additional_info: Option<serde_json::Value>,
}

/// Device credentials carried inline with a device update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCredentialsBody {
    /// Credentials type (access token, X.509, ...).
    pub credentials_type: String,
    /// Credentials id, e.g. the access token.
    pub credentials_id: String,
    /// Optional credentials value, e.g. a certificate.
    pub credentials_value: Option<String>,
}

/// Device attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceBody {
    /// Display name, unique per tenant.
    pub name: String,
    /// Free-form device type.
    pub device_type: String,
    /// Optional label.
    pub label: Option<String>,
    /// Device profile, if any.
    pub device_profile_id: Option<[u8; 16]>,
    /// Inline credentials, when the sender chose to include them.
    pub credentials: Option<DeviceCredentialsBody>,
    /// Arbitrary JSON metadata.
    pub additional_info: Option<serde_json::Value>,
}

/// Entity view attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityViewBody {
    /// Display name.
    pub name: String,
    /// Free-form view type.
    pub view_type: String,
    /// The entity this view projects.
    pub target: EntityRef,
    /// Arbitrary JSON metadata.
    pub additional_info: Option<serde_json::Value>,
}

/// Dashboard attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardBody {
    /// Dashboard title.
    pub title: String,
    /// Full dashboard configuration.
    pub configuration: serde_json::Value,
    /// Customers the dashboard is shared with.
    pub assigned_customers: Vec<[u8; 16]>,
}

/// Customer attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerBody {
    /// Customer title.
    pub title: String,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// Arbitrary JSON metadata.
    pub additional_info: Option<serde_json::Value>,
}

/// User attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBody {
    /// Login email.
    pub email: String,
    /// Authority (tenant admin, customer user, ...).
    pub authority: String,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Arbitrary JSON metadata.
    pub additional_info: Option<serde_json::Value>,
}

/// Relation attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationBody {
    /// Source entity.
    pub from: EntityRef,
    /// Target entity.
    pub to: EntityRef,
    /// Relation type, e.g. "Contains".
    pub relation_type: String,
    /// Relation type group, e.g. "COMMON".
    pub type_group: String,
}

/// Kind-specific body of an entity update message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "fields", rename_all = "snake_case")]
pub enum EntityBody {
    /// Asset body.
    Asset(AssetBody),
    /// Device body.
    Device(DeviceBody),
    /// Entity view body.
    EntityView(EntityViewBody),
    /// Dashboard body.
    Dashboard(DashboardBody),
    /// Customer body.
    Customer(CustomerBody),
    /// User body.
    User(UserBody),
    /// Relation body.
    Relation(RelationBody),
}

impl EntityBody {
    /// Returns the kind this body describes.
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityBody::Asset(_) => EntityKind::Asset,
            EntityBody::Device(_) => EntityKind::Device,
            EntityBody::EntityView(_) => EntityKind::EntityView,
            EntityBody::Dashboard(_) => EntityKind::Dashboard,
            EntityBody::Customer(_) => EntityKind::Customer,
            EntityBody::User(_) => EntityKind::User,
            EntityBody::Relation(_) => EntityKind::Relation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_reports_kind() {
        let body = EntityBody::Relation(RelationBody {
            from: EntityRef::new(EntityKind::Asset, [1u8; 16]),
            to: EntityRef::new(EntityKind::Device, [2u8; 16]),
            relation_type: "Contains".into(),
            type_group: "COMMON".into(),
        });
        assert_eq!(body.kind(), EntityKind::Relation);
    }
}
