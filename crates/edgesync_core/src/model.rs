//! Entity models stored on each node.

use crate::error::{CoreError, CoreResult};
use crate::ids::{CustomerId, EntityId, TenantId};
use crate::store::StoredEntity;
use edgesync_protocol::{EntityKind, EntityRef};
use serde_json::Value;
use uuid::Uuid;

/// Namespace for deriving relation ids.
const RELATION_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6b, 0xa7, 0xb8, 0x14, 0x9d, 0xad, 0x11, 0xd1, 0x80, 0xb4, 0x00, 0xc0, 0x4f, 0xd4, 0x30, 0xc9,
]);

fn require_non_empty(kind: EntityKind, id: EntityId, field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::invalid_entity(
            kind,
            id,
            format!("{field} must not be empty"),
        ));
    }
    Ok(())
}

/// An asset.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// Asset id.
    pub id: EntityId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Assigned customer.
    pub customer_id: Option<CustomerId>,
    /// Display name.
    pub name: String,
    /// Free-form type.
    pub asset_type: String,
    /// Optional label.
    pub label: Option<String>,
    /// Asset profile.
    pub asset_profile_id: Option<EntityId>,
    /// JSON metadata.
    pub additional_info: Option<Value>,
}

impl Asset {
    /// Creates an unassigned asset with a fresh id.
    pub fn new(tenant_id: TenantId, name: impl Into<String>, asset_type: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            tenant_id,
            customer_id: None,
            name: name.into(),
            asset_type: asset_type.into(),
            label: None,
            asset_profile_id: None,
            additional_info: None,
        }
    }
}

impl StoredEntity for Asset {
    const KIND: EntityKind = EntityKind::Asset;

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_tenant_id(&mut self, tenant_id: TenantId) {
        self.tenant_id = tenant_id;
    }

    fn owner(&self) -> Option<CustomerId> {
        self.customer_id
    }

    fn validate(&self) -> CoreResult<()> {
        require_non_empty(Self::KIND, self.id, "name", &self.name)
    }
}

/// Credentials a device authenticates with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCredentials {
    /// Credentials type.
    pub credentials_type: String,
    /// Credentials id, e.g. an access token.
    pub credentials_id: String,
    /// Optional credentials value.
    pub credentials_value: Option<String>,
}

/// A device.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    /// Device id.
    pub id: EntityId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Assigned customer.
    pub customer_id: Option<CustomerId>,
    /// Display name.
    pub name: String,
    /// Free-form type.
    pub device_type: String,
    /// Optional label.
    pub label: Option<String>,
    /// Device profile.
    pub device_profile_id: Option<EntityId>,
    /// Credentials, when known locally.
    pub credentials: Option<DeviceCredentials>,
    /// JSON metadata.
    pub additional_info: Option<Value>,
}

impl Device {
    /// Creates an unassigned device with a fresh id.
    pub fn new(tenant_id: TenantId, name: impl Into<String>, device_type: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            tenant_id,
            customer_id: None,
            name: name.into(),
            device_type: device_type.into(),
            label: None,
            device_profile_id: None,
            credentials: None,
            additional_info: None,
        }
    }
}

impl StoredEntity for Device {
    const KIND: EntityKind = EntityKind::Device;

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_tenant_id(&mut self, tenant_id: TenantId) {
        self.tenant_id = tenant_id;
    }

    fn owner(&self) -> Option<CustomerId> {
        self.customer_id
    }

    fn validate(&self) -> CoreResult<()> {
        require_non_empty(Self::KIND, self.id, "name", &self.name)
    }
}

/// A view onto another entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityView {
    /// View id.
    pub id: EntityId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Assigned customer.
    pub customer_id: Option<CustomerId>,
    /// Display name.
    pub name: String,
    /// Free-form type.
    pub view_type: String,
    /// Projected entity.
    pub target: EntityRef,
    /// JSON metadata.
    pub additional_info: Option<Value>,
}

impl StoredEntity for EntityView {
    const KIND: EntityKind = EntityKind::EntityView;

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_tenant_id(&mut self, tenant_id: TenantId) {
        self.tenant_id = tenant_id;
    }

    fn owner(&self) -> Option<CustomerId> {
        self.customer_id
    }

    fn validate(&self) -> CoreResult<()> {
        require_non_empty(Self::KIND, self.id, "name", &self.name)
    }
}

/// A dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    /// Dashboard id.
    pub id: EntityId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Title.
    pub title: String,
    /// Full configuration document.
    pub configuration: Value,
    /// Customers the dashboard is shared with.
    pub assigned_customers: Vec<CustomerId>,
}

impl StoredEntity for Dashboard {
    const KIND: EntityKind = EntityKind::Dashboard;

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_tenant_id(&mut self, tenant_id: TenantId) {
        self.tenant_id = tenant_id;
    }

    fn validate(&self) -> CoreResult<()> {
        require_non_empty(Self::KIND, self.id, "title", &self.title)
    }
}

/// A customer.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    /// Customer id.
    pub id: EntityId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Title.
    pub title: String,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// JSON metadata.
    pub additional_info: Option<Value>,
}

impl Customer {
    /// Creates a customer with a fresh id.
    pub fn new(tenant_id: TenantId, title: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            tenant_id,
            title: title.into(),
            email: None,
            phone: None,
            country: None,
            additional_info: None,
        }
    }

    /// Returns this customer's id as an owner id.
    pub fn customer_id(&self) -> CustomerId {
        CustomerId::from_bytes(self.id.to_bytes())
    }
}

impl StoredEntity for Customer {
    const KIND: EntityKind = EntityKind::Customer;

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_tenant_id(&mut self, tenant_id: TenantId) {
        self.tenant_id = tenant_id;
    }

    fn validate(&self) -> CoreResult<()> {
        require_non_empty(Self::KIND, self.id, "title", &self.title)
    }
}

/// A user account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// User id.
    pub id: EntityId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Customer the user belongs to; none for tenant administrators.
    pub customer_id: Option<CustomerId>,
    /// Login email.
    pub email: String,
    /// Authority.
    pub authority: String,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// JSON metadata.
    pub additional_info: Option<Value>,
}

impl StoredEntity for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_tenant_id(&mut self, tenant_id: TenantId) {
        self.tenant_id = tenant_id;
    }

    fn owner(&self) -> Option<CustomerId> {
        self.customer_id
    }

    fn validate(&self) -> CoreResult<()> {
        if !self.email.contains('@') {
            return Err(CoreError::invalid_entity(
                Self::KIND,
                self.id,
                format!("malformed email {:?}", self.email),
            ));
        }
        Ok(())
    }
}

/// A typed link from one entity to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Id derived from the relation's key.
    pub id: EntityId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Source entity.
    pub from: EntityRef,
    /// Target entity.
    pub to: EntityRef,
    /// Relation type.
    pub relation_type: String,
    /// Relation type group.
    pub type_group: String,
}

impl Relation {
    /// Creates a relation, deriving its id from the key.
    pub fn new(
        tenant_id: TenantId,
        from: EntityRef,
        to: EntityRef,
        relation_type: impl Into<String>,
        type_group: impl Into<String>,
    ) -> Self {
        let relation_type = relation_type.into();
        let type_group = type_group.into();
        Self {
            id: Self::key_id(&from, &to, &relation_type, &type_group),
            tenant_id,
            from,
            to,
            relation_type,
            type_group,
        }
    }

    /// Derives the id shared by every node for this relation key.
    pub fn key_id(from: &EntityRef, to: &EntityRef, relation_type: &str, type_group: &str) -> EntityId {
        let mut name = Vec::with_capacity(64 + relation_type.len() + type_group.len());
        name.extend_from_slice(from.kind.as_str().as_bytes());
        name.extend_from_slice(&from.id);
        name.extend_from_slice(to.kind.as_str().as_bytes());
        name.extend_from_slice(&to.id);
        name.extend_from_slice(relation_type.as_bytes());
        name.push(0);
        name.extend_from_slice(type_group.as_bytes());
        EntityId::derived(&RELATION_NAMESPACE, &name)
    }
}

impl StoredEntity for Relation {
    const KIND: EntityKind = EntityKind::Relation;

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_tenant_id(&mut self, tenant_id: TenantId) {
        self.tenant_id = tenant_id;
    }

    fn validate(&self) -> CoreResult<()> {
        require_non_empty(Self::KIND, self.id, "relation_type", &self.relation_type)?;
        let expected = Self::key_id(&self.from, &self.to, &self.relation_type, &self.type_group);
        if expected != self.id {
            return Err(CoreError::invalid_entity(
                Self::KIND,
                self.id,
                "id does not match relation key",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs() -> (EntityRef, EntityRef) {
        (
            EntityRef::new(EntityKind::Asset, [1u8; 16]),
            EntityRef::new(EntityKind::Device, [2u8; 16]),
        )
    }

    #[test]
    fn relation_id_follows_key() {
        let tenant = TenantId::new();
        let (from, to) = refs();
        let a = Relation::new(tenant, from, to, "Contains", "COMMON");
        let b = Relation::new(TenantId::new(), from, to, "Contains", "COMMON");
        let c = Relation::new(tenant, to, from, "Contains", "COMMON");
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn tampered_relation_id_rejected() {
        let (from, to) = refs();
        let mut relation = Relation::new(TenantId::new(), from, to, "Contains", "COMMON");
        relation.id = EntityId::new();
        assert!(relation.validate().is_err());
    }

    #[test]
    fn asset_requires_name() {
        let mut asset = Asset::new(TenantId::new(), "Pump", "pump");
        assert!(asset.validate().is_ok());
        asset.name = "  ".into();
        assert!(matches!(
            asset.validate(),
            Err(CoreError::InvalidEntity { .. })
        ));
    }

    #[test]
    fn user_requires_email() {
        let user = User {
            id: EntityId::new(),
            tenant_id: TenantId::new(),
            customer_id: None,
            email: "not-an-email".into(),
            authority: "TENANT_ADMIN".into(),
            first_name: None,
            last_name: None,
            additional_info: None,
        };
        assert!(user.validate().is_err());
    }

    #[test]
    fn owners() {
        let customer = Customer::new(TenantId::new(), "Acme");
        let mut device = Device::new(customer.tenant_id, "Sensor", "thermometer");
        assert_eq!(device.owner(), None);
        device.customer_id = Some(customer.customer_id());
        assert_eq!(device.owner(), Some(customer.customer_id()));
        assert_eq!(customer.owner(), None);
    }
}
