//! Entity storage.
//!
//! Translators reach local storage only through [`EntityRepository`]. The
//! in-memory [`MemoryRepository`] records a change event for every local
//! mutation, which is how outbound synchronization learns about changes.

mod memory;

pub use memory::MemoryRepository;

use crate::error::CoreResult;
use crate::event_queue::EventQueue;
use crate::ids::{CustomerId, EntityId, TenantId};
use crate::model::{Asset, Customer, Dashboard, Device, EntityView, Relation, User};
use async_trait::async_trait;
use edgesync_protocol::EntityKind;
use std::fmt;
use std::sync::Arc;

/// An entity that can be kept in a repository.
pub trait StoredEntity: Clone + fmt::Debug + Send + Sync + 'static {
    /// Kind of entity.
    const KIND: EntityKind;

    /// Returns the entity id.
    fn id(&self) -> EntityId;

    /// Moves the entity into a tenant.
    fn set_tenant_id(&mut self, tenant_id: TenantId);

    /// Returns the customer the entity is assigned to.
    fn owner(&self) -> Option<CustomerId> {
        None
    }

    /// Checks the entity before it is written.
    fn validate(&self) -> CoreResult<()> {
        Ok(())
    }
}

/// Storage for one kind of entity, scoped by tenant.
#[async_trait]
pub trait EntityRepository<E: StoredEntity>: Send + Sync {
    /// Looks up an entity.
    async fn find_by_id(&self, tenant_id: TenantId, id: EntityId) -> CoreResult<Option<E>>;

    /// Inserts or replaces an entity.
    async fn upsert(&self, tenant_id: TenantId, entity: E) -> CoreResult<()>;

    /// Deletes an entity. Returns false if it was not present.
    async fn delete(&self, tenant_id: TenantId, id: EntityId) -> CoreResult<bool>;

    /// Lists a tenant's entities.
    async fn list(&self, tenant_id: TenantId) -> CoreResult<Vec<E>>;
}

/// One repository per entity kind, sharing a change-event queue.
#[derive(Clone)]
pub struct Stores {
    /// Assets.
    pub assets: Arc<dyn EntityRepository<Asset>>,
    /// Devices.
    pub devices: Arc<dyn EntityRepository<Device>>,
    /// Entity views.
    pub entity_views: Arc<dyn EntityRepository<EntityView>>,
    /// Dashboards.
    pub dashboards: Arc<dyn EntityRepository<Dashboard>>,
    /// Customers.
    pub customers: Arc<dyn EntityRepository<Customer>>,
    /// Users.
    pub users: Arc<dyn EntityRepository<User>>,
    /// Relations.
    pub relations: Arc<dyn EntityRepository<Relation>>,
    /// Queue the repositories record local changes into.
    pub events: Arc<EventQueue>,
}

impl Stores {
    /// Creates in-memory repositories recording into `events`.
    pub fn in_memory(events: Arc<EventQueue>) -> Self {
        Self {
            assets: Arc::new(MemoryRepository::new(Arc::clone(&events))),
            devices: Arc::new(MemoryRepository::new(Arc::clone(&events))),
            entity_views: Arc::new(MemoryRepository::new(Arc::clone(&events))),
            dashboards: Arc::new(MemoryRepository::new(Arc::clone(&events))),
            customers: Arc::new(MemoryRepository::new(Arc::clone(&events))),
            users: Arc::new(MemoryRepository::new(Arc::clone(&events))),
            relations: Arc::new(MemoryRepository::new(Arc::clone(&events))),
            events,
        }
    }

    /// Counts a tenant's entities of one kind.
    pub async fn count(&self, tenant_id: TenantId, kind: EntityKind) -> CoreResult<usize> {
        Ok(match kind {
            EntityKind::Asset => self.assets.list(tenant_id).await?.len(),
            EntityKind::Device => self.devices.list(tenant_id).await?.len(),
            EntityKind::EntityView => self.entity_views.list(tenant_id).await?.len(),
            EntityKind::Dashboard => self.dashboards.list(tenant_id).await?.len(),
            EntityKind::Customer => self.customers.list(tenant_id).await?.len(),
            EntityKind::User => self.users.list(tenant_id).await?.len(),
            EntityKind::Relation => self.relations.list(tenant_id).await?.len(),
        })
    }
}

impl fmt::Debug for Stores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stores")
            .field("pending_events", &self.events.len())
            .finish_non_exhaustive()
    }
}
