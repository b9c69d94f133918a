//! In-memory repository.

use super::{EntityRepository, StoredEntity};
use crate::error::CoreResult;
use crate::event_queue::EventQueue;
use crate::ids::{CustomerId, EntityId, TenantId};
use async_trait::async_trait;
use edgesync_protocol::ChangeAction;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Repository backed by a hash map.
///
/// Every mutation is passed to the change hook, which records an event in
/// the queue unless the echo guard is active. The hook runs under the entry
/// lock before the map changes, so a refused event leaves the entity as it
/// was and readers never see a change without its event.
#[derive(Debug)]
pub struct MemoryRepository<E> {
    entries: RwLock<HashMap<(TenantId, EntityId), E>>,
    events: Option<Arc<EventQueue>>,
}

impl<E: StoredEntity> MemoryRepository<E> {
    /// Creates a repository recording changes into `events`.
    pub fn new(events: Arc<EventQueue>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            events: Some(events),
        }
    }

    /// Creates a repository with no change hook.
    pub fn detached() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            events: None,
        }
    }

    /// Returns the number of stored entities across tenants.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn on_change(&self, tenant_id: TenantId, id: EntityId, action: ChangeAction) -> CoreResult<()> {
        if let Some(events) = &self.events {
            events.record(tenant_id, E::KIND, id, action)?;
        }
        Ok(())
    }
}

fn upsert_action(previous: Option<Option<CustomerId>>, current: Option<CustomerId>) -> ChangeAction {
    match (previous, current) {
        (None, _) => ChangeAction::Created,
        (Some(None), Some(_)) => ChangeAction::AssignedToOwner,
        (Some(Some(_)), None) => ChangeAction::UnassignedFromOwner,
        (Some(Some(before)), Some(after)) if before != after => ChangeAction::AssignedToOwner,
        (Some(_), _) => ChangeAction::Updated,
    }
}

#[async_trait]
impl<E: StoredEntity> EntityRepository<E> for MemoryRepository<E> {
    async fn find_by_id(&self, tenant_id: TenantId, id: EntityId) -> CoreResult<Option<E>> {
        Ok(self.entries.read().get(&(tenant_id, id)).cloned())
    }

    async fn upsert(&self, tenant_id: TenantId, mut entity: E) -> CoreResult<()> {
        entity.validate()?;
        entity.set_tenant_id(tenant_id);
        let id = entity.id();
        let owner = entity.owner();
        let action = {
            let mut entries = self.entries.write();
            let previous = entries.get(&(tenant_id, id)).map(StoredEntity::owner);
            let action = upsert_action(previous, owner);
            self.on_change(tenant_id, id, action)?;
            entries.insert((tenant_id, id), entity);
            action
        };
        tracing::debug!(kind = %E::KIND, %id, ?action, "entity stored");
        Ok(())
    }

    async fn delete(&self, tenant_id: TenantId, id: EntityId) -> CoreResult<bool> {
        {
            let mut entries = self.entries.write();
            if !entries.contains_key(&(tenant_id, id)) {
                return Ok(false);
            }
            self.on_change(tenant_id, id, ChangeAction::Deleted)?;
            entries.remove(&(tenant_id, id));
        }
        tracing::debug!(kind = %E::KIND, %id, "entity deleted");
        Ok(true)
    }

    async fn list(&self, tenant_id: TenantId) -> CoreResult<Vec<E>> {
        let mut entities: Vec<E> = self
            .entries
            .read()
            .iter()
            .filter(|((tenant, _), _)| *tenant == tenant_id)
            .map(|(_, entity)| entity.clone())
            .collect();
        entities.sort_by_key(|entity| entity.id());
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueueConfig;
    use crate::echo_guard;
    use crate::error::CoreError;
    use crate::model::{Asset, Customer};

    fn repo() -> (Arc<EventQueue>, MemoryRepository<Asset>) {
        let events = Arc::new(EventQueue::new());
        let repo = MemoryRepository::new(Arc::clone(&events));
        (events, repo)
    }

    fn actions(events: &EventQueue) -> Vec<ChangeAction> {
        events.pending(100).into_iter().map(|e| e.action).collect()
    }

    #[tokio::test]
    async fn crud_records_events() {
        let (events, repo) = repo();
        let tenant = TenantId::new();
        let mut asset = Asset::new(tenant, "Pump", "pump");

        repo.upsert(tenant, asset.clone()).await.unwrap();
        asset.label = Some("north".into());
        repo.upsert(tenant, asset.clone()).await.unwrap();
        assert_eq!(
            repo.find_by_id(tenant, asset.id).await.unwrap(),
            Some(asset.clone())
        );
        assert!(repo.delete(tenant, asset.id).await.unwrap());

        assert_eq!(
            actions(&events),
            vec![
                ChangeAction::Created,
                ChangeAction::Updated,
                ChangeAction::Deleted
            ]
        );
    }

    #[tokio::test]
    async fn deleting_absent_is_quiet() {
        let (events, repo) = repo();
        assert!(!repo.delete(TenantId::new(), EntityId::new()).await.unwrap());
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn owner_changes_are_assignments() {
        let (events, repo) = repo();
        let tenant = TenantId::new();
        let customer = Customer::new(tenant, "Acme");
        let mut asset = Asset::new(tenant, "Pump", "pump");

        repo.upsert(tenant, asset.clone()).await.unwrap();
        asset.customer_id = Some(customer.customer_id());
        repo.upsert(tenant, asset.clone()).await.unwrap();
        asset.customer_id = None;
        repo.upsert(tenant, asset.clone()).await.unwrap();

        assert_eq!(
            actions(&events),
            vec![
                ChangeAction::Created,
                ChangeAction::AssignedToOwner,
                ChangeAction::UnassignedFromOwner
            ]
        );
    }

    #[tokio::test]
    async fn guarded_writes_are_not_recorded() {
        let (events, repo) = repo();
        let tenant = TenantId::new();
        let asset = Asset::new(tenant, "Pump", "pump");

        echo_guard::guarded(repo.upsert(tenant, asset.clone()))
            .await
            .unwrap();
        assert!(repo.find_by_id(tenant, asset.id).await.unwrap().is_some());
        assert!(events.is_empty());
        assert_eq!(events.suppressed_count(), 1);
    }

    #[tokio::test]
    async fn tenants_are_isolated() {
        let (_, repo) = repo();
        let (a, b) = (TenantId::new(), TenantId::new());
        let asset = Asset::new(a, "Pump", "pump");
        repo.upsert(a, asset.clone()).await.unwrap();

        assert!(repo.find_by_id(b, asset.id).await.unwrap().is_none());
        assert_eq!(repo.list(a).await.unwrap().len(), 1);
        assert!(repo.list(b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_entities_are_rejected() {
        let (events, repo) = repo();
        let tenant = TenantId::new();
        let asset = Asset::new(tenant, "", "pump");
        assert!(repo.upsert(tenant, asset).await.is_err());
        assert!(repo.is_empty());
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn full_queue_rejects_writes_unchanged() {
        let events = Arc::new(EventQueue::with_config(QueueConfig::new().max_pending(1)));
        let repo = MemoryRepository::new(Arc::clone(&events));
        let tenant = TenantId::new();
        let kept = Asset::new(tenant, "Pump", "pump");
        repo.upsert(tenant, kept.clone()).await.unwrap();

        let refused = Asset::new(tenant, "Valve", "valve");
        let err = repo.upsert(tenant, refused.clone()).await.unwrap_err();
        assert!(matches!(err, CoreError::QueueFull { limit: 1 }));
        assert!(repo.find_by_id(tenant, refused.id).await.unwrap().is_none());

        let err = repo.delete(tenant, kept.id).await.unwrap_err();
        assert!(err.is_transient());
        assert!(repo.find_by_id(tenant, kept.id).await.unwrap().is_some());
        assert_eq!(actions(&events), vec![ChangeAction::Created]);

        events.retire_up_to(events.latest_sequence());
        repo.upsert(tenant, refused.clone()).await.unwrap();
        assert_eq!(actions(&events), vec![ChangeAction::Created]);
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn detached_repository_records_nothing() {
        let repo = MemoryRepository::<Asset>::detached();
        let tenant = TenantId::new();
        repo.upsert(tenant, Asset::new(tenant, "Pump", "pump"))
            .await
            .unwrap();
        assert_eq!(repo.len(), 1);
    }
}
