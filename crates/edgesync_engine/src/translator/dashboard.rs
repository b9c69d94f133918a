//! Dashboard translator.

use super::{
    apply_entity, build_entity, constructor, wrong_body, ApplyOutcome, InboundContext, Target,
    Translator,
};
use crate::error::SyncResult;
use async_trait::async_trait;
use edgesync_core::store::EntityRepository;
use edgesync_core::{ChangeEvent, CustomerId, Dashboard, EntityKind};
use edgesync_protocol::{EntityBody, EntityUpdateMsg};
use std::sync::Arc;

/// Translates dashboards. The configuration travels inline, so nothing
/// is left to request.
pub struct DashboardTranslator {
    repo: Arc<dyn EntityRepository<Dashboard>>,
}

impl DashboardTranslator {
    /// Creates a translator over `repo`.
    pub fn new(repo: Arc<dyn EntityRepository<Dashboard>>) -> Self {
        Self { repo }
    }
}

fn dashboard_from_body(body: &EntityBody, target: Target) -> SyncResult<Dashboard> {
    let EntityBody::Dashboard(body) = body else {
        return Err(wrong_body(EntityKind::Dashboard, body));
    };
    Ok(Dashboard {
        id: target.id,
        tenant_id: target.tenant_id,
        title: body.title.clone(),
        configuration: body.configuration.clone(),
        assigned_customers: body
            .assigned_customers
            .iter()
            .copied()
            .map(CustomerId::from_bytes)
            .collect(),
    })
}

#[async_trait]
impl Translator for DashboardTranslator {
    fn kind(&self) -> EntityKind {
        EntityKind::Dashboard
    }

    async fn apply_inbound(
        &self,
        ctx: &InboundContext,
        msg: &EntityUpdateMsg,
    ) -> SyncResult<ApplyOutcome> {
        apply_entity(self.repo.as_ref(), ctx, msg, false, dashboard_from_body).await
    }

    async fn build_outbound(&self, event: &ChangeEvent) -> SyncResult<Option<EntityUpdateMsg>> {
        build_entity(self.repo.as_ref(), event, constructor::dashboard_body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgesync_core::{EntityId, EventQueue, MemoryRepository, TenantId};
    use edgesync_protocol::UpdateMsgType;
    use serde_json::json;

    #[tokio::test]
    async fn dashboard_needs_no_follow_up_and_ignores_owner() {
        let repo = Arc::new(MemoryRepository::new(Arc::new(EventQueue::new())));
        let translator = DashboardTranslator::new(repo.clone());
        let ctx = InboundContext::new(TenantId::new()).with_owner_hint(Some(CustomerId::new()));
        let shared_with = CustomerId::new();
        let dashboard = Dashboard {
            id: EntityId::new(),
            tenant_id: ctx.tenant_id,
            title: "Overview".into(),
            configuration: json!({"widgets": [{"type": "gauge"}]}),
            assigned_customers: vec![shared_with],
        };
        let mut msg = constructor::construct_update_msg(
            EntityKind::Dashboard,
            UpdateMsgType::Created,
            dashboard.id,
            None,
            constructor::dashboard_body(&dashboard),
        );
        msg.customer_id = Some(CustomerId::new().to_bytes());

        let outcome = translator.apply_inbound(&ctx, &msg).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied { follow_up: false });
        let stored = repo.find_by_id(ctx.tenant_id, dashboard.id).await.unwrap();
        assert_eq!(stored, Some(dashboard));
    }
}
