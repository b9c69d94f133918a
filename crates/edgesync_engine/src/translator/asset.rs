//! Asset translator.

use super::{
    apply_entity, build_entity, constructor, wrong_body, ApplyOutcome, InboundContext, Target,
    Translator,
};
use crate::error::SyncResult;
use async_trait::async_trait;
use edgesync_core::store::EntityRepository;
use edgesync_core::{Asset, ChangeEvent, EntityId, EntityKind};
use edgesync_protocol::{EntityBody, EntityUpdateMsg};
use std::sync::Arc;

/// Translates assets. Asset attributes live on the sender, so every
/// applied update asks for follow-up data.
pub struct AssetTranslator {
    repo: Arc<dyn EntityRepository<Asset>>,
}

impl AssetTranslator {
    /// Creates a translator over `repo`.
    pub fn new(repo: Arc<dyn EntityRepository<Asset>>) -> Self {
        Self { repo }
    }
}

fn asset_from_body(body: &EntityBody, target: Target) -> SyncResult<Asset> {
    let EntityBody::Asset(body) = body else {
        return Err(wrong_body(EntityKind::Asset, body));
    };
    Ok(Asset {
        id: target.id,
        tenant_id: target.tenant_id,
        customer_id: target.owner,
        name: body.name.clone(),
        asset_type: body.asset_type.clone(),
        label: body.label.clone(),
        asset_profile_id: body.asset_profile_id.map(EntityId::from_bytes),
        additional_info: body.additional_info.clone(),
    })
}

#[async_trait]
impl Translator for AssetTranslator {
    fn kind(&self) -> EntityKind {
        EntityKind::Asset
    }

    async fn apply_inbound(
        &self,
        ctx: &InboundContext,
        msg: &EntityUpdateMsg,
    ) -> SyncResult<ApplyOutcome> {
        apply_entity(self.repo.as_ref(), ctx, msg, true, asset_from_body).await
    }

    async fn build_outbound(&self, event: &ChangeEvent) -> SyncResult<Option<EntityUpdateMsg>> {
        build_entity(self.repo.as_ref(), event, constructor::asset_body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use edgesync_core::{ChangeAction, CustomerId, EventQueue, MemoryRepository, TenantId};
    use edgesync_protocol::UpdateMsgType;
    use serde_json::json;

    struct Fixture {
        events: Arc<EventQueue>,
        repo: Arc<MemoryRepository<Asset>>,
        translator: AssetTranslator,
        tenant: TenantId,
    }

    fn fixture() -> Fixture {
        let events = Arc::new(EventQueue::new());
        let repo = Arc::new(MemoryRepository::new(Arc::clone(&events)));
        let translator = AssetTranslator::new(repo.clone());
        Fixture {
            events,
            repo,
            translator,
            tenant: TenantId::new(),
        }
    }

    fn pump() -> Asset {
        let mut asset = Asset::new(TenantId::new(), "Pump 7", "pump");
        asset.additional_info = Some(json!({"site": "north"}));
        asset
    }

    fn update(asset: &Asset, msg_type: UpdateMsgType) -> EntityUpdateMsg {
        constructor::construct_update_msg(
            EntityKind::Asset,
            msg_type,
            asset.id,
            asset.customer_id,
            constructor::asset_body(asset),
        )
    }

    #[tokio::test]
    async fn created_is_applied_with_follow_up() {
        let f = fixture();
        let asset = pump();
        let ctx = InboundContext::new(f.tenant);

        let outcome = f
            .translator
            .apply_inbound(&ctx, &update(&asset, UpdateMsgType::Created))
            .await
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied { follow_up: true });

        let stored = f.repo.find_by_id(f.tenant, asset.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Pump 7");
        assert_eq!(stored.tenant_id, f.tenant);
        assert_eq!(stored.additional_info, asset.additional_info);
    }

    #[tokio::test]
    async fn repeated_update_is_idempotent() {
        let f = fixture();
        let asset = pump();
        let ctx = InboundContext::new(f.tenant);
        let msg = update(&asset, UpdateMsgType::Updated);

        f.translator.apply_inbound(&ctx, &msg).await.unwrap();
        let first = f.repo.list(f.tenant).await.unwrap();
        f.translator.apply_inbound(&ctx, &msg).await.unwrap();
        assert_eq!(f.repo.list(f.tenant).await.unwrap(), first);
        assert_eq!(first.len(), 1);
    }

    #[tokio::test]
    async fn owner_hint_used_when_message_has_none() {
        let f = fixture();
        let hint = CustomerId::new();
        let ctx = InboundContext::new(f.tenant).with_owner_hint(Some(hint));
        let asset = pump();

        f.translator
            .apply_inbound(&ctx, &update(&asset, UpdateMsgType::Created))
            .await
            .unwrap();
        let stored = f.repo.find_by_id(f.tenant, asset.id).await.unwrap().unwrap();
        assert_eq!(stored.customer_id, Some(hint));
    }

    #[tokio::test]
    async fn delete_of_absent_is_success() {
        let f = fixture();
        let ctx = InboundContext::new(f.tenant);
        let msg = constructor::construct_delete_msg(EntityKind::Asset, EntityId::new());

        let outcome = f.translator.apply_inbound(&ctx, &msg).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::AlreadyAbsent);
    }

    #[tokio::test]
    async fn delete_removes_and_repeats_quietly() {
        let f = fixture();
        let ctx = InboundContext::new(f.tenant);
        let asset = pump();
        f.translator
            .apply_inbound(&ctx, &update(&asset, UpdateMsgType::Created))
            .await
            .unwrap();

        let msg = constructor::construct_delete_msg(EntityKind::Asset, asset.id);
        assert_eq!(
            f.translator.apply_inbound(&ctx, &msg).await.unwrap(),
            ApplyOutcome::Deleted
        );
        assert_eq!(
            f.translator.apply_inbound(&ctx, &msg).await.unwrap(),
            ApplyOutcome::AlreadyAbsent
        );
        assert!(f.repo.find_by_id(f.tenant, asset.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_action_is_reported() {
        let f = fixture();
        let mut msg = update(&pump(), UpdateMsgType::Created);
        msg.msg_type = 42;

        let outcome = f
            .translator
            .apply_inbound(&InboundContext::new(f.tenant), &msg)
            .await
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Unsupported { raw: 42 });
        assert!(f.repo.is_empty());
    }

    #[tokio::test]
    async fn missing_or_foreign_body_is_invalid() {
        let f = fixture();
        let ctx = InboundContext::new(f.tenant);
        let mut msg = update(&pump(), UpdateMsgType::Created);
        msg.body = None;
        assert!(matches!(
            f.translator.apply_inbound(&ctx, &msg).await,
            Err(SyncError::InvalidPayload { kind: EntityKind::Asset, .. })
        ));

        let customer = edgesync_core::Customer::new(f.tenant, "Acme");
        msg.body = Some(constructor::customer_body(&customer));
        assert!(matches!(
            f.translator.apply_inbound(&ctx, &msg).await,
            Err(SyncError::InvalidPayload { .. })
        ));
    }

    #[tokio::test]
    async fn build_maps_action_to_msg_type() {
        let f = fixture();
        let asset = pump();
        f.repo.upsert(f.tenant, asset.clone()).await.unwrap();

        for action in [
            ChangeAction::Created,
            ChangeAction::Updated,
            ChangeAction::AssignedToOwner,
            ChangeAction::UnassignedFromOwner,
        ] {
            let event = ChangeEvent::new(
                f.tenant.to_bytes(),
                EntityKind::Asset,
                asset.id.to_bytes(),
                action,
            );
            let msg = f.translator.build_outbound(&event).await.unwrap().unwrap();
            assert_eq!(msg.msg_type(), Some(action.to_msg_type()));
            assert_eq!(msg.body, Some(constructor::asset_body(&asset)));
        }
    }

    #[tokio::test]
    async fn build_is_repeatable() {
        let f = fixture();
        let asset = pump();
        f.repo.upsert(f.tenant, asset.clone()).await.unwrap();
        let event = f.events.pending(1).remove(0);

        let first = f.translator.build_outbound(&event).await.unwrap();
        let second = f.translator.build_outbound(&event).await.unwrap();
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn build_after_delete_is_skipped() {
        let f = fixture();
        let asset = pump();
        f.repo.upsert(f.tenant, asset.clone()).await.unwrap();
        f.repo.delete(f.tenant, asset.id).await.unwrap();

        let events = f.events.pending(10);
        assert_eq!(events.len(), 2);
        assert_eq!(f.translator.build_outbound(&events[0]).await.unwrap(), None);

        let delete = f.translator.build_outbound(&events[1]).await.unwrap().unwrap();
        assert_eq!(delete.msg_type(), Some(UpdateMsgType::Deleted));
        assert_eq!(delete.entity_id, asset.id.to_bytes());
    }
}
