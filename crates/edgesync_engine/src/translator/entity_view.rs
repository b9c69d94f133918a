//! Entity view translator.

use super::{
    apply_entity, build_entity, constructor, wrong_body, ApplyOutcome, InboundContext, Target,
    Translator,
};
use crate::error::SyncResult;
use async_trait::async_trait;
use edgesync_core::store::EntityRepository;
use edgesync_core::{ChangeEvent, EntityKind, EntityView};
use edgesync_protocol::{EntityBody, EntityUpdateMsg};
use std::sync::Arc;

/// Translates entity views. The projected attributes are requested as
/// follow-up data.
pub struct EntityViewTranslator {
    repo: Arc<dyn EntityRepository<EntityView>>,
}

impl EntityViewTranslator {
    /// Creates a translator over `repo`.
    pub fn new(repo: Arc<dyn EntityRepository<EntityView>>) -> Self {
        Self { repo }
    }
}

fn view_from_body(body: &EntityBody, target: Target) -> SyncResult<EntityView> {
    let EntityBody::EntityView(body) = body else {
        return Err(wrong_body(EntityKind::EntityView, body));
    };
    Ok(EntityView {
        id: target.id,
        tenant_id: target.tenant_id,
        customer_id: target.owner,
        name: body.name.clone(),
        view_type: body.view_type.clone(),
        target: body.target,
        additional_info: body.additional_info.clone(),
    })
}

#[async_trait]
impl Translator for EntityViewTranslator {
    fn kind(&self) -> EntityKind {
        EntityKind::EntityView
    }

    async fn apply_inbound(
        &self,
        ctx: &InboundContext,
        msg: &EntityUpdateMsg,
    ) -> SyncResult<ApplyOutcome> {
        apply_entity(self.repo.as_ref(), ctx, msg, true, view_from_body).await
    }

    async fn build_outbound(&self, event: &ChangeEvent) -> SyncResult<Option<EntityUpdateMsg>> {
        build_entity(self.repo.as_ref(), event, constructor::entity_view_body).await
    }
}
