//! Relation translator.

use super::{
    apply_entity, build_entity, constructor, wrong_body, ApplyOutcome, InboundContext, Target,
    Translator,
};
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use edgesync_core::store::EntityRepository;
use edgesync_core::{ChangeEvent, EntityKind, Relation};
use edgesync_protocol::{EntityBody, EntityUpdateMsg};
use std::sync::Arc;

/// Translates relations.
///
/// A relation's id is derived from its key, so the id in the message must
/// match the one derived from the body.
pub struct RelationTranslator {
    repo: Arc<dyn EntityRepository<Relation>>,
}

impl RelationTranslator {
    /// Creates a translator over `repo`.
    pub fn new(repo: Arc<dyn EntityRepository<Relation>>) -> Self {
        Self { repo }
    }
}

fn relation_from_body(body: &EntityBody, target: Target) -> SyncResult<Relation> {
    let EntityBody::Relation(body) = body else {
        return Err(wrong_body(EntityKind::Relation, body));
    };
    let relation = Relation::new(
        target.tenant_id,
        body.from,
        body.to,
        body.relation_type.clone(),
        body.type_group.clone(),
    );
    if relation.id != target.id {
        return Err(SyncError::invalid_payload(
            EntityKind::Relation,
            format!("id {} does not match relation key", target.id),
        ));
    }
    Ok(relation)
}

#[async_trait]
impl Translator for RelationTranslator {
    fn kind(&self) -> EntityKind {
        EntityKind::Relation
    }

    async fn apply_inbound(
        &self,
        ctx: &InboundContext,
        msg: &EntityUpdateMsg,
    ) -> SyncResult<ApplyOutcome> {
        apply_entity(self.repo.as_ref(), ctx, msg, false, relation_from_body).await
    }

    async fn build_outbound(&self, event: &ChangeEvent) -> SyncResult<Option<EntityUpdateMsg>> {
        build_entity(self.repo.as_ref(), event, constructor::relation_body).await
    }
}
