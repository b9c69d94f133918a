//! User translator.

use super::{
    apply_entity, build_entity, constructor, wrong_body, ApplyOutcome, InboundContext, Target,
    Translator,
};
use crate::error::SyncResult;
use async_trait::async_trait;
use edgesync_core::store::EntityRepository;
use edgesync_core::{ChangeEvent, EntityKind, User};
use edgesync_protocol::{EntityBody, EntityUpdateMsg};
use std::sync::Arc;

/// Translates users. Credentials never travel inline and are always
/// requested as follow-up data.
pub struct UserTranslator {
    repo: Arc<dyn EntityRepository<User>>,
}

impl UserTranslator {
    /// Creates a translator over `repo`.
    pub fn new(repo: Arc<dyn EntityRepository<User>>) -> Self {
        Self { repo }
    }
}

fn user_from_body(body: &EntityBody, target: Target) -> SyncResult<User> {
    let EntityBody::User(body) = body else {
        return Err(wrong_body(EntityKind::User, body));
    };
    Ok(User {
        id: target.id,
        tenant_id: target.tenant_id,
        customer_id: target.owner,
        email: body.email.clone(),
        authority: body.authority.clone(),
        first_name: body.first_name.clone(),
        last_name: body.last_name.clone(),
        additional_info: body.additional_info.clone(),
    })
}

#[async_trait]
impl Translator for UserTranslator {
    fn kind(&self) -> EntityKind {
        EntityKind::User
    }

    async fn apply_inbound(
        &self,
        ctx: &InboundContext,
        msg: &EntityUpdateMsg,
    ) -> SyncResult<ApplyOutcome> {
        apply_entity(self.repo.as_ref(), ctx, msg, true, user_from_body).await
    }

    async fn build_outbound(&self, event: &ChangeEvent) -> SyncResult<Option<EntityUpdateMsg>> {
        build_entity(self.repo.as_ref(), event, constructor::user_body).await
    }
}
