//! Customer translator.

use super::{
    apply_entity, build_entity, constructor, wrong_body, ApplyOutcome, InboundContext, Target,
    Translator,
};
use crate::error::SyncResult;
use async_trait::async_trait;
use edgesync_core::store::EntityRepository;
use edgesync_core::{ChangeEvent, Customer, EntityKind};
use edgesync_protocol::{EntityBody, EntityUpdateMsg};
use std::sync::Arc;

/// Translates customers. Customer attributes are requested as follow-up
/// data.
pub struct CustomerTranslator {
    repo: Arc<dyn EntityRepository<Customer>>,
}

impl CustomerTranslator {
    /// Creates a translator over `repo`.
    pub fn new(repo: Arc<dyn EntityRepository<Customer>>) -> Self {
        Self { repo }
    }
}

fn customer_from_body(body: &EntityBody, target: Target) -> SyncResult<Customer> {
    let EntityBody::Customer(body) = body else {
        return Err(wrong_body(EntityKind::Customer, body));
    };
    Ok(Customer {
        id: target.id,
        tenant_id: target.tenant_id,
        title: body.title.clone(),
        email: body.email.clone(),
        phone: body.phone.clone(),
        country: body.country.clone(),
        additional_info: body.additional_info.clone(),
    })
}

#[async_trait]
impl Translator for CustomerTranslator {
    fn kind(&self) -> EntityKind {
        EntityKind::Customer
    }

    async fn apply_inbound(
        &self,
        ctx: &InboundContext,
        msg: &EntityUpdateMsg,
    ) -> SyncResult<ApplyOutcome> {
        apply_entity(self.repo.as_ref(), ctx, msg, true, customer_from_body).await
    }

    async fn build_outbound(&self, event: &ChangeEvent) -> SyncResult<Option<EntityUpdateMsg>> {
        build_entity(self.repo.as_ref(), event, constructor::customer_body).await
    }
}
