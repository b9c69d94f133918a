//! Entity translators.
//!
//! A translator moves one kind of entity between local storage and the
//! wire. Inbound, it applies a peer's change message to the local
//! repository. Outbound, it turns a locally recorded change event into the
//! message the peer needs.
//!
//! Translators hold nothing but repository handles, so one instance serves
//! every message of its kind concurrently.

pub mod constructor;

mod asset;
mod customer;
mod dashboard;
mod device;
mod entity_view;
mod relation;
mod user;

pub use asset::AssetTranslator;
pub use customer::CustomerTranslator;
pub use dashboard::DashboardTranslator;
pub use device::DeviceTranslator;
pub use entity_view::EntityViewTranslator;
pub use relation::RelationTranslator;
pub use user::UserTranslator;

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use edgesync_core::store::{EntityRepository, StoredEntity};
use edgesync_core::{ChangeEvent, CustomerId, EntityId, EntityKind, Stores, TenantId};
use edgesync_protocol::{EntityBody, EntityUpdateMsg, UpdateMsgType};
use std::sync::Arc;

/// Who an inbound message is applied for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundContext {
    /// Tenant the local copy belongs to.
    pub tenant_id: TenantId,
    /// Owner to use when the message names none.
    pub owner_hint: Option<CustomerId>,
}

impl InboundContext {
    /// Creates a context with no owner hint.
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            owner_hint: None,
        }
    }

    /// Sets the owner hint.
    pub fn with_owner_hint(mut self, owner: Option<CustomerId>) -> Self {
        self.owner_hint = owner;
        self
    }
}

/// What applying an inbound message did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The entity was created or updated.
    Applied {
        /// Dependent data was not inlined and must be requested.
        follow_up: bool,
    },
    /// The entity was deleted.
    Deleted,
    /// The entity to delete did not exist.
    AlreadyAbsent,
    /// The action code is not one this node understands.
    Unsupported {
        /// The raw action code.
        raw: u8,
    },
}

impl ApplyOutcome {
    /// Returns true if follow-up data must be requested.
    pub fn needs_follow_up(&self) -> bool {
        matches!(self, ApplyOutcome::Applied { follow_up: true })
    }
}

/// Moves one kind of entity between local storage and the wire.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Kind this translator handles.
    fn kind(&self) -> EntityKind;

    /// Wire actions this translator applies and emits.
    ///
    /// The two directions handle the same set: every action
    /// `build_outbound` can emit is one `apply_inbound` accepts.
    fn handled_msg_types(&self) -> &'static [UpdateMsgType] {
        &UpdateMsgType::ALL
    }

    /// Applies a message from the peer to local storage.
    async fn apply_inbound(
        &self,
        ctx: &InboundContext,
        msg: &EntityUpdateMsg,
    ) -> SyncResult<ApplyOutcome>;

    /// Builds the message propagating a local change, or `None` if the
    /// entity no longer exists.
    async fn build_outbound(&self, event: &ChangeEvent) -> SyncResult<Option<EntityUpdateMsg>>;
}

/// Creates one translator per entity kind over the given stores.
pub fn standard_set(stores: &Stores) -> Vec<Arc<dyn Translator>> {
    vec![
        Arc::new(AssetTranslator::new(Arc::clone(&stores.assets))),
        Arc::new(DeviceTranslator::new(Arc::clone(&stores.devices))),
        Arc::new(EntityViewTranslator::new(Arc::clone(&stores.entity_views))),
        Arc::new(DashboardTranslator::new(Arc::clone(&stores.dashboards))),
        Arc::new(CustomerTranslator::new(Arc::clone(&stores.customers))),
        Arc::new(UserTranslator::new(Arc::clone(&stores.users))),
        Arc::new(RelationTranslator::new(Arc::clone(&stores.relations))),
    ]
}

/// Identity of the local entity an inbound message targets.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Target {
    pub id: EntityId,
    pub tenant_id: TenantId,
    pub owner: Option<CustomerId>,
}

/// The message owner if present, else the context's hint. Kinds that
/// cannot be owned ignore both.
fn resolve_owner(
    kind: EntityKind,
    ctx: &InboundContext,
    msg: &EntityUpdateMsg,
) -> Option<CustomerId> {
    if !kind.is_ownable() {
        return None;
    }
    msg.customer_id.map(CustomerId::from_bytes).or(ctx.owner_hint)
}

pub(crate) fn wrong_body(kind: EntityKind, body: &EntityBody) -> SyncError {
    SyncError::invalid_payload(kind, format!("carries a {} body", body.kind()))
}

/// Applies an inbound message to `repo`, decoding the body with `decode`.
pub(crate) async fn apply_entity<E, F>(
    repo: &dyn EntityRepository<E>,
    ctx: &InboundContext,
    msg: &EntityUpdateMsg,
    follow_up: bool,
    decode: F,
) -> SyncResult<ApplyOutcome>
where
    E: StoredEntity,
    F: FnOnce(&EntityBody, Target) -> SyncResult<E> + Send,
{
    let id = EntityId::from_bytes(msg.entity_id);
    match msg.msg_type() {
        Some(UpdateMsgType::Created | UpdateMsgType::Updated) => {
            let body = msg
                .body
                .as_ref()
                .ok_or_else(|| SyncError::invalid_payload(E::KIND, "missing body"))?;
            let target = Target {
                id,
                tenant_id: ctx.tenant_id,
                owner: resolve_owner(E::KIND, ctx, msg),
            };
            let entity = decode(body, target)?;
            repo.upsert(ctx.tenant_id, entity).await?;
            tracing::debug!(kind = %E::KIND, %id, "applied inbound update");
            Ok(ApplyOutcome::Applied { follow_up })
        }
        Some(UpdateMsgType::Deleted) => {
            if repo.delete(ctx.tenant_id, id).await? {
                tracing::debug!(kind = %E::KIND, %id, "applied inbound delete");
                Ok(ApplyOutcome::Deleted)
            } else {
                tracing::debug!(kind = %E::KIND, %id, "inbound delete for absent entity");
                Ok(ApplyOutcome::AlreadyAbsent)
            }
        }
        None => {
            tracing::warn!(kind = %E::KIND, %id, raw = msg.msg_type, "unsupported action");
            Ok(ApplyOutcome::Unsupported { raw: msg.msg_type })
        }
    }
}

/// Builds the outbound message for `event`, reading the entity from
/// `repo` unless the event is a delete.
pub(crate) async fn build_entity<E, F>(
    repo: &dyn EntityRepository<E>,
    event: &ChangeEvent,
    body: F,
) -> SyncResult<Option<EntityUpdateMsg>>
where
    E: StoredEntity,
    F: FnOnce(&E) -> EntityBody + Send,
{
    let id = EntityId::from_bytes(event.entity_id);
    if !event.action.needs_lookup() {
        return Ok(Some(constructor::construct_delete_msg(E::KIND, id)));
    }

    let tenant_id = TenantId::from_bytes(event.tenant_id);
    match repo.find_by_id(tenant_id, id).await? {
        Some(entity) => Ok(Some(constructor::construct_update_msg(
            E::KIND,
            event.action.to_msg_type(),
            id,
            entity.owner(),
            body(&entity),
        ))),
        None => {
            tracing::info!(
                kind = %E::KIND,
                %id,
                sequence = event.sequence,
                "entity no longer exists, skipping outbound message"
            );
            Ok(None)
        }
    }
}
