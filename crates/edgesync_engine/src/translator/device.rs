//! Device translator.

use super::{
    apply_entity, build_entity, constructor, wrong_body, ApplyOutcome, InboundContext, Target,
    Translator,
};
use crate::error::SyncResult;
use async_trait::async_trait;
use edgesync_core::store::EntityRepository;
use edgesync_core::{ChangeEvent, Device, DeviceCredentials, EntityId, EntityKind};
use edgesync_protocol::{DeviceBody, EntityBody, EntityUpdateMsg, UpdateMsgType};
use std::sync::Arc;

/// Translates devices.
///
/// Credentials travel inline when the sender has them; a message without
/// credentials keeps the ones stored locally. Device attributes are
/// always requested as follow-up data.
pub struct DeviceTranslator {
    repo: Arc<dyn EntityRepository<Device>>,
}

impl DeviceTranslator {
    /// Creates a translator over `repo`.
    pub fn new(repo: Arc<dyn EntityRepository<Device>>) -> Self {
        Self { repo }
    }

    async fn stored_credentials(
        &self,
        ctx: &InboundContext,
        msg: &EntityUpdateMsg,
    ) -> SyncResult<Option<DeviceCredentials>> {
        let upsert = matches!(
            msg.msg_type(),
            Some(UpdateMsgType::Created | UpdateMsgType::Updated)
        );
        let inline = matches!(
            &msg.body,
            Some(EntityBody::Device(DeviceBody {
                credentials: Some(_),
                ..
            }))
        );
        if !upsert || inline {
            return Ok(None);
        }
        let existing = self
            .repo
            .find_by_id(ctx.tenant_id, EntityId::from_bytes(msg.entity_id))
            .await?;
        Ok(existing.and_then(|device| device.credentials))
    }
}

fn device_from_body(
    body: &EntityBody,
    target: Target,
    stored_credentials: Option<DeviceCredentials>,
) -> SyncResult<Device> {
    let EntityBody::Device(body) = body else {
        return Err(wrong_body(EntityKind::Device, body));
    };
    let credentials = match &body.credentials {
        Some(inline) => Some(DeviceCredentials {
            credentials_type: inline.credentials_type.clone(),
            credentials_id: inline.credentials_id.clone(),
            credentials_value: inline.credentials_value.clone(),
        }),
        None => stored_credentials,
    };
    Ok(Device {
        id: target.id,
        tenant_id: target.tenant_id,
        customer_id: target.owner,
        name: body.name.clone(),
        device_type: body.device_type.clone(),
        label: body.label.clone(),
        device_profile_id: body.device_profile_id.map(EntityId::from_bytes),
        credentials,
        additional_info: body.additional_info.clone(),
    })
}

#[async_trait]
impl Translator for DeviceTranslator {
    fn kind(&self) -> EntityKind {
        EntityKind::Device
    }

    async fn apply_inbound(
        &self,
        ctx: &InboundContext,
        msg: &EntityUpdateMsg,
    ) -> SyncResult<ApplyOutcome> {
        let stored = self.stored_credentials(ctx, msg).await?;
        apply_entity(self.repo.as_ref(), ctx, msg, true, move |body, target| {
            device_from_body(body, target, stored)
        })
        .await
    }

    async fn build_outbound(&self, event: &ChangeEvent) -> SyncResult<Option<EntityUpdateMsg>> {
        build_entity(self.repo.as_ref(), event, constructor::device_body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgesync_core::{EventQueue, MemoryRepository, TenantId};

    fn credentials(id: &str) -> DeviceCredentials {
        DeviceCredentials {
            credentials_type: "ACCESS_TOKEN".into(),
            credentials_id: id.into(),
            credentials_value: None,
        }
    }

    fn setup() -> (Arc<MemoryRepository<Device>>, DeviceTranslator, InboundContext) {
        let repo = Arc::new(MemoryRepository::new(Arc::new(EventQueue::new())));
        let translator = DeviceTranslator::new(repo.clone());
        (repo, translator, InboundContext::new(TenantId::new()))
    }

    fn update(device: &Device) -> EntityUpdateMsg {
        constructor::construct_update_msg(
            EntityKind::Device,
            UpdateMsgType::Updated,
            device.id,
            device.customer_id,
            constructor::device_body(device),
        )
    }

    #[tokio::test]
    async fn inline_credentials_are_applied() {
        let (repo, translator, ctx) = setup();
        let mut device = Device::new(ctx.tenant_id, "Sensor", "thermometer");
        device.credentials = Some(credentials("token-1"));

        let outcome = translator.apply_inbound(&ctx, &update(&device)).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied { follow_up: true });
        let stored = repo.find_by_id(ctx.tenant_id, device.id).await.unwrap().unwrap();
        assert_eq!(stored.credentials, Some(credentials("token-1")));
    }

    #[tokio::test]
    async fn missing_credentials_keep_local_ones() {
        let (repo, translator, ctx) = setup();
        let mut device = Device::new(ctx.tenant_id, "Sensor", "thermometer");
        device.credentials = Some(credentials("token-1"));
        translator.apply_inbound(&ctx, &update(&device)).await.unwrap();

        device.credentials = None;
        device.label = Some("roof".into());
        let outcome = translator.apply_inbound(&ctx, &update(&device)).await.unwrap();
        assert!(outcome.needs_follow_up());

        let stored = repo.find_by_id(ctx.tenant_id, device.id).await.unwrap().unwrap();
        assert_eq!(stored.label.as_deref(), Some("roof"));
        assert_eq!(stored.credentials, Some(credentials("token-1")));
    }

    #[tokio::test]
    async fn outbound_inlines_credentials() {
        let (repo, translator, ctx) = setup();
        let mut device = Device::new(ctx.tenant_id, "Sensor", "thermometer");
        device.credentials = Some(credentials("token-2"));
        repo.upsert(ctx.tenant_id, device.clone()).await.unwrap();

        let event = ChangeEvent::updated(
            ctx.tenant_id.to_bytes(),
            EntityKind::Device,
            device.id.to_bytes(),
        );
        let msg = translator.build_outbound(&event).await.unwrap().unwrap();
        match msg.body {
            Some(EntityBody::Device(body)) => {
                let id = body.credentials.map(|c| c.credentials_id);
                assert_eq!(id.as_deref(), Some("token-2"));
            }
            other => panic!("unexpected body {other:?}"),
        }
    }
}
