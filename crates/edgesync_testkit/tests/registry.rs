//! Registry completeness and dispatch.

use edgesync_engine::translator::{constructor, AssetTranslator, DeviceTranslator};
use edgesync_engine::{follow_up, SyncConfig};
use edgesync_protocol::{InboundEnvelope, UpdateMsgType};
use edgesync_testkit::prelude::*;
use std::sync::Arc;

#[test]
fn standard_registry_covers_every_kind() {
    let stores = Stores::in_memory(Arc::new(EventQueue::new()));
    let registry = TranslatorRegistry::standard(&stores);
    registry.ensure_complete().unwrap();
    assert_eq!(registry.len(), EntityKind::ALL.len());
    for kind in EntityKind::ALL {
        assert_eq!(registry.resolve(kind).unwrap().kind(), kind);
    }
}

#[test]
fn translators_emit_only_what_they_accept() {
    let stores = Stores::in_memory(Arc::new(EventQueue::new()));
    let registry = TranslatorRegistry::standard(&stores);
    for kind in registry.kinds() {
        let handled = registry.resolve(kind).unwrap().handled_msg_types();
        for action in ChangeAction::ALL {
            assert!(handled.contains(&action.to_msg_type()), "{kind} {action:?}");
        }
    }
}

fn partial_registry(stores: &Stores) -> TranslatorRegistry {
    TranslatorRegistry::builder()
        .register(AssetTranslator::new(Arc::clone(&stores.assets)))
        .and_then(|b| b.register(DeviceTranslator::new(Arc::clone(&stores.devices))))
        .unwrap()
        .build()
}

#[tokio::test]
async fn partial_registry_reports_missing_kinds() {
    let stores = Stores::in_memory(Arc::new(EventQueue::new()));
    let registry = partial_registry(&stores);

    assert_eq!(registry.len(), 2);
    assert!(registry.missing_kinds().contains(&EntityKind::Dashboard));
    assert!(matches!(
        registry.ensure_complete(),
        Err(SyncError::UnregisteredKind(_))
    ));
    assert!(matches!(
        registry.resolve(EntityKind::Relation),
        Err(SyncError::UnregisteredKind(EntityKind::Relation))
    ));
}

#[test]
fn duplicate_registration_is_rejected() {
    let stores = Stores::in_memory(Arc::new(EventQueue::new()));
    let result = TranslatorRegistry::builder()
        .register(AssetTranslator::new(Arc::clone(&stores.assets)))
        .and_then(|b| b.register(AssetTranslator::new(Arc::clone(&stores.assets))));
    assert!(matches!(result, Err(SyncError::DuplicateTranslator(EntityKind::Asset))));
}

#[tokio::test]
async fn unregistered_kind_aborts_the_envelope() {
    let tenant = TenantId::new();
    let node = TestNode::with_registry("cloud", tenant, &SyncConfig::default(), partial_registry);

    let asset = Asset::new(tenant, "Boiler", "boiler");
    let dashboard = Dashboard {
        id: EntityId::new(),
        tenant_id: tenant,
        title: "Plant".into(),
        configuration: serde_json::Value::Null,
        assigned_customers: Vec::new(),
    };
    let envelope = InboundEnvelope::new(
        3,
        vec![
            constructor::construct_update_msg(
                EntityKind::Dashboard,
                UpdateMsgType::Created,
                dashboard.id,
                None,
                constructor::dashboard_body(&dashboard),
            ),
            constructor::construct_update_msg(
                EntityKind::Asset,
                UpdateMsgType::Created,
                asset.id,
                None,
                constructor::asset_body(&asset),
            ),
        ],
    );

    let err = node
        .coordinator
        .process_envelope(tenant, None, &envelope, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::UnregisteredKind(EntityKind::Dashboard)));
    assert!(err.is_fatal());
    assert_eq!(node.stores.count(tenant, EntityKind::Asset).await.unwrap(), 0);
}

#[tokio::test]
async fn registry_is_shared_across_coordinators() {
    let stores = Stores::in_memory(Arc::new(EventQueue::new()));
    let registry = TranslatorRegistry::standard(&stores);
    let (requester, _rx) = follow_up::channel();
    let requester = Arc::new(requester);

    let a = SyncCoordinator::new(registry.clone(), requester.clone());
    let b = SyncCoordinator::new(registry, requester);
    assert_eq!(a.registry().kinds(), b.registry().kinds());
}
