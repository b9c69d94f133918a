//! Property-based test generators using proptest.
//!
//! Strategies produce entities and wire messages that pass validation,
//! so properties exercise replication rather than rejection.

use edgesync_core::{Asset, ChangeAction, CustomerId, EntityId, EntityKind, TenantId};
use edgesync_engine::translator::constructor;
use edgesync_protocol::{EntityUpdateMsg, UpdateMsgType};
use proptest::prelude::*;
use serde_json::Value;

/// Strategy for entity ids.
pub fn entity_id_strategy() -> impl Strategy<Value = EntityId> {
    prop::array::uniform16(any::<u8>()).prop_map(EntityId::from_bytes)
}

/// Strategy for tenant ids.
pub fn tenant_id_strategy() -> impl Strategy<Value = TenantId> {
    prop::array::uniform16(any::<u8>()).prop_map(TenantId::from_bytes)
}

/// Strategy for an optional owning customer.
pub fn owner_strategy() -> impl Strategy<Value = Option<CustomerId>> {
    prop::option::of(prop::array::uniform16(any::<u8>()).prop_map(CustomerId::from_bytes))
}

/// Strategy for entity kinds.
pub fn entity_kind_strategy() -> impl Strategy<Value = EntityKind> {
    prop::sample::select(EntityKind::ALL.to_vec())
}

/// Strategy for local change actions.
pub fn change_action_strategy() -> impl Strategy<Value = ChangeAction> {
    prop::sample::select(ChangeAction::ALL.to_vec())
}

/// Strategy for raw wire action codes, mostly known ones.
pub fn action_code_strategy() -> impl Strategy<Value = u8> {
    prop_oneof![
        4 => prop::sample::select(
            UpdateMsgType::ALL.iter().map(UpdateMsgType::to_code).collect::<Vec<_>>()
        ),
        1 => any::<u8>(),
    ]
}

/// Strategy for small JSON metadata objects.
pub fn additional_info_strategy() -> impl Strategy<Value = Option<Value>> {
    prop::option::of(
        prop::collection::btree_map("[a-z]{1,8}", any::<i32>(), 0..4).prop_map(|map| {
            Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
        }),
    )
}

fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9 _-]{0,23}").expect("Invalid regex")
}

/// Strategy for valid assets of `tenant_id`.
pub fn asset_strategy(tenant_id: TenantId) -> impl Strategy<Value = Asset> {
    (
        entity_id_strategy(),
        owner_strategy(),
        name_strategy(),
        "[a-z]{1,12}",
        prop::option::of("[a-z ]{0,16}"),
        additional_info_strategy(),
    )
        .prop_map(
            move |(id, customer_id, name, asset_type, label, additional_info)| Asset {
                id,
                tenant_id,
                customer_id,
                name,
                asset_type,
                label,
                asset_profile_id: None,
                additional_info,
            },
        )
}

/// Strategy for asset messages: creates, updates and deletes of valid
/// assets.
pub fn asset_msg_strategy() -> impl Strategy<Value = EntityUpdateMsg> {
    (
        asset_strategy(TenantId::from_bytes([0; 16])),
        prop::sample::select(UpdateMsgType::ALL.to_vec()),
    )
        .prop_map(|(asset, msg_type)| match msg_type {
            UpdateMsgType::Deleted => constructor::construct_delete_msg(EntityKind::Asset, asset.id),
            _ => constructor::construct_update_msg(
                EntityKind::Asset,
                msg_type,
                asset.id,
                asset.customer_id,
                constructor::asset_body(&asset),
            ),
        })
}
