//! Outbound message constructors.
//!
//! Pure functions from local entities to wire messages.

use edgesync_core::{
    Asset, Customer, CustomerId, Dashboard, Device, DeviceCredentials, EntityId, EntityKind,
    EntityView, Relation, User,
};
use edgesync_protocol::{
    AssetBody, CustomerBody, DashboardBody, DeviceBody, DeviceCredentialsBody, EntityBody,
    EntityUpdateMsg, EntityViewBody, RelationBody, UpdateMsgType, UserBody,
};

/// Builds a created/updated message.
pub fn construct_update_msg(
    kind: EntityKind,
    msg_type: UpdateMsgType,
    id: EntityId,
    owner: Option<CustomerId>,
    body: EntityBody,
) -> EntityUpdateMsg {
    EntityUpdateMsg::update(
        kind,
        msg_type,
        id.to_bytes(),
        owner.map(CustomerId::to_bytes),
        body,
    )
}

/// Builds a delete message; deletes carry only the id.
pub fn construct_delete_msg(kind: EntityKind, id: EntityId) -> EntityUpdateMsg {
    EntityUpdateMsg::delete(kind, id.to_bytes())
}

/// Asset body.
pub fn asset_body(asset: &Asset) -> EntityBody {
    EntityBody::Asset(AssetBody {
        name: asset.name.clone(),
        asset_type: asset.asset_type.clone(),
        label: asset.label.clone(),
        asset_profile_id: asset.asset_profile_id.map(EntityId::to_bytes),
        additional_info: asset.additional_info.clone(),
    })
}

/// Device body, credentials inlined when known.
pub fn device_body(device: &Device) -> EntityBody {
    EntityBody::Device(DeviceBody {
        name: device.name.clone(),
        device_type: device.device_type.clone(),
        label: device.label.clone(),
        device_profile_id: device.device_profile_id.map(EntityId::to_bytes),
        credentials: device.credentials.as_ref().map(credentials_body),
        additional_info: device.additional_info.clone(),
    })
}

fn credentials_body(credentials: &DeviceCredentials) -> DeviceCredentialsBody {
    DeviceCredentialsBody {
        credentials_type: credentials.credentials_type.clone(),
        credentials_id: credentials.credentials_id.clone(),
        credentials_value: credentials.credentials_value.clone(),
    }
}

/// Entity view body.
pub fn entity_view_body(view: &EntityView) -> EntityBody {
    EntityBody::EntityView(EntityViewBody {
        name: view.name.clone(),
        view_type: view.view_type.clone(),
        target: view.target,
        additional_info: view.additional_info.clone(),
    })
}

/// Dashboard body, configuration included.
pub fn dashboard_body(dashboard: &Dashboard) -> EntityBody {
    EntityBody::Dashboard(DashboardBody {
        title: dashboard.title.clone(),
        configuration: dashboard.configuration.clone(),
        assigned_customers: dashboard
            .assigned_customers
            .iter()
            .map(|customer| customer.to_bytes())
            .collect(),
    })
}

/// Customer body.
pub fn customer_body(customer: &Customer) -> EntityBody {
    EntityBody::Customer(CustomerBody {
        title: customer.title.clone(),
        email: customer.email.clone(),
        phone: customer.phone.clone(),
        country: customer.country.clone(),
        additional_info: customer.additional_info.clone(),
    })
}

/// User body. Credentials are never sent inline.
pub fn user_body(user: &User) -> EntityBody {
    EntityBody::User(UserBody {
        email: user.email.clone(),
        authority: user.authority.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        additional_info: user.additional_info.clone(),
    })
}

/// Relation body.
pub fn relation_body(relation: &Relation) -> EntityBody {
    EntityBody::Relation(RelationBody {
        from: relation.from,
        to: relation.to,
        relation_type: relation.relation_type.clone(),
        type_group: relation.type_group.clone(),
    })
}
