//! Outbound pump feeding a peer over the loopback transport.

use edgesync_engine::{LoopbackTransport, OutboundPump, SyncConfig};
use edgesync_protocol::InboundEnvelope;
use edgesync_testkit::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[tokio::test]
async fn pump_delivers_to_peer_until_shutdown() {
    let tenant = TenantId::new();
    let config = SyncConfig::new("edge").with_no_records_sleep(Duration::from_millis(5));
    let edge = TestNode::with_config("edge", tenant, &config);
    let cloud = TestNode::with_config("cloud", tenant, &config);

    let (transport, mut receiver) = LoopbackTransport::channel();
    let transport = Arc::new(transport);
    let pump = Arc::new(OutboundPump::new(
        Arc::clone(&edge.coordinator),
        Arc::clone(&edge.stores.events),
        transport.clone(),
        config,
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = {
        let pump = Arc::clone(&pump);
        tokio::spawn(async move { pump.run(shutdown_rx).await })
    };

    let assets: Vec<_> = (0..3)
        .map(|i| Asset::new(tenant, format!("Pump {i}"), "pump"))
        .collect();
    for asset in &assets {
        edge.stores.assets.upsert(tenant, asset.clone()).await.unwrap();
    }

    for _ in 0..assets.len() {
        let envelope = tokio::time::timeout(Duration::from_secs(1), receiver.recv())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let inbound = InboundEnvelope::from_outbound(&envelope);
        for result in cloud
            .coordinator
            .process_envelope(tenant, None, &inbound, cloud.stores.events.latest_sequence())
            .await
            .unwrap()
        {
            result.unwrap();
        }
    }

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert_eq!(transport.sent_count(), 3);
    assert_eq!(edge.pending_events(), 0);
    assert_eq!(cloud.pending_events(), 0);
    for asset in assets {
        let copy = cloud.stores.assets.find_by_id(tenant, asset.id).await.unwrap();
        assert_eq!(copy, Some(asset));
    }
    assert_eq!(cloud.take_follow_ups().len(), 3);
}

#[tokio::test]
async fn follow_up_requests_become_data_request_envelopes() {
    let link = TestLink::new();
    let tenant = link.tenant_id();
    let mut device = Device::new(tenant, "Sensor", "thermometer");
    device.customer_id = Some(CustomerId::new());
    link.edge.stores.devices.upsert(tenant, device.clone()).await.unwrap();
    link.sync_edge_to_cloud().await;

    let requests = link.cloud.take_follow_ups();
    assert_eq!(requests.len(), 1);
    let envelope = link.cloud.coordinator.follow_up_envelope(&requests[0]);
    assert!(envelope.message_id > 0);
    assert_eq!(envelope.entity_messages().count(), 0);
    let edgesync_protocol::UplinkPayload::DataRequest(request) = &envelope.payloads[0] else {
        panic!("expected a data request");
    };
    assert_eq!(request.kind, EntityKind::Device);
    assert_eq!(request.entity_id, device.id.to_bytes());
}

#[tokio::test]
async fn data_request_marker_is_the_requesters_sequence() {
    let link = TestLink::new();
    let tenant = link.tenant_id();
    for name in ["Acme", "Globex", "Initech"] {
        let customer = Customer::new(tenant, name);
        link.cloud.stores.customers.upsert(tenant, customer).await.unwrap();
    }
    let cloud_sequence = link.cloud.stores.events.latest_sequence();
    assert_eq!(cloud_sequence, 3);

    let device = Device::new(tenant, "Sensor", "thermometer");
    link.edge.stores.devices.upsert(tenant, device.clone()).await.unwrap();
    assert_eq!(link.edge.stores.events.latest_sequence(), 1);
    link.sync_edge_to_cloud().await;

    let requests = link.cloud.take_follow_ups();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].causal_start, cloud_sequence);
    let envelope = link.cloud.coordinator.follow_up_envelope(&requests[0]);
    let edgesync_protocol::UplinkPayload::DataRequest(request) = &envelope.payloads[0] else {
        panic!("expected a data request");
    };
    assert_eq!(request.causal_start, cloud_sequence);
    // Applying the edge's update was not recorded on the cloud.
    assert_eq!(link.cloud.stores.events.latest_sequence(), cloud_sequence);
}
