//! Simulate command implementation.
//!
//! Wires an edge and a cloud node together with two loopback transports,
//! applies a scripted set of local changes on both sides and pumps until
//! neither side has anything left to send.

use edgesync_core::{
    Asset, Customer, Dashboard, Device, DeviceCredentials, EntityId, EntityKind, EntityRef,
    EntityRepository, EntityView, EventQueue, Relation, Stores, TenantId, User,
};
use edgesync_engine::follow_up::{self, ChannelRequester, FollowUpReceiver};
use edgesync_engine::{
    LoopbackReceiver, LoopbackTransport, OutboundPump, SyncConfig, SyncCoordinator, SyncResult,
    TranslatorRegistry, UplinkTransport,
};
use edgesync_protocol::{InboundEnvelope, UplinkPayload};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Upper bound on pump rounds.
const MAX_ROUNDS: usize = 64;

/// Simulation parameters.
#[derive(Debug, Clone)]
pub struct Options {
    /// Assets the edge creates.
    pub assets: usize,
    /// Outbound batch size.
    pub batch: usize,
    /// Merge pending follow-up requests.
    pub coalesce: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            assets: 5,
            batch: 50,
            coalesce: true,
        }
    }
}

/// State of one node after the run.
#[derive(Debug, Serialize)]
pub struct NodeReport {
    /// Node name.
    pub name: String,
    /// Entity count per kind.
    pub entities: BTreeMap<String, usize>,
    /// Change events still pending.
    pub pending_events: usize,
    /// Changes applied from the peer and therefore not recorded.
    pub echoes_suppressed: u64,
    /// Envelopes this node sent.
    pub envelopes_sent: u64,
}

/// Simulation result.
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    /// Pump rounds until both sides were quiet.
    pub rounds: usize,
    /// Follow-up requests sent to the peer.
    pub follow_ups_requested: usize,
    /// Follow-up requests merged into pending ones.
    pub follow_ups_coalesced: u64,
    /// Inbound messages that failed to apply.
    pub failed_messages: usize,
    /// Edge node.
    pub edge: NodeReport,
    /// Cloud node.
    pub cloud: NodeReport,
}

struct Node {
    name: &'static str,
    stores: Stores,
    coordinator: Arc<SyncCoordinator>,
    requester: ChannelRequester,
    follow_ups: FollowUpReceiver,
    transport: Arc<LoopbackTransport>,
    pump: OutboundPump,
}

impl Node {
    fn new(name: &'static str, options: &Options) -> (Self, LoopbackReceiver) {
        let config = SyncConfig::new(name)
            .with_max_read_records(options.batch.max(1))
            .with_coalesce_follow_ups(options.coalesce);
        let stores = Stores::in_memory(Arc::new(EventQueue::new()));
        let (requester, follow_ups) = follow_up::channel_with(config.coalesce_follow_ups);
        let coordinator = Arc::new(SyncCoordinator::new(
            TranslatorRegistry::standard(&stores),
            Arc::new(requester.clone()),
        ));
        let (transport, receiver) = LoopbackTransport::channel();
        let transport = Arc::new(transport);
        let pump = OutboundPump::new(
            Arc::clone(&coordinator),
            Arc::clone(&stores.events),
            transport.clone(),
            config,
        );
        let node = Self {
            name,
            stores,
            coordinator,
            requester,
            follow_ups,
            transport,
            pump,
        };
        (node, receiver)
    }

    /// Applies everything the peer has sent. Returns the number of
    /// envelopes and of failed messages.
    async fn receive(
        &self,
        tenant_id: TenantId,
        from_peer: &mut LoopbackReceiver,
    ) -> SyncResult<(usize, usize)> {
        let envelopes = from_peer.drain()?;
        let mut failed = 0;
        for envelope in &envelopes {
            for payload in &envelope.payloads {
                if let UplinkPayload::DataRequest(request) = payload {
                    tracing::debug!(
                        node = self.name,
                        kind = %request.kind,
                        peer_causal_start = request.causal_start,
                        "data request from peer"
                    );
                }
            }
            let inbound = InboundEnvelope::from_outbound(envelope);
            let causal_start = self.stores.events.latest_sequence();
            let results = self
                .coordinator
                .process_envelope(tenant_id, None, &inbound, causal_start)
                .await?;
            failed += results.iter().filter(|result| result.is_err()).count();
        }
        Ok((envelopes.len(), failed))
    }

    /// Sends a data request envelope for every queued follow-up.
    async fn send_follow_ups(&mut self) -> SyncResult<usize> {
        let requests = self.follow_ups.drain();
        for request in &requests {
            let envelope = self.coordinator.follow_up_envelope(request);
            self.transport.send(envelope).await?;
        }
        Ok(requests.len())
    }

    async fn report(&self, tenant_id: TenantId) -> SyncResult<NodeReport> {
        let mut entities = BTreeMap::new();
        for kind in EntityKind::ALL {
            entities.insert(
                kind.as_str().to_string(),
                self.stores.count(tenant_id, kind).await?,
            );
        }
        Ok(NodeReport {
            name: self.name.to_string(),
            entities,
            pending_events: self.stores.events.len(),
            echoes_suppressed: self.stores.events.suppressed_count(),
            envelopes_sent: self.transport.sent_count(),
        })
    }
}

async fn edge_script(stores: &Stores, tenant_id: TenantId, assets: usize) -> SyncResult<()> {
    let customer = Customer::new(tenant_id, "Acme Utilities");
    stores.customers.upsert(tenant_id, customer.clone()).await?;

    let mut created = Vec::with_capacity(assets);
    for i in 0..assets {
        let asset = Asset::new(tenant_id, format!("Pump station {i}"), "pump_station");
        stores.assets.upsert(tenant_id, asset.clone()).await?;
        created.push(asset);
    }

    let mut device = Device::new(tenant_id, "Flow meter", "flow_meter");
    device.customer_id = Some(customer.customer_id());
    device.credentials = Some(DeviceCredentials {
        credentials_type: "ACCESS_TOKEN".into(),
        credentials_id: format!("token-{}", device.id),
        credentials_value: None,
    });
    stores.devices.upsert(tenant_id, device.clone()).await?;

    let device_ref = EntityRef::new(EntityKind::Device, device.id.to_bytes());
    stores
        .entity_views
        .upsert(
            tenant_id,
            EntityView {
                id: EntityId::new(),
                tenant_id,
                customer_id: Some(customer.customer_id()),
                name: "Flow meter (public)".into(),
                view_type: "flow_meter".into(),
                target: device_ref,
                additional_info: None,
            },
        )
        .await?;

    stores
        .users
        .upsert(
            tenant_id,
            User {
                id: EntityId::new(),
                tenant_id,
                customer_id: Some(customer.customer_id()),
                email: "operator@acme.example".into(),
                authority: "CUSTOMER_USER".into(),
                first_name: Some("Field".into()),
                last_name: Some("Operator".into()),
                additional_info: None,
            },
        )
        .await?;

    if let Some(first) = created.first() {
        let relation = Relation::new(
            tenant_id,
            EntityRef::new(EntityKind::Asset, first.id.to_bytes()),
            device_ref,
            "Contains",
            "COMMON",
        );
        stores.relations.upsert(tenant_id, relation).await?;

        let mut assigned = first.clone();
        assigned.customer_id = Some(customer.customer_id());
        stores.assets.upsert(tenant_id, assigned).await?;
    }

    if created.len() > 1 {
        if let Some(last) = created.last() {
            stores.assets.delete(tenant_id, last.id).await?;
        }
    }

    Ok(())
}

async fn cloud_script(stores: &Stores, tenant_id: TenantId) -> SyncResult<()> {
    let dashboard = Dashboard {
        id: EntityId::new(),
        tenant_id,
        title: "Network overview".into(),
        configuration: serde_json::json!({ "widgets": ["map", "alarms"] }),
        assigned_customers: Vec::new(),
    };
    stores.dashboards.upsert(tenant_id, dashboard).await?;
    Ok(())
}

/// Runs the simulation and returns its report.
pub async fn simulate(options: &Options) -> SyncResult<SimulationReport> {
    let tenant_id = TenantId::new();
    let (mut edge, mut to_cloud) = Node::new("edge", options);
    let (mut cloud, mut to_edge) = Node::new("cloud", options);

    edge_script(&edge.stores, tenant_id, options.assets).await?;
    cloud_script(&cloud.stores, tenant_id).await?;

    let mut rounds = 0;
    let mut follow_ups_requested = 0;
    let mut failed_messages = 0;
    while rounds < MAX_ROUNDS {
        rounds += 1;
        let edge_sent = edge.pump.drain_once().await?;
        let (delivered, failed) = cloud.receive(tenant_id, &mut to_cloud).await?;
        failed_messages += failed;
        let requested = cloud.send_follow_ups().await?;
        follow_ups_requested += requested;

        let cloud_sent = cloud.pump.drain_once().await?;
        let (answered, failed) = edge.receive(tenant_id, &mut to_edge).await?;
        failed_messages += failed;
        follow_ups_requested += edge.send_follow_ups().await?;

        tracing::debug!(
            round = rounds,
            edge_sent = edge_sent.sent,
            cloud_sent = cloud_sent.sent,
            delivered,
            answered,
            "simulation round"
        );
        let quiet = !edge_sent.made_progress()
            && !cloud_sent.made_progress()
            && delivered == 0
            && answered == 0
            && requested == 0;
        if quiet {
            break;
        }
    }

    Ok(SimulationReport {
        rounds,
        follow_ups_requested,
        follow_ups_coalesced: edge.requester.coalesced_count() + cloud.requester.coalesced_count(),
        failed_messages,
        edge: edge.report(tenant_id).await?,
        cloud: cloud.report(tenant_id).await?,
    })
}

/// Runs the simulate command.
pub async fn run(options: &Options, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let report = simulate(options).await?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => print_text_output(&report),
    }

    Ok(())
}

fn print_text_output(report: &SimulationReport) {
    println!("Simulation finished after {} rounds", report.rounds);
    println!("  Follow-ups requested: {}", report.follow_ups_requested);
    println!("  Follow-ups coalesced: {}", report.follow_ups_coalesced);
    println!("  Failed messages:      {}", report.failed_messages);
    for node in [&report.edge, &report.cloud] {
        println!();
        println!("{}:", node.name);
        println!("  Envelopes sent:    {}", node.envelopes_sent);
        println!("  Echoes suppressed: {}", node.echoes_suppressed);
        println!("  Pending events:    {}", node.pending_events);
        for (kind, count) in &node.entities {
            println!("  {kind:<14} {count}");
        }
    }
}
