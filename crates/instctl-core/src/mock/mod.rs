//! In-memory providers for tests
//!
//! Enabled for this crate's unit tests and, through the `mock` feature, for
//! downstream crates. Both providers are cheap to clone; clones share state
//! so a test can keep a handle while the controller owns another.

use crate::config::{ComputeConfig, DnsProviderConfig};
use crate::error::{Error, Result};
use crate::traits::{
    ComputeProvider, ComputeProviderFactory, DnsProvider, DnsProviderFactory, DnsRecord, Instance,
    InstanceStatus, Operation, ResourceLocation, StaticIp, AUTOMATIC_TTL,
};
use crate::validation::InstanceTarget;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::sync::Mutex;

/// First address handed out by [`InMemoryCompute`] (203.0.113.10)
const FIRST_ADDRESS: u32 = u32::from_be_bytes([203, 0, 113, 10]);

const CREATED_AT: &str = "2024-01-01T00:00:00Z";

/// Provider call that [`InMemoryCompute`] should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Connect,
    ListInstances,
    GetInstance,
    Start,
    Stop,
    Reboot,
    ListStaticIps,
    Release,
    Allocate,
    Attach,
    GetStaticIp,
}

#[derive(Debug, Clone)]
struct MockInstance {
    state: String,
    public_ip: Option<String>,
}

#[derive(Debug, Default)]
struct ComputeState {
    instances: BTreeMap<String, MockInstance>,
    static_ips: Vec<StaticIp>,
    issued: u32,
    calls: Vec<&'static str>,
    connects: Vec<InstanceTarget>,
    fail: Option<FailPoint>,
}

impl ComputeState {
    fn next_address(&mut self) -> Ipv4Addr {
        let addr = Ipv4Addr::from(FIRST_ADDRESS + self.issued);
        self.issued += 1;
        addr
    }

    fn enter(&mut self, call: &'static str, point: FailPoint) -> Result<()> {
        self.calls.push(call);
        if self.fail == Some(point) {
            return Err(Error::api(format!("injected failure in {}", call)));
        }
        Ok(())
    }

    fn instance_mut(&mut self, name: &str) -> Result<&mut MockInstance> {
        self.instances
            .get_mut(name)
            .ok_or_else(|| Error::not_found(format!("instance {}", name)))
    }
}

fn operation(resource_name: &str, resource_type: &str, operation_type: &str) -> Operation {
    Operation {
        id: Some(format!("op-{}-{}", operation_type, resource_name)),
        resource_name: Some(resource_name.to_string()),
        resource_type: Some(resource_type.to_string()),
        operation_type: Some(operation_type.to_string()),
        status: Some("Succeeded".to_string()),
        created_at: Some(CREATED_AT.to_string()),
        status_changed_at: Some(CREATED_AT.to_string()),
        is_terminal: Some(true),
        location: Some(location()),
        ..Default::default()
    }
}

fn location() -> ResourceLocation {
    ResourceLocation {
        availability_zone: Some("us-east-1a".to_string()),
        region_name: Some("us-east-1".to_string()),
    }
}

/// In-memory compute account with static-IP bookkeeping
#[derive(Debug, Clone, Default)]
pub struct InMemoryCompute {
    state: Arc<Mutex<ComputeState>>,
}

impl InMemoryCompute {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instance with a dynamic public IP
    pub async fn add_instance(&self, name: &str, state: &str) {
        let mut guard = self.state.lock().await;
        let public_ip = guard.next_address().to_string();
        guard.instances.insert(
            name.to_string(),
            MockInstance {
                state: state.to_string(),
                public_ip: Some(public_ip),
            },
        );
    }

    /// Allocate and attach a static IP without recording calls
    pub async fn attach_fresh_ip(&self, instance: &str) -> Ipv4Addr {
        let mut guard = self.state.lock().await;
        let addr = guard.next_address();
        let name = format!("seed-{}-{}", instance, guard.issued);
        guard.static_ips.push(StaticIp {
            name,
            ip_address: Some(addr.to_string()),
            attached_to: Some(instance.to_string()),
            is_attached: true,
            created_at: Some(CREATED_AT.to_string()),
            location: Some(location()),
        });
        if let Some(inst) = guard.instances.get_mut(instance) {
            inst.public_ip = Some(addr.to_string());
        }
        addr
    }

    /// Fail every later call at `point`
    pub async fn fail_at(&self, point: FailPoint) {
        self.state.lock().await.fail = Some(point);
    }

    /// Provider calls made so far, in order
    pub async fn calls(&self) -> Vec<&'static str> {
        self.state.lock().await.calls.clone()
    }

    /// Targets passed to `connect`, in order
    pub async fn connects(&self) -> Vec<InstanceTarget> {
        self.state.lock().await.connects.clone()
    }

    /// Current static IPs
    pub async fn static_ips(&self) -> Vec<StaticIp> {
        self.state.lock().await.static_ips.clone()
    }
}

#[async_trait]
impl ComputeProvider for InMemoryCompute {
    async fn list_instances(&self) -> Result<Vec<Instance>> {
        let mut guard = self.state.lock().await;
        guard.enter("list_instances", FailPoint::ListInstances)?;
        Ok(guard
            .instances
            .iter()
            .map(|(name, inst)| Instance {
                name: name.clone(),
                state: inst.state.clone(),
                public_ip: inst.public_ip.clone(),
            })
            .collect())
    }

    async fn get_instance(&self, name: &str) -> Result<InstanceStatus> {
        let mut guard = self.state.lock().await;
        guard.enter("get_instance", FailPoint::GetInstance)?;
        let is_static_ip = guard.static_ips.iter().any(|ip| ip.is_attached_to(name));
        let inst = guard.instance_mut(name)?;
        Ok(InstanceStatus {
            resource_name: name.to_string(),
            status: inst.state.clone(),
            created_at: Some(CREATED_AT.to_string()),
            public_ip: inst.public_ip.clone(),
            private_ip: Some("172.26.0.10".to_string()),
            blueprint_id: Some("ubuntu_22_04".to_string()),
            bundle_id: Some("nano_3_0".to_string()),
            is_static_ip: Some(is_static_ip),
            location: Some(location()),
        })
    }

    async fn start_instance(&self, name: &str) -> Result<Vec<Operation>> {
        let mut guard = self.state.lock().await;
        guard.enter("start", FailPoint::Start)?;
        guard.instance_mut(name)?.state = "running".to_string();
        Ok(vec![operation(name, "Instance", "StartInstance")])
    }

    async fn stop_instance(&self, name: &str) -> Result<Vec<Operation>> {
        let mut guard = self.state.lock().await;
        guard.enter("stop", FailPoint::Stop)?;
        guard.instance_mut(name)?.state = "stopped".to_string();
        Ok(vec![operation(name, "Instance", "StopInstance")])
    }

    async fn reboot_instance(&self, name: &str) -> Result<Vec<Operation>> {
        let mut guard = self.state.lock().await;
        guard.enter("reboot", FailPoint::Reboot)?;
        guard.instance_mut(name)?;
        Ok(vec![operation(name, "Instance", "RebootInstance")])
    }

    async fn list_static_ips(&self) -> Result<Vec<StaticIp>> {
        let mut guard = self.state.lock().await;
        guard.enter("list_static_ips", FailPoint::ListStaticIps)?;
        Ok(guard.static_ips.clone())
    }

    async fn release_static_ip(&self, ip_name: &str) -> Result<Vec<Operation>> {
        let mut guard = self.state.lock().await;
        guard.enter("release", FailPoint::Release)?;
        let index = guard
            .static_ips
            .iter()
            .position(|ip| ip.name == ip_name)
            .ok_or_else(|| Error::not_found(format!("static IP {}", ip_name)))?;
        let released = guard.static_ips.remove(index);

        // The instance falls back to a fresh dynamic address
        if let Some(instance) = released.attached_to {
            let addr = guard.next_address().to_string();
            if let Some(inst) = guard.instances.get_mut(&instance) {
                inst.public_ip = Some(addr);
            }
        }
        Ok(vec![operation(ip_name, "StaticIp", "ReleaseStaticIp")])
    }

    async fn allocate_static_ip(&self, ip_name: &str) -> Result<Vec<Operation>> {
        let mut guard = self.state.lock().await;
        guard.enter("allocate", FailPoint::Allocate)?;
        if guard.static_ips.iter().any(|ip| ip.name == ip_name) {
            return Err(Error::api(format!("static IP name {} is already in use", ip_name)));
        }
        let addr = guard.next_address();
        guard.static_ips.push(StaticIp {
            name: ip_name.to_string(),
            ip_address: Some(addr.to_string()),
            attached_to: None,
            is_attached: false,
            created_at: Some(CREATED_AT.to_string()),
            location: Some(location()),
        });
        Ok(vec![operation(ip_name, "StaticIp", "AllocateStaticIp")])
    }

    async fn attach_static_ip(&self, ip_name: &str, instance: &str) -> Result<Vec<Operation>> {
        let mut guard = self.state.lock().await;
        guard.enter("attach", FailPoint::Attach)?;
        guard.instance_mut(instance)?;
        let ip = guard
            .static_ips
            .iter_mut()
            .find(|ip| ip.name == ip_name)
            .ok_or_else(|| Error::not_found(format!("static IP {}", ip_name)))?;
        ip.attached_to = Some(instance.to_string());
        ip.is_attached = true;
        let addr = ip.ip_address.clone();
        guard.instance_mut(instance)?.public_ip = addr;
        Ok(vec![operation(ip_name, "StaticIp", "AttachStaticIp")])
    }

    async fn get_static_ip(&self, ip_name: &str) -> Result<StaticIp> {
        let mut guard = self.state.lock().await;
        guard.enter("get_static_ip", FailPoint::GetStaticIp)?;
        guard
            .static_ips
            .iter()
            .find(|ip| ip.name == ip_name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("static IP {}", ip_name)))
    }

    fn provider_name(&self) -> &'static str {
        "in-memory"
    }
}

#[async_trait]
impl ComputeProviderFactory for InMemoryCompute {
    async fn connect(
        &self,
        _config: &ComputeConfig,
        target: &InstanceTarget,
    ) -> Result<Box<dyn ComputeProvider>> {
        let mut guard = self.state.lock().await;
        guard.connects.push(target.clone());
        if guard.fail == Some(FailPoint::Connect) {
            return Err(Error::credential(format!(
                "profile {} not found",
                target.profile
            )));
        }
        drop(guard);
        Ok(Box::new(self.clone()))
    }
}

#[derive(Debug, Default)]
struct DnsState {
    zones: BTreeMap<String, String>,
    records: Vec<(String, DnsRecord)>,
    updates: Vec<(String, String, String)>,
    fail_zone_lookup: bool,
    fail_updates_for: Vec<String>,
    ignore_content_filter: bool,
    issued: u32,
}

/// In-memory DNS account that records every update
#[derive(Debug, Clone, Default)]
pub struct RecordingDns {
    state: Arc<Mutex<DnsState>>,
}

impl RecordingDns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zone
    pub async fn add_zone(&self, domain: &str, zone_id: &str) {
        self.state
            .lock()
            .await
            .zones
            .insert(domain.to_string(), zone_id.to_string());
    }

    /// Add an A record to a zone; returns its ID
    pub async fn add_a_record(&self, zone_id: &str, name: &str, content: &str) -> String {
        let mut guard = self.state.lock().await;
        guard.issued += 1;
        let id = format!("rec-{}", guard.issued);
        guard.records.push((
            zone_id.to_string(),
            DnsRecord {
                id: id.clone(),
                name: name.to_string(),
                record_type: "A".to_string(),
                content: content.to_string(),
                ttl: 300,
                proxied: false,
            },
        ));
        id
    }

    /// Make zone lookups fail
    pub async fn fail_zone_lookup(&self) {
        self.state.lock().await.fail_zone_lookup = true;
    }

    /// Make updates of the named record fail
    pub async fn fail_updates_for(&self, record_name: &str) {
        self.state
            .lock()
            .await
            .fail_updates_for
            .push(record_name.to_string());
    }

    /// Return every A record from `find_a_records`, regardless of content
    pub async fn ignore_content_filter(&self) {
        self.state.lock().await.ignore_content_filter = true;
    }

    /// Applied updates as (record ID, old content, new content)
    pub async fn updates(&self) -> Vec<(String, String, String)> {
        self.state.lock().await.updates.clone()
    }

    /// Current content of a record
    pub async fn content_of(&self, record_id: &str) -> Option<String> {
        self.state
            .lock()
            .await
            .records
            .iter()
            .find(|(_, r)| r.id == record_id)
            .map(|(_, r)| r.content.clone())
    }
}

#[async_trait]
impl DnsProvider for RecordingDns {
    async fn zone_id(&self, domain: &str) -> Result<String> {
        let guard = self.state.lock().await;
        if guard.fail_zone_lookup {
            return Err(Error::api("zone lookup unavailable"));
        }
        guard
            .zones
            .get(domain)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("zone {}", domain)))
    }

    async fn find_a_records(&self, zone_id: &str, content: Ipv4Addr) -> Result<Vec<DnsRecord>> {
        let guard = self.state.lock().await;
        Ok(guard
            .records
            .iter()
            .filter(|(zone, r)| zone == zone_id && r.record_type == "A")
            .filter(|(_, r)| guard.ignore_content_filter || r.content == content.to_string())
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn update_a_record(
        &self,
        zone_id: &str,
        record: &DnsRecord,
        new_ip: Ipv4Addr,
    ) -> Result<DnsRecord> {
        let mut guard = self.state.lock().await;
        if guard.fail_updates_for.contains(&record.name) {
            return Err(Error::api(format!("update of {} rejected", record.name)));
        }
        let (_, stored) = guard
            .records
            .iter_mut()
            .find(|(zone, r)| zone == zone_id && r.id == record.id)
            .ok_or_else(|| Error::not_found(format!("record {}", record.id)))?;
        let old = std::mem::replace(&mut stored.content, new_ip.to_string());
        stored.ttl = AUTOMATIC_TTL;
        let updated = stored.clone();
        guard
            .updates
            .push((record.id.clone(), old, new_ip.to_string()));
        Ok(updated)
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// Factory handing out clones of one [`RecordingDns`]
#[derive(Debug, Clone, Default)]
pub struct RecordingDnsFactory {
    pub dns: RecordingDns,
}

impl DnsProviderFactory for RecordingDnsFactory {
    fn create(&self, _config: &DnsProviderConfig) -> Result<Box<dyn DnsProvider>> {
        Ok(Box::new(self.dns.clone()))
    }
}
