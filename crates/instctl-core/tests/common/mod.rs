//! Test doubles and common utilities for contract tests
//!
//! Minimal providers that record what was asked of them. They hold a fixed
//! static-IP table and answer every call from it; nothing is simulated
//! beyond what the contracts check.

#![allow(dead_code)]

use async_trait::async_trait;
use instctl_core::error::{Error, Result};
use instctl_core::traits::{
    ComputeProvider, ComputeProviderFactory, DnsProvider, DnsRecord, Instance, InstanceStatus,
    Operation, StaticIp,
};
use instctl_core::{ComputeConfig, InstanceTarget};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Compute double with a scripted static-IP table and an optional failing call
#[derive(Clone, Default)]
pub struct ScriptedCompute {
    inner: Arc<Mutex<Script>>,
    connect_count: Arc<AtomicUsize>,
}

#[derive(Default)]
struct Script {
    static_ips: Vec<StaticIp>,
    allocated_address: Option<String>,
    allocated_name: Option<String>,
    fail_call: Option<&'static str>,
    calls: Vec<String>,
}

impl ScriptedCompute {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a static IP attached to `instance`
    pub fn with_attached(self, ip_name: &str, address: &str, instance: &str) -> Self {
        self.lock().static_ips.push(StaticIp {
            name: ip_name.to_string(),
            ip_address: Some(address.to_string()),
            attached_to: Some(instance.to_string()),
            is_attached: true,
            ..Default::default()
        });
        self
    }

    /// Address handed out by the next allocation
    pub fn allocating(self, address: &str) -> Self {
        self.lock().allocated_address = Some(address.to_string());
        self
    }

    /// Resource name reported by the allocate operation
    pub fn naming_allocation(self, ip_name: &str) -> Self {
        self.lock().allocated_name = Some(ip_name.to_string());
        self
    }

    /// Fail the named call ("list", "release", "allocate", "attach", "lookup", ...)
    pub fn failing(self, call: &'static str) -> Self {
        self.lock().fail_call = Some(call);
        self
    }

    /// Calls made so far, with their arguments
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Number of clients connected
    pub fn connect_count(&self) -> usize {
        self.connect_count.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.inner.lock().unwrap()
    }

    fn record(&self, call: &'static str, detail: String) -> Result<()> {
        let mut script = self.lock();
        script.calls.push(detail);
        if script.fail_call == Some(call) {
            return Err(Error::api(format!("scripted {} failure", call)));
        }
        Ok(())
    }
}

#[async_trait]
impl ComputeProvider for ScriptedCompute {
    async fn list_instances(&self) -> Result<Vec<Instance>> {
        self.record("instances", "instances".to_string())?;
        Ok(Vec::new())
    }

    async fn get_instance(&self, name: &str) -> Result<InstanceStatus> {
        self.record("status", format!("status {}", name))?;
        Ok(InstanceStatus {
            resource_name: name.to_string(),
            status: "running".to_string(),
            ..Default::default()
        })
    }

    async fn start_instance(&self, name: &str) -> Result<Vec<Operation>> {
        self.record("start", format!("start {}", name))?;
        Ok(Vec::new())
    }

    async fn stop_instance(&self, name: &str) -> Result<Vec<Operation>> {
        self.record("stop", format!("stop {}", name))?;
        Ok(Vec::new())
    }

    async fn reboot_instance(&self, name: &str) -> Result<Vec<Operation>> {
        self.record("reboot", format!("reboot {}", name))?;
        Ok(Vec::new())
    }

    async fn list_static_ips(&self) -> Result<Vec<StaticIp>> {
        self.record("list", "list".to_string())?;
        Ok(self.lock().static_ips.clone())
    }

    async fn release_static_ip(&self, ip_name: &str) -> Result<Vec<Operation>> {
        self.record("release", format!("release {}", ip_name))?;
        self.lock().static_ips.retain(|ip| ip.name != ip_name);
        Ok(Vec::new())
    }

    async fn allocate_static_ip(&self, ip_name: &str) -> Result<Vec<Operation>> {
        self.record("allocate", format!("allocate {}", ip_name))?;
        let mut script = self.lock();
        let name = script
            .allocated_name
            .clone()
            .unwrap_or_else(|| ip_name.to_string());
        let address = script.allocated_address.clone();
        script.static_ips.push(StaticIp {
            name: name.clone(),
            ip_address: address,
            ..Default::default()
        });
        Ok(vec![Operation {
            resource_name: Some(name),
            operation_type: Some("AllocateStaticIp".to_string()),
            ..Default::default()
        }])
    }

    async fn attach_static_ip(&self, ip_name: &str, instance: &str) -> Result<Vec<Operation>> {
        self.record("attach", format!("attach {} {}", ip_name, instance))?;
        let mut script = self.lock();
        if let Some(ip) = script.static_ips.iter_mut().find(|ip| ip.name == ip_name) {
            ip.attached_to = Some(instance.to_string());
            ip.is_attached = true;
        }
        Ok(Vec::new())
    }

    async fn get_static_ip(&self, ip_name: &str) -> Result<StaticIp> {
        self.record("lookup", format!("lookup {}", ip_name))?;
        self.lock()
            .static_ips
            .iter()
            .find(|ip| ip.name == ip_name)
            .cloned()
            .ok_or_else(|| Error::not_found(ip_name.to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

#[async_trait]
impl ComputeProviderFactory for ScriptedCompute {
    async fn connect(
        &self,
        _config: &ComputeConfig,
        _target: &InstanceTarget,
    ) -> Result<Box<dyn ComputeProvider>> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.clone()))
    }
}

/// DNS double serving one zone with fixed records
#[derive(Clone, Default)]
pub struct CountingDns {
    records: Arc<Mutex<Vec<DnsRecord>>>,
    update_count: Arc<AtomicUsize>,
    fail_zone: bool,
}

impl CountingDns {
    pub fn new(records: &[(&str, &str)]) -> Self {
        let records = records
            .iter()
            .enumerate()
            .map(|(i, (name, content))| DnsRecord {
                id: format!("r{}", i),
                name: name.to_string(),
                record_type: "A".to_string(),
                content: content.to_string(),
                ttl: 300,
                proxied: false,
            })
            .collect();
        Self {
            records: Arc::new(Mutex::new(records)),
            ..Default::default()
        }
    }

    pub fn failing_zone_lookup(mut self) -> Self {
        self.fail_zone = true;
        self
    }

    pub fn update_count(&self) -> usize {
        self.update_count.load(Ordering::SeqCst)
    }

    pub fn content_of(&self, name: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.content.clone())
    }
}

#[async_trait]
impl DnsProvider for CountingDns {
    async fn zone_id(&self, _domain: &str) -> Result<String> {
        if self.fail_zone {
            return Err(Error::api("zone lookup refused"));
        }
        Ok("zone".to_string())
    }

    async fn find_a_records(&self, _zone_id: &str, content: Ipv4Addr) -> Result<Vec<DnsRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.points_at(content))
            .cloned()
            .collect())
    }

    async fn update_a_record(
        &self,
        _zone_id: &str,
        record: &DnsRecord,
        new_ip: Ipv4Addr,
    ) -> Result<DnsRecord> {
        self.update_count.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().unwrap();
        let stored = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| Error::not_found(record.id.clone()))?;
        stored.content = new_ip.to_string();
        stored.ttl = 1;
        Ok(stored.clone())
    }

    fn provider_name(&self) -> &'static str {
        "counting"
    }
}

/// Request parameters for `/api/instance`
pub fn action_params(action: &str, secret: i64) -> instctl_core::RequestParams {
    [
        ("region", "us-east-1".to_string()),
        ("profile", "ops".to_string()),
        ("name", "web-1".to_string()),
        ("secret", secret.to_string()),
        ("action", action.to_string()),
    ]
    .into_iter()
    .collect()
}
