//! Static-IP reassignment workflow
//!
//! Replaces the static IP of one instance:
//!
//! ```text
//! list ──► release (old) ──► allocate (IP-<name>) ──► attach ──► lookup
//! ```
//!
//! ## Ordering
//!
//! Steps run strictly in sequence on the caller's task. Release must finish
//! before allocate because the provider allows one attached static IP per
//! instance, and the new IP reuses the deterministic name.
//!
//! ## Failure
//!
//! A failing step aborts the workflow with `Error::Provider { step, .. }`.
//! Completed steps are not undone: if attach fails after release, the
//! instance is left without a static IP and the caller sees `attach failed`.

use crate::error::{Error, Result};
use crate::traits::{ComputeProvider, StaticIp};
use std::fmt;
use std::net::Ipv4Addr;
use tracing::{debug, info};

/// Prefix of the deterministic static IP name
pub const STATIC_IP_PREFIX: &str = "IP-";

/// Workflow step, used to label provider failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    /// Enumerate static IPs
    List,
    /// Release the attached static IP
    Release,
    /// Allocate the replacement
    Allocate,
    /// Attach the replacement
    Attach,
    /// Read the replacement's address
    Lookup,
}

impl WorkflowStep {
    /// Step name as reported in errors
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStep::List => "list",
            WorkflowStep::Release => "release",
            WorkflowStep::Allocate => "allocate",
            WorkflowStep::Attach => "attach",
            WorkflowStep::Lookup => "lookup",
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a completed reassignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    /// Address of the released static IP; `None` if nothing was attached
    pub old_ip: Option<Ipv4Addr>,
    /// Address of the new static IP
    pub new_ip: Ipv4Addr,
    /// The new static IP as the provider reports it
    pub static_ip: StaticIp,
}

/// Deterministic static IP name for `instance`
pub fn static_ip_name(instance: &str) -> String {
    format!("{}{}", STATIC_IP_PREFIX, instance)
}

/// Replace the static IP attached to `instance`.
///
/// If more than one static IP is attached, fails with
/// `Error::MultipleStaticIps` before anything is released.
pub async fn reassign_static_ip(
    provider: &dyn ComputeProvider,
    instance: &str,
) -> Result<Reassignment> {
    info!(
        provider = provider.provider_name(),
        instance, "Starting static IP reassignment"
    );

    // Step 1: enumerate
    let static_ips = provider
        .list_static_ips()
        .await
        .map_err(|e| e.at_step(WorkflowStep::List))?;

    let attached: Vec<&StaticIp> = static_ips
        .iter()
        .filter(|ip| ip.is_attached_to(instance))
        .collect();

    if attached.len() > 1 {
        return Err(Error::MultipleStaticIps {
            instance: instance.to_string(),
            count: attached.len(),
        });
    }

    // Step 2: release
    let old_ip = match attached.first() {
        Some(current) => {
            let old_ip = current
                .ip_address
                .as_deref()
                .map(|addr| parse_ipv4(addr, WorkflowStep::Release))
                .transpose()?;

            provider
                .release_static_ip(&current.name)
                .await
                .map_err(|e| e.at_step(WorkflowStep::Release))?;

            info!(instance, static_ip = %current.name, old_ip = ?old_ip, "Released static IP");
            old_ip
        }
        None => {
            debug!(instance, "No static IP attached; nothing to release");
            None
        }
    };

    // Step 3: allocate
    let requested_name = static_ip_name(instance);
    let operations = provider
        .allocate_static_ip(&requested_name)
        .await
        .map_err(|e| e.at_step(WorkflowStep::Allocate))?;

    let ip_name = operations
        .first()
        .and_then(|op| op.resource_name.clone())
        .unwrap_or(requested_name);

    // Step 4: attach
    provider
        .attach_static_ip(&ip_name, instance)
        .await
        .map_err(|e| e.at_step(WorkflowStep::Attach))?;

    // Step 5: lookup
    let static_ip = provider
        .get_static_ip(&ip_name)
        .await
        .map_err(|e| e.at_step(WorkflowStep::Lookup))?;

    let new_ip = static_ip
        .ip_address
        .as_deref()
        .ok_or_else(|| Error::provider(WorkflowStep::Lookup.as_str(), "static IP has no address"))
        .and_then(|addr| parse_ipv4(addr, WorkflowStep::Lookup))?;

    info!(instance, static_ip = %ip_name, %new_ip, "Static IP attached");

    Ok(Reassignment {
        old_ip,
        new_ip,
        static_ip,
    })
}

fn parse_ipv4(addr: &str, step: WorkflowStep) -> Result<Ipv4Addr> {
    addr.parse()
        .map_err(|_| Error::provider(step.as_str(), format!("not an IPv4 address: {}", addr)))
}
