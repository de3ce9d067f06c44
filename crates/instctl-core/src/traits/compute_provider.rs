// # Compute Provider Trait
//
// Defines the interface for instance lifecycle and static-IP calls against a
// cloud account.
//
// ## Implementations
//
// - Lightsail: `instctl-provider-lightsail` crate
// - In-memory: `instctl_core::mock` (tests)
//
// ## Usage
//
// ```rust,ignore
// use instctl_core::{ComputeProviderFactory, InstanceTarget};
//
// let provider = factory.connect(&config, &target).await?;
// let instances = provider.list_instances().await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Where a resource lives
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceLocation {
    /// Availability zone (e.g. "us-east-1a")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    /// Region name (e.g. "us-east-1")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_name: Option<String>,
}

/// An instance as reported by the provider's list call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// Instance name
    pub name: String,
    /// State name (e.g. "running", "stopped")
    pub state: String,
    /// Current public IPv4 address, if any
    pub public_ip: Option<String>,
}

/// Instance details returned by the `status` action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceStatus {
    /// Instance name
    pub resource_name: String,
    /// State name (e.g. "running", "stopped")
    pub status: String,
    /// Creation timestamp (RFC 3339)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Public IPv4 address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<String>,
    /// Private IPv4 address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_ip: Option<String>,
    /// Image the instance was created from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blueprint_id: Option<String>,
    /// Size bundle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    /// Whether the public address is a static IP
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_static_ip: Option<bool>,
    /// Region and zone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ResourceLocation>,
}

/// An asynchronous provider operation (start, stop, reboot, allocate, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Operation {
    /// Operation ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Resource the operation acts on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    /// Resource type (e.g. "Instance", "StaticIp")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// Operation type (e.g. "RebootInstance")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<String>,
    /// Operation status (e.g. "Started", "Succeeded")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Creation timestamp (RFC 3339)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last status change (RFC 3339)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_changed_at: Option<String>,
    /// Whether the operation has finished
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_terminal: Option<bool>,
    /// Free-form details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_details: Option<String>,
    /// Error code, when the operation failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Error details, when the operation failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
    /// Region and zone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ResourceLocation>,
}

/// A provider-managed static IP
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StaticIp {
    /// Static IP resource name
    pub name: String,
    /// The address, once allocated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Instance the IP is attached to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attached_to: Option<String>,
    /// Whether the IP is attached
    pub is_attached: bool,
    /// Creation timestamp (RFC 3339)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Region and zone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ResourceLocation>,
}

impl StaticIp {
    /// Whether this IP is attached to `instance`
    pub fn is_attached_to(&self, instance: &str) -> bool {
        self.attached_to.as_deref() == Some(instance)
    }
}

/// Trait for compute provider implementations
///
/// A provider is a client bound to one account and region. Every method is a
/// single provider call; callers own sequencing and error context.
///
/// # Error Contract
///
/// Provider call failures are returned as [`crate::Error::Api`] carrying the
/// provider's message. Callers attach the step name with
/// [`crate::Error::at_step`]. Providers never retry.
#[async_trait]
pub trait ComputeProvider: Send + Sync {
    /// List every instance in the account and region, following pagination
    async fn list_instances(&self) -> Result<Vec<Instance>, crate::Error>;

    /// Get details for one instance
    async fn get_instance(&self, name: &str) -> Result<InstanceStatus, crate::Error>;

    /// Start a stopped instance
    async fn start_instance(&self, name: &str) -> Result<Vec<Operation>, crate::Error>;

    /// Stop a running instance
    async fn stop_instance(&self, name: &str) -> Result<Vec<Operation>, crate::Error>;

    /// Reboot an instance
    async fn reboot_instance(&self, name: &str) -> Result<Vec<Operation>, crate::Error>;

    /// List every static IP in the account and region, following pagination
    async fn list_static_ips(&self) -> Result<Vec<StaticIp>, crate::Error>;

    /// Release (delete) a static IP by resource name
    async fn release_static_ip(&self, ip_name: &str) -> Result<Vec<Operation>, crate::Error>;

    /// Allocate a new static IP under `ip_name`
    async fn allocate_static_ip(&self, ip_name: &str) -> Result<Vec<Operation>, crate::Error>;

    /// Attach a static IP to an instance
    async fn attach_static_ip(
        &self,
        ip_name: &str,
        instance: &str,
    ) -> Result<Vec<Operation>, crate::Error>;

    /// Get one static IP by resource name
    async fn get_static_ip(&self, ip_name: &str) -> Result<StaticIp, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Builds a provider client for one request
///
/// Factories are registered by name in the
/// [`ProviderRegistry`](crate::registry::ProviderRegistry) and receive the
/// compute config on every call, so credential resolution happens per
/// request against the caller's region and profile.
#[async_trait]
pub trait ComputeProviderFactory: Send + Sync {
    /// Connect a provider client for `target`'s region and profile
    async fn connect(
        &self,
        config: &crate::config::ComputeConfig,
        target: &crate::validation::InstanceTarget,
    ) -> Result<Box<dyn ComputeProvider>, crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_serializes_pascal_case_and_skips_empty() {
        let op = Operation {
            id: Some("op-1".to_string()),
            resource_name: Some("web-1".to_string()),
            status: Some("Started".to_string()),
            created_at: Some("2024-01-01T00:00:00Z".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["Id"], "op-1");
        assert_eq!(json["ResourceName"], "web-1");
        assert_eq!(json["Status"], "Started");
        assert_eq!(json["CreatedAt"], "2024-01-01T00:00:00Z");
        assert!(json.get("ErrorCode").is_none());
    }

    #[test]
    fn static_ip_attachment_check() {
        let ip = StaticIp {
            name: "IP-web-1".to_string(),
            ip_address: Some("3.3.3.3".to_string()),
            attached_to: Some("web-1".to_string()),
            is_attached: true,
            ..Default::default()
        };
        assert!(ip.is_attached_to("web-1"));
        assert!(!ip.is_attached_to("web-2"));
    }
}
