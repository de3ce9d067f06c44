//! Request dispatch
//!
//! The [`InstanceController`] is what the HTTP layer calls. For each request
//! it validates parameters, checks the timestamp gate, connects a compute
//! client for the caller's region and profile, and runs one action.
//!
//! Validation always completes before any provider client is built, so a
//! rejected request never reaches the provider.

use crate::config::{ComputeConfig, SUPPORTED_REGIONS, ServiceConfig};
use crate::dns_sync::DnsSync;
use crate::error::Result;
use crate::registry::ProviderRegistry;
use crate::traits::{
    ComputeProvider, ComputeProviderFactory, Instance, InstanceStatus, Operation, StaticIp,
};
use crate::validation::{InstanceAction, InstanceTarget, RequestParams, TimestampGate};
use crate::workflow;
use serde::Serialize;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Parameters `/api/instances` requires
pub const LIST_PARAMS: [&str; 2] = ["region", "profile"];

/// Parameters `/api/instance` requires
pub const ACTION_PARAMS: [&str; 5] = ["region", "profile", "name", "secret", "action"];

/// One row of `/api/instances`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceSummary {
    pub name: String,
    pub state: String,
    #[serde(rename = "PublicIP", skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<String>,
}

impl From<Instance> for InstanceSummary {
    fn from(instance: Instance) -> Self {
        // A stopped instance's last address is stale
        let public_ip = if instance.state == "stopped" {
            None
        } else {
            instance.public_ip
        };
        Self {
            name: instance.name,
            state: instance.state,
            public_ip,
        }
    }
}

/// Result of one `/api/instance` action, serialized as the response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ActionOutcome {
    /// Start, stop and reboot: `{"Operations": [...]}`
    Operations {
        #[serde(rename = "Operations")]
        operations: Vec<Operation>,
    },
    /// Status: the instance details object
    Status(InstanceStatus),
    /// Change IP: `{"StaticIp": {...}}`
    StaticIp {
        #[serde(rename = "StaticIp")]
        static_ip: StaticIp,
    },
}

/// A DNS zone synced when a reassignment runs under `profile`
#[derive(Debug, Clone)]
pub struct DnsTarget {
    pub profile: String,
    pub sync: DnsSync,
}

/// Validates and dispatches instance requests
pub struct InstanceController {
    compute_config: ComputeConfig,
    compute: Arc<dyn ComputeProviderFactory>,
    dns_targets: Vec<DnsTarget>,
    gate: TimestampGate,
}

impl InstanceController {
    /// Create a controller with no DNS targets
    pub fn new(
        compute_config: ComputeConfig,
        compute: Arc<dyn ComputeProviderFactory>,
        gate: TimestampGate,
    ) -> Self {
        Self {
            compute_config,
            compute,
            dns_targets: Vec::new(),
            gate,
        }
    }

    /// Build a controller from configuration, creating providers through `registry`
    pub fn from_config(config: &ServiceConfig, registry: &ProviderRegistry) -> Result<Self> {
        let compute = registry.compute_factory(&config.compute)?;
        let mut controller = Self::new(
            config.compute.clone(),
            compute,
            TimestampGate::new(config.auth.tolerance_secs),
        );

        for account in &config.dns_accounts {
            let provider = registry.create_dns_provider(&account.provider)?;
            controller = controller.with_dns_target(DnsTarget {
                profile: account.profile.clone(),
                sync: DnsSync::new(Arc::from(provider), account.provider.domain()),
            });
        }

        Ok(controller)
    }

    /// Add a DNS target
    pub fn with_dns_target(mut self, target: DnsTarget) -> Self {
        self.dns_targets.push(target);
        self
    }

    /// Supported regions, in fixed order
    pub fn regions(&self) -> &'static [&'static str] {
        &SUPPORTED_REGIONS
    }

    /// Timestamp gate in use
    pub fn gate(&self) -> TimestampGate {
        self.gate
    }

    /// Number of configured DNS targets
    pub fn dns_target_count(&self) -> usize {
        self.dns_targets.len()
    }

    /// List instances for `region` and `profile`
    pub async fn list_instances(&self, params: &RequestParams) -> Result<Vec<InstanceSummary>> {
        params.require(&LIST_PARAMS)?;
        let target = InstanceTarget::account(params.required("region")?, params.required("profile")?);

        let provider = self.compute.connect(&self.compute_config, &target).await?;
        let instances = provider
            .list_instances()
            .await
            .map_err(|e| e.at_step("list instances"))?;

        debug!(region = %target.region, count = instances.len(), "Listed instances");
        Ok(instances.into_iter().map(InstanceSummary::from).collect())
    }

    /// Validate and run one action against the current wall clock
    pub async fn dispatch(&self, params: &RequestParams) -> Result<ActionOutcome> {
        self.dispatch_at(params, chrono::Utc::now().timestamp()).await
    }

    /// Validate and run one action, with `now` as server time (Unix seconds)
    pub async fn dispatch_at(&self, params: &RequestParams, now: i64) -> Result<ActionOutcome> {
        params.require(&ACTION_PARAMS)?;
        self.gate.check(params.required("secret")?, now)?;
        let action: InstanceAction = params.required("action")?.parse()?;

        let target = InstanceTarget::new(
            params.required("region")?,
            params.required("profile")?,
            params.required("name")?,
        );

        info!(
            %action,
            region = %target.region,
            profile = %target.profile,
            instance = %target.name,
            "Dispatching instance action"
        );

        let provider = self.compute.connect(&self.compute_config, &target).await?;
        self.run(provider.as_ref(), action, &target).await
    }

    async fn run(
        &self,
        provider: &dyn ComputeProvider,
        action: InstanceAction,
        target: &InstanceTarget,
    ) -> Result<ActionOutcome> {
        let name = target.name.as_str();
        let step = action.provider_call();

        let outcome = match action {
            InstanceAction::Status => ActionOutcome::Status(
                provider.get_instance(name).await.map_err(|e| e.at_step(step))?,
            ),
            InstanceAction::PowerOff => ActionOutcome::Operations {
                operations: provider.stop_instance(name).await.map_err(|e| e.at_step(step))?,
            },
            InstanceAction::PowerOn => ActionOutcome::Operations {
                operations: provider.start_instance(name).await.map_err(|e| e.at_step(step))?,
            },
            InstanceAction::Reset => ActionOutcome::Operations {
                operations: provider.reboot_instance(name).await.map_err(|e| e.at_step(step))?,
            },
            InstanceAction::ChangeIp => {
                let reassignment = workflow::reassign_static_ip(provider, name).await?;
                if let Some(old_ip) = reassignment.old_ip {
                    self.sync_dns(&target.profile, old_ip, reassignment.new_ip).await;
                }
                ActionOutcome::StaticIp {
                    static_ip: reassignment.static_ip,
                }
            }
        };

        Ok(outcome)
    }

    /// Best-effort DNS sync; failures are logged and never returned
    async fn sync_dns(&self, profile: &str, old_ip: Ipv4Addr, new_ip: Ipv4Addr) {
        let targets = self.dns_targets.iter().filter(|t| t.profile == profile);

        for target in targets {
            match target.sync.sync(old_ip, new_ip).await {
                Ok(report) if report.is_complete() => info!(
                    domain = %target.sync.domain(),
                    updated = report.updated.len(),
                    "DNS sync complete"
                ),
                Ok(report) => warn!(
                    domain = %target.sync.domain(),
                    updated = report.updated.len(),
                    failed = report.failed.len(),
                    "DNS sync finished with failures"
                ),
                Err(e) => warn!(domain = %target.sync.domain(), error = %e, "DNS sync failed"),
            }
        }
    }
}

impl std::fmt::Debug for InstanceController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceController")
            .field("compute", &self.compute_config.type_name())
            .field("dns_targets", &self.dns_targets)
            .field("gate", &self.gate)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mock::{FailPoint, InMemoryCompute, RecordingDns};

    const NOW: i64 = 1_700_000_000;

    fn controller(compute: &InMemoryCompute) -> InstanceController {
        InstanceController::new(
            ComputeConfig::default(),
            Arc::new(compute.clone()),
            TimestampGate::new(120),
        )
    }

    fn action_params(action: &str, secret: i64) -> RequestParams {
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

    async fn dns_zone(old_ip: Ipv4Addr) -> (RecordingDns, String) {
        let dns = RecordingDns::new();
        dns.add_zone("example.com", "zone-1").await;
        let id = dns
            .add_a_record("zone-1", "web.example.com", &old_ip.to_string())
            .await;
        (dns, id)
    }

    #[tokio::test]
    async fn missing_parameter_makes_no_provider_call() {
        let compute = InMemoryCompute::new();
        let ctl = controller(&compute);

        for missing in ACTION_PARAMS {
            let params: RequestParams = [
                ("region", "us-east-1"),
                ("profile", "ops"),
                ("name", "web-1"),
                ("secret", "1700000000"),
                ("action", "status"),
            ]
            .into_iter()
            .filter(|(k, _)| *k != missing)
            .collect();

            let err = ctl.dispatch_at(&params, NOW).await.unwrap_err();
            assert!(matches!(err, Error::MissingParameter(_)), "{missing}: {err:?}");
        }
        assert!(compute.connects().await.is_empty());
    }

    #[tokio::test]
    async fn stale_secret_rejected_before_connect() {
        let compute = InMemoryCompute::new();
        let ctl = controller(&compute);

        let err = ctl
            .dispatch_at(&action_params("status", NOW - 121), NOW)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::StaleOrInvalidTimestamp(_)));
        assert!(compute.connects().await.is_empty());
    }

    #[tokio::test]
    async fn stale_secret_beats_unknown_action() {
        let compute = InMemoryCompute::new();
        let ctl = controller(&compute);

        let err = ctl
            .dispatch_at(&action_params("bogus", NOW + 500), NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StaleOrInvalidTimestamp(_)));
    }

    #[tokio::test]
    async fn unknown_action_rejected() {
        let compute = InMemoryCompute::new();
        let ctl = controller(&compute);

        let err = ctl
            .dispatch_at(&action_params("bogus", NOW), NOW)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid action"));
        assert!(compute.connects().await.is_empty());
    }

    #[tokio::test]
    async fn boundary_secret_dispatches() {
        let compute = InMemoryCompute::new();
        compute.add_instance("web-1", "running").await;
        let ctl = controller(&compute);

        let outcome = ctl
            .dispatch_at(&action_params("status", NOW - 120), NOW)
            .await
            .unwrap();

        match outcome {
            ActionOutcome::Status(status) => {
                assert_eq!(status.resource_name, "web-1");
                assert_eq!(status.status, "running");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        let connects = compute.connects().await;
        assert_eq!(connects, vec![InstanceTarget::new("us-east-1", "ops", "web-1")]);
    }

    #[tokio::test]
    async fn power_actions_map_to_provider_calls() {
        let compute = InMemoryCompute::new();
        compute.add_instance("web-1", "running").await;
        let ctl = controller(&compute);

        for (action, op_type) in [
            ("poweroff", "StopInstance"),
            ("poweron", "StartInstance"),
            ("reset", "RebootInstance"),
        ] {
            match ctl.dispatch_at(&action_params(action, NOW), NOW).await.unwrap() {
                ActionOutcome::Operations { operations } => {
                    assert_eq!(operations[0].operation_type.as_deref(), Some(op_type));
                }
                other => panic!("{action}: unexpected outcome {other:?}"),
            }
        }
        assert_eq!(compute.calls().await, vec!["stop", "start", "reboot"]);
    }

    #[tokio::test]
    async fn provider_failure_names_the_call() {
        let compute = InMemoryCompute::new();
        compute.add_instance("web-1", "running").await;
        compute.fail_at(FailPoint::Reboot).await;
        let ctl = controller(&compute);

        match ctl.dispatch_at(&action_params("reset", NOW), NOW).await {
            Err(Error::Provider { step, .. }) => assert_eq!(step, "reboot"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn connect_failure_is_credential_error() {
        let compute = InMemoryCompute::new();
        compute.fail_at(FailPoint::Connect).await;
        let ctl = controller(&compute);

        let err = ctl
            .dispatch_at(&action_params("status", NOW), NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Credential(_)));
    }

    #[tokio::test]
    async fn change_ip_syncs_matching_profile() {
        let compute = InMemoryCompute::new();
        compute.add_instance("web-1", "running").await;
        let old_ip = compute.attach_fresh_ip("web-1").await;
        let (dns, record) = dns_zone(old_ip).await;

        let ctl = controller(&compute).with_dns_target(DnsTarget {
            profile: "ops".to_string(),
            sync: DnsSync::new(Arc::new(dns.clone()), "example.com"),
        });

        let outcome = ctl
            .dispatch_at(&action_params("changeip", NOW), NOW)
            .await
            .unwrap();

        let ActionOutcome::StaticIp { static_ip } = outcome else {
            panic!("expected static IP outcome");
        };
        let new_ip = static_ip.ip_address.unwrap();
        assert_eq!(dns.content_of(&record).await.unwrap(), new_ip);
    }

    #[tokio::test]
    async fn change_ip_skips_other_profiles() {
        let compute = InMemoryCompute::new();
        compute.add_instance("web-1", "running").await;
        let old_ip = compute.attach_fresh_ip("web-1").await;
        let (dns, record) = dns_zone(old_ip).await;

        let ctl = controller(&compute).with_dns_target(DnsTarget {
            profile: "someone-else".to_string(),
            sync: DnsSync::new(Arc::new(dns.clone()), "example.com"),
        });

        ctl.dispatch_at(&action_params("changeip", NOW), NOW)
            .await
            .unwrap();

        assert!(dns.updates().await.is_empty());
        assert_eq!(dns.content_of(&record).await.unwrap(), old_ip.to_string());
    }

    #[tokio::test]
    async fn change_ip_without_attached_ip_skips_dns() {
        let compute = InMemoryCompute::new();
        compute.add_instance("web-1", "running").await;
        let dns = RecordingDns::new();
        dns.add_zone("example.com", "zone-1").await;

        let ctl = controller(&compute).with_dns_target(DnsTarget {
            profile: "ops".to_string(),
            sync: DnsSync::new(Arc::new(dns.clone()), "example.com"),
        });

        let outcome = ctl
            .dispatch_at(&action_params("changeip", NOW), NOW)
            .await
            .unwrap();

        assert!(matches!(outcome, ActionOutcome::StaticIp { .. }));
        assert!(dns.updates().await.is_empty());
    }

    #[tokio::test]
    async fn dns_failure_does_not_fail_change_ip() {
        let compute = InMemoryCompute::new();
        compute.add_instance("web-1", "running").await;
        let old_ip = compute.attach_fresh_ip("web-1").await;
        let (dns, _) = dns_zone(old_ip).await;
        dns.fail_zone_lookup().await;

        let ctl = controller(&compute).with_dns_target(DnsTarget {
            profile: "ops".to_string(),
            sync: DnsSync::new(Arc::new(dns), "example.com"),
        });

        assert!(
            ctl.dispatch_at(&action_params("changeip", NOW), NOW)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn repeated_change_ip_syncs_against_previous_address() {
        let compute = InMemoryCompute::new();
        compute.add_instance("web-1", "running").await;
        let seed = compute.attach_fresh_ip("web-1").await;
        let (dns, record) = dns_zone(seed).await;

        let ctl = controller(&compute).with_dns_target(DnsTarget {
            profile: "ops".to_string(),
            sync: DnsSync::new(Arc::new(dns.clone()), "example.com"),
        });

        let first = ctl
            .dispatch_at(&action_params("changeip", NOW), NOW)
            .await
            .unwrap();
        let second = ctl
            .dispatch_at(&action_params("changeip", NOW), NOW)
            .await
            .unwrap();

        let (ActionOutcome::StaticIp { static_ip: a }, ActionOutcome::StaticIp { static_ip: b }) =
            (first, second)
        else {
            panic!("expected static IP outcomes");
        };
        let first_ip = a.ip_address.unwrap();
        let second_ip = b.ip_address.unwrap();
        assert_ne!(first_ip, second_ip);

        let updates = dns.updates().await;
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0], (record.clone(), seed.to_string(), first_ip.clone()));
        assert_eq!(updates[1], (record, first_ip, second_ip));
    }

    #[tokio::test]
    async fn list_hides_stopped_addresses() {
        let compute = InMemoryCompute::new();
        compute.add_instance("db-1", "stopped").await;
        compute.add_instance("web-1", "running").await;
        let ctl = controller(&compute);

        let params: RequestParams = [("region", "us-east-1"), ("profile", "ops")]
            .into_iter()
            .collect();
        let instances = ctl.list_instances(&params).await.unwrap();

        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].name, "db-1");
        assert_eq!(instances[0].public_ip, None);
        assert!(instances[1].public_ip.is_some());

        let json = serde_json::to_value(&instances).unwrap();
        assert!(json[0].get("PublicIP").is_none());
        assert!(json[1]["PublicIP"].is_string());
    }

    #[tokio::test]
    async fn list_requires_region_and_profile() {
        let compute = InMemoryCompute::new();
        let ctl = controller(&compute);

        let params: RequestParams = [("region", "us-east-1")].into_iter().collect();
        assert!(matches!(
            ctl.list_instances(&params).await,
            Err(Error::MissingParameter(_))
        ));
        assert!(compute.connects().await.is_empty());
    }

    #[test]
    fn outcome_shapes() {
        let ops = ActionOutcome::Operations {
            operations: vec![Operation::default()],
        };
        assert!(serde_json::to_value(&ops).unwrap()["Operations"].is_array());

        let status = ActionOutcome::Status(InstanceStatus {
            resource_name: "web-1".to_string(),
            status: "running".to_string(),
            created_at: Some("2024-01-01T00:00:00Z".to_string()),
            ..Default::default()
        });
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["ResourceName"], "web-1");
        assert_eq!(json["Status"], "running");
        assert_eq!(json["CreatedAt"], "2024-01-01T00:00:00Z");

        let ip = ActionOutcome::StaticIp {
            static_ip: StaticIp::default(),
        };
        assert!(serde_json::to_value(&ip).unwrap()["StaticIp"].is_object());
    }
}
