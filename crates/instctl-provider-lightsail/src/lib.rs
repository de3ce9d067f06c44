// # Lightsail Compute Provider
//
// This crate provides the AWS Lightsail implementation of
// `instctl_core::ComputeProvider`.
//
// ## Behavior
//
// - One SDK client per request, bound to the caller's region and profile
// - Listing calls follow `next_page_token` until exhausted
// - Every method is exactly one Lightsail call (plus pages); no retries
// - SDK errors are flattened into `Error::Api` with the full error chain
//
// ## Credentials
//
// - Profile files: the request's `profile` is looked up in the configured
//   shared config and credentials files
// - Static keys: one fixed key pair, the request's `profile` only selects DNS
//   accounts
//
// Secret keys never appear in logs or `Debug` output.

use async_trait::async_trait;
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_config::{BehaviorVersion, Region};
use aws_runtime::env_config::file::{EnvConfigFileKind, EnvConfigFiles};
use aws_sdk_lightsail::error::DisplayErrorContext;
use aws_sdk_lightsail::primitives::{DateTime, DateTimeFormat};
use aws_sdk_lightsail::types;
use instctl_core::config::{ComputeConfig, CredentialSource};
use instctl_core::traits::{
    ComputeProvider, ComputeProviderFactory, Instance, InstanceStatus, Operation,
    ResourceLocation, StaticIp,
};
use instctl_core::{Error, InstanceTarget, ProviderRegistry, Result};
use std::path::Path;
use std::sync::Arc;

/// Provider name used for logging and registration
pub const PROVIDER_NAME: &str = "lightsail";

/// Credential provider name attached to static keys
const STATIC_CREDENTIALS_SOURCE: &str = "instctl-static";

/// Lightsail client bound to one account and region
pub struct LightsailProvider {
    client: aws_sdk_lightsail::Client,
    region: String,
}

impl std::fmt::Debug for LightsailProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightsailProvider")
            .field("region", &self.region)
            .finish()
    }
}

impl LightsailProvider {
    /// Wrap an already configured SDK client
    pub fn new(client: aws_sdk_lightsail::Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }
}

/// Flatten an SDK error, keeping the service message and its sources
fn sdk_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::api(DisplayErrorContext(&err).to_string())
}

fn timestamp(value: Option<&DateTime>) -> Option<String> {
    value.and_then(|t| t.fmt(DateTimeFormat::DateTime).ok())
}

fn location(value: Option<&types::ResourceLocation>) -> Option<ResourceLocation> {
    value.map(|l| ResourceLocation {
        availability_zone: l.availability_zone().map(str::to_string),
        region_name: l.region_name().map(|r| r.as_str().to_string()),
    })
}

fn state_name(instance: &types::Instance) -> String {
    instance
        .state()
        .and_then(|s| s.name())
        .unwrap_or_default()
        .to_string()
}

fn to_instance(instance: &types::Instance) -> Instance {
    Instance {
        name: instance.name().unwrap_or_default().to_string(),
        state: state_name(instance),
        public_ip: instance.public_ip_address().map(str::to_string),
    }
}

fn to_status(instance: &types::Instance) -> InstanceStatus {
    InstanceStatus {
        resource_name: instance.name().unwrap_or_default().to_string(),
        status: state_name(instance),
        created_at: timestamp(instance.created_at()),
        public_ip: instance.public_ip_address().map(str::to_string),
        private_ip: instance.private_ip_address().map(str::to_string),
        blueprint_id: instance.blueprint_id().map(str::to_string),
        bundle_id: instance.bundle_id().map(str::to_string),
        is_static_ip: instance.is_static_ip(),
        location: location(instance.location()),
    }
}

fn to_operation(op: &types::Operation) -> Operation {
    Operation {
        id: op.id().map(str::to_string),
        resource_name: op.resource_name().map(str::to_string),
        resource_type: op.resource_type().map(|t| t.as_str().to_string()),
        operation_type: op.operation_type().map(|t| t.as_str().to_string()),
        status: op.status().map(|s| s.as_str().to_string()),
        created_at: timestamp(op.created_at()),
        status_changed_at: timestamp(op.status_changed_at()),
        is_terminal: op.is_terminal(),
        operation_details: op.operation_details().map(str::to_string),
        error_code: op.error_code().map(str::to_string),
        error_details: op.error_details().map(str::to_string),
        location: location(op.location()),
    }
}

fn to_operations(ops: &[types::Operation]) -> Vec<Operation> {
    ops.iter().map(to_operation).collect()
}

fn to_static_ip(ip: &types::StaticIp) -> StaticIp {
    StaticIp {
        name: ip.name().unwrap_or_default().to_string(),
        ip_address: ip.ip_address().map(str::to_string),
        attached_to: ip.attached_to().map(str::to_string),
        is_attached: ip.is_attached().unwrap_or(false),
        created_at: timestamp(ip.created_at()),
        location: location(ip.location()),
    }
}

#[async_trait]
impl ComputeProvider for LightsailProvider {
    async fn list_instances(&self) -> Result<Vec<Instance>> {
        let mut instances = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let output = self
                .client
                .get_instances()
                .set_page_token(page_token.take())
                .send()
                .await
                .map_err(sdk_error)?;

            instances.extend(output.instances().iter().map(to_instance));

            match output.next_page_token() {
                Some(token) if !token.is_empty() => page_token = Some(token.to_string()),
                _ => break,
            }
        }

        tracing::debug!("Lightsail returned {} instance(s) in {}", instances.len(), self.region);
        Ok(instances)
    }

    async fn get_instance(&self, name: &str) -> Result<InstanceStatus> {
        let output = self
            .client
            .get_instance()
            .instance_name(name)
            .send()
            .await
            .map_err(sdk_error)?;

        output
            .instance()
            .map(to_status)
            .ok_or_else(|| Error::not_found(format!("instance {} not found", name)))
    }

    async fn start_instance(&self, name: &str) -> Result<Vec<Operation>> {
        let output = self
            .client
            .start_instance()
            .instance_name(name)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(to_operations(output.operations()))
    }

    async fn stop_instance(&self, name: &str) -> Result<Vec<Operation>> {
        let output = self
            .client
            .stop_instance()
            .instance_name(name)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(to_operations(output.operations()))
    }

    async fn reboot_instance(&self, name: &str) -> Result<Vec<Operation>> {
        let output = self
            .client
            .reboot_instance()
            .instance_name(name)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(to_operations(output.operations()))
    }

    async fn list_static_ips(&self) -> Result<Vec<StaticIp>> {
        let mut ips = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let output = self
                .client
                .get_static_ips()
                .set_page_token(page_token.take())
                .send()
                .await
                .map_err(sdk_error)?;

            ips.extend(output.static_ips().iter().map(to_static_ip));

            match output.next_page_token() {
                Some(token) if !token.is_empty() => page_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(ips)
    }

    async fn release_static_ip(&self, ip_name: &str) -> Result<Vec<Operation>> {
        let output = self
            .client
            .release_static_ip()
            .static_ip_name(ip_name)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(to_operations(output.operations()))
    }

    async fn allocate_static_ip(&self, ip_name: &str) -> Result<Vec<Operation>> {
        let output = self
            .client
            .allocate_static_ip()
            .static_ip_name(ip_name)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(to_operations(output.operations()))
    }

    async fn attach_static_ip(&self, ip_name: &str, instance: &str) -> Result<Vec<Operation>> {
        let output = self
            .client
            .attach_static_ip()
            .static_ip_name(ip_name)
            .instance_name(instance)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(to_operations(output.operations()))
    }

    async fn get_static_ip(&self, ip_name: &str) -> Result<StaticIp> {
        let output = self
            .client
            .get_static_ip()
            .static_ip_name(ip_name)
            .send()
            .await
            .map_err(sdk_error)?;

        output
            .static_ip()
            .map(to_static_ip)
            .ok_or_else(|| Error::not_found(format!("static IP {} not found", ip_name)))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory that builds a Lightsail client per request
#[derive(Debug, Default, Clone, Copy)]
pub struct LightsailFactory;

impl LightsailFactory {
    /// Load SDK configuration for `target`'s region and profile
    async fn sdk_config(
        credentials: &CredentialSource,
        target: &InstanceTarget,
    ) -> Result<aws_config::SdkConfig> {
        let loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(target.region.clone()));

        let loader = match credentials {
            CredentialSource::ProfileFiles {
                config_file,
                credentials_file,
            } => {
                for file in [config_file, credentials_file] {
                    if !Path::new(file).is_file() {
                        return Err(Error::credential(format!(
                            "Shared profile file not found: {}",
                            file
                        )));
                    }
                }

                let files = EnvConfigFiles::builder()
                    .with_file(EnvConfigFileKind::Config, config_file)
                    .with_file(EnvConfigFileKind::Credentials, credentials_file)
                    .build();

                // The default chain reads AWS_ACCESS_KEY_ID first; pin credentials to the profile
                let profile_credentials = ProfileFileCredentialsProvider::builder()
                    .profile_files(files.clone())
                    .profile_name(&target.profile)
                    .build();

                loader
                    .profile_files(files)
                    .profile_name(&target.profile)
                    .credentials_provider(profile_credentials)
            }
            CredentialSource::StaticKeys {
                access_key_id,
                secret_access_key,
            } => loader.credentials_provider(aws_sdk_lightsail::config::Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                STATIC_CREDENTIALS_SOURCE,
            )),
        };

        Ok(loader.load().await)
    }
}

#[async_trait]
impl ComputeProviderFactory for LightsailFactory {
    async fn connect(
        &self,
        config: &ComputeConfig,
        target: &InstanceTarget,
    ) -> Result<Box<dyn ComputeProvider>> {
        let ComputeConfig::Lightsail { credentials } = config else {
            return Err(Error::config("Invalid config for Lightsail provider"));
        };

        tracing::debug!(
            "Connecting Lightsail client: region={} profile={}",
            target.region,
            target.profile
        );

        let sdk_config = Self::sdk_config(credentials, target).await?;
        let client = aws_sdk_lightsail::Client::new(&sdk_config);

        Ok(Box::new(LightsailProvider::new(client, target.region.clone())))
    }
}

/// Register the Lightsail provider with a registry
///
/// # Example
///
/// ```rust
/// use instctl_core::ProviderRegistry;
///
/// let mut registry = ProviderRegistry::new();
/// instctl_provider_lightsail::register(&mut registry);
/// assert!(registry.has_compute("lightsail"));
/// ```
pub fn register(registry: &mut ProviderRegistry) {
    registry.register_compute(PROVIDER_NAME, Arc::new(LightsailFactory));
}
