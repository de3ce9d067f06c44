//! Configuration types for the instance control plane
//!
//! The service config is a JSON document loaded once at startup. Everything
//! here is read-only after load.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Regions the control plane serves, in the order `/api/regions` reports them
pub const SUPPORTED_REGIONS: [&str; 14] = [
    "us-east-1",
    "us-east-2",
    "us-west-2",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-central-1",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-south-1",
    "ca-central-1",
    "eu-north-1",
];

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Request freshness settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Compute provider configuration
    #[serde(default)]
    pub compute: ComputeConfig,

    /// DNS accounts kept in sync after static-IP reassignment
    #[serde(default)]
    pub dns_accounts: Vec<DnsAccountConfig>,
}

impl ServiceConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            compute: ComputeConfig::default(),
            dns_accounts: Vec::new(),
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    /// Parse a configuration from a JSON string
    pub fn from_json(raw: &str) -> Result<Self, crate::Error> {
        let config: Self = serde_json::from_str(raw)?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.server.bind_addr.is_empty() {
            return Err(crate::Error::config("server.bind_addr cannot be empty"));
        }

        self.auth.validate()?;
        self.compute.validate()?;

        for account in &self.dns_accounts {
            account.validate()?;
        }

        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

/// Request freshness settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Maximum accepted |now - secret| in seconds.
    ///
    /// Deployments have used 120 and 3600.
    #[serde(default = "default_tolerance_secs")]
    pub tolerance_secs: u64,
}

impl AuthConfig {
    /// Validate the auth settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.tolerance_secs == 0 {
            return Err(crate::Error::config("auth.tolerance_secs must be > 0"));
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            tolerance_secs: default_tolerance_secs(),
        }
    }
}

fn default_tolerance_secs() -> u64 {
    3600
}

/// Compute provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComputeConfig {
    /// AWS Lightsail
    Lightsail {
        /// How clients authenticate
        #[serde(default)]
        credentials: CredentialSource,
    },

    /// Custom compute provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ComputeConfig {
    /// Validate the compute configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ComputeConfig::Lightsail { credentials } => credentials.validate(),
            ComputeConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom compute provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom compute provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ComputeConfig::Lightsail { .. } => "lightsail",
            ComputeConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for ComputeConfig {
    fn default() -> Self {
        ComputeConfig::Lightsail {
            credentials: CredentialSource::default(),
        }
    }
}

/// Where provider clients get their credentials from
///
/// Profile files resolve the request's `profile` against shared config and
/// credentials files. Static keys ignore the profile name.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialSource {
    /// Named profiles from shared config/credentials files
    ProfileFiles {
        /// Shared config file path
        #[serde(default = "default_config_file")]
        config_file: String,
        /// Shared credentials file path
        #[serde(default = "default_credentials_file")]
        credentials_file: String,
    },

    /// A single fixed key pair
    StaticKeys {
        /// Access key ID
        access_key_id: String,
        /// Secret access key
        secret_access_key: String,
    },
}

impl CredentialSource {
    /// Validate the credential source
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            CredentialSource::ProfileFiles {
                config_file,
                credentials_file,
            } => {
                if config_file.is_empty() || credentials_file.is_empty() {
                    return Err(crate::Error::config(
                        "Profile file paths cannot be empty",
                    ));
                }
                Ok(())
            }
            CredentialSource::StaticKeys {
                access_key_id,
                secret_access_key,
            } => {
                if access_key_id.is_empty() || secret_access_key.is_empty() {
                    return Err(crate::Error::config(
                        "Static access key ID and secret cannot be empty",
                    ));
                }
                Ok(())
            }
        }
    }
}

impl Default for CredentialSource {
    fn default() -> Self {
        CredentialSource::ProfileFiles {
            config_file: default_config_file(),
            credentials_file: default_credentials_file(),
        }
    }
}

// Keys stay out of logs
impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::ProfileFiles {
                config_file,
                credentials_file,
            } => f
                .debug_struct("ProfileFiles")
                .field("config_file", config_file)
                .field("credentials_file", credentials_file)
                .finish(),
            CredentialSource::StaticKeys { access_key_id, .. } => f
                .debug_struct("StaticKeys")
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"<REDACTED>")
                .finish(),
        }
    }
}

fn default_config_file() -> String {
    "aws/config".to_string()
}

fn default_credentials_file() -> String {
    "aws/credentials".to_string()
}

/// A DNS account tied to a compute profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsAccountConfig {
    /// Compute profile whose reassignments update this account
    pub profile: String,

    /// DNS provider settings
    pub provider: DnsProviderConfig,
}

impl DnsAccountConfig {
    /// Validate the account
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.profile.is_empty() {
            return Err(crate::Error::config("DNS account profile cannot be empty"));
        }
        self.provider.validate()
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DnsProviderConfig {
    /// Cloudflare provider
    Cloudflare {
        /// Global API key (used with `api_email`)
        #[serde(default)]
        api_key: String,
        /// Account email for the global API key
        #[serde(default)]
        api_email: String,
        /// Scoped API token (alternative to key + email)
        #[serde(default)]
        api_token: Option<String>,
        /// Zone domain (e.g. "example.com")
        domain: String,
        /// Zone ID (optional, looked up from `domain` otherwise)
        #[serde(default)]
        zone_id: Option<String>,
        /// Log intended updates instead of sending them
        #[serde(default)]
        dry_run: bool,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Zone domain
        domain: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl DnsProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            DnsProviderConfig::Cloudflare {
                api_key,
                api_email,
                api_token,
                domain,
                ..
            } => {
                let has_token = api_token.as_ref().is_some_and(|t| !t.is_empty());
                let has_key = !api_key.is_empty() && !api_email.is_empty();
                if !has_token && !has_key {
                    return Err(crate::Error::config(
                        "Cloudflare needs either api_token or api_key + api_email",
                    ));
                }
                if domain.is_empty() {
                    return Err(crate::Error::config("Cloudflare domain cannot be empty"));
                }
                Ok(())
            }
            DnsProviderConfig::Custom {
                factory,
                domain,
                config,
            } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom DNS provider factory cannot be empty",
                    ));
                }
                if domain.is_empty() {
                    return Err(crate::Error::config("Custom DNS provider domain cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom DNS provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            DnsProviderConfig::Cloudflare { .. } => "cloudflare",
            DnsProviderConfig::Custom { factory, .. } => factory,
        }
    }

    /// Zone domain this account manages
    pub fn domain(&self) -> &str {
        match self {
            DnsProviderConfig::Cloudflare { domain, .. } => domain,
            DnsProviderConfig::Custom { domain, .. } => domain,
        }
    }
}

impl std::fmt::Debug for DnsProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DnsProviderConfig::Cloudflare {
                api_email,
                domain,
                zone_id,
                dry_run,
                ..
            } => f
                .debug_struct("Cloudflare")
                .field("api_key", &"<REDACTED>")
                .field("api_email", api_email)
                .field("api_token", &"<REDACTED>")
                .field("domain", domain)
                .field("zone_id", zone_id)
                .field("dry_run", dry_run)
                .finish(),
            DnsProviderConfig::Custom {
                factory, domain, ..
            } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("domain", domain)
                .finish_non_exhaustive(),
        }
    }
}
