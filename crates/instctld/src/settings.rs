//! Environment settings for the daemon
//!
//! The JSON service config describes providers and accounts; these
//! environment variables pick the file and override deployment details.
//!
//! - `INSTCTL_CONFIG`: Path to the service config (default `./config.json`)
//! - `INSTCTL_BIND_ADDR`: Listen address, overrides `server.bind_addr`
//! - `INSTCTL_LOG_LEVEL`: trace, debug, info, warn or error (default info)
//! - `INSTCTL_TIMESTAMP_TOLERANCE_SECS`: Accepted `secret` skew, 1 to 86400
//! - `INSTCTL_CREDENTIALS`: `profile` (default) or `static`; `static` reads
//!   `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY`
//! - `INSTCTL_DNS_MODE`: `live` (default) or `dry-run`
//!
//! ## Example
//!
//! ```bash
//! export INSTCTL_CONFIG=/etc/instctl/config.json
//! export INSTCTL_BIND_ADDR=127.0.0.1:8080
//! export INSTCTL_LOG_LEVEL=debug
//!
//! instctld
//! ```

use anyhow::{Context, Result};
use instctl_core::{ComputeConfig, CredentialSource, ServiceConfig};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::Level;

/// Config path used when `INSTCTL_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "./config.json";

/// Largest accepted timestamp tolerance (one day)
pub const MAX_TOLERANCE_SECS: u64 = 86_400;

/// Settings read from the process environment
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// Explicit config path; `None` means the default path, which may be absent
    pub config_path: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub log_level: String,
    pub tolerance_secs: Option<u64>,
    pub credentials: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub dns_mode: String,
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let tolerance_secs = match non_empty("INSTCTL_TIMESTAMP_TOLERANCE_SECS") {
            Some(raw) => Some(raw.trim().parse::<u64>().with_context(|| {
                format!("INSTCTL_TIMESTAMP_TOLERANCE_SECS must be a whole number of seconds. Got: {raw}")
            })?),
            None => None,
        };

        Ok(Self {
            config_path: non_empty("INSTCTL_CONFIG").map(PathBuf::from),
            bind_addr: non_empty("INSTCTL_BIND_ADDR"),
            log_level: non_empty("INSTCTL_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            tolerance_secs,
            credentials: non_empty("INSTCTL_CREDENTIALS").unwrap_or_else(|| "profile".to_string()),
            access_key_id: non_empty("AWS_ACCESS_KEY_ID"),
            secret_access_key: non_empty("AWS_SECRET_ACCESS_KEY"),
            dns_mode: non_empty("INSTCTL_DNS_MODE").unwrap_or_else(|| "live".to_string()),
        })
    }

    /// Validate the settings
    ///
    /// Checks value formats and ranges, and that static credentials come
    /// with both keys.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref addr) = self.bind_addr {
            addr.parse::<SocketAddr>().with_context(|| {
                format!("INSTCTL_BIND_ADDR must be an IP:port address. Got: {addr}")
            })?;
        }

        if let Some(tolerance) = self.tolerance_secs
            && !(1..=MAX_TOLERANCE_SECS).contains(&tolerance)
        {
            anyhow::bail!(
                "INSTCTL_TIMESTAMP_TOLERANCE_SECS must be between 1 and {} seconds. Got: {}",
                MAX_TOLERANCE_SECS,
                tolerance
            );
        }

        match self.credentials.to_lowercase().as_str() {
            "profile" => {}
            "static" => {
                if self.access_key_id.is_none() || self.secret_access_key.is_none() {
                    anyhow::bail!(
                        "INSTCTL_CREDENTIALS=static requires AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY"
                    );
                }
            }
            other => anyhow::bail!(
                "INSTCTL_CREDENTIALS '{}' is not supported. Supported: profile, static",
                other
            ),
        }

        match self.dns_mode.to_lowercase().as_str() {
            "live" | "dry-run" => {}
            other => anyhow::bail!(
                "INSTCTL_DNS_MODE '{}' is not supported. Supported: live, dry-run",
                other
            ),
        }

        self.log_level()?;
        Ok(())
    }

    /// Parsed log level
    pub fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "INSTCTL_LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Whether DNS updates are only logged
    pub fn dns_dry_run(&self) -> bool {
        self.dns_mode.eq_ignore_ascii_case("dry-run")
    }

    /// Read the service config and apply the environment overrides
    ///
    /// A missing file is an error only when `INSTCTL_CONFIG` named it; the
    /// default path falls back to built-in defaults.
    pub fn load_service_config(&self) -> Result<ServiceConfig> {
        let mut config = match self.config_path {
            Some(ref path) => read_config(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).is_file() => {
                read_config(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => {
                tracing::warn!(
                    "No config file at {}; running with defaults and no DNS accounts",
                    DEFAULT_CONFIG_PATH
                );
                ServiceConfig::new()
            }
        };

        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides to a loaded config
    pub fn apply(&self, config: &mut ServiceConfig) {
        if let Some(ref addr) = self.bind_addr {
            config.server.bind_addr = addr.clone();
        }

        if let Some(tolerance) = self.tolerance_secs {
            config.auth.tolerance_secs = tolerance;
        }

        if self.credentials.eq_ignore_ascii_case("static")
            && let (Some(access_key_id), Some(secret_access_key)) =
                (&self.access_key_id, &self.secret_access_key)
            && let ComputeConfig::Lightsail { credentials } = &mut config.compute
        {
            *credentials = CredentialSource::StaticKeys {
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
            };
        }
    }
}

fn read_config(path: &Path) -> Result<ServiceConfig> {
    ServiceConfig::from_file(path)
        .with_context(|| format!("Failed to load service config from {}", path.display()))
}

// Keys stay out of logs
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("config_path", &self.config_path)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("tolerance_secs", &self.tolerance_secs)
            .field("credentials", &self.credentials)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<REDACTED>"),
            )
            .field("dns_mode", &self.dns_mode)
            .finish()
    }
}
