//! Plugin-based provider registry
//!
//! The registry maps provider type names from configuration to factories,
//! avoiding hardcoded if-else chains over provider kinds.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use instctl_core::ProviderRegistry;
//!
//! let mut registry = ProviderRegistry::new();
//! instctl_provider_lightsail::register(&mut registry);
//! instctl_provider_cloudflare::register(&mut registry);
//!
//! let compute = registry.compute_factory(&config.compute)?;
//! let dns = registry.create_dns_provider(&account.provider)?;
//! ```
//!
//! Registration happens once at startup; afterwards the registry is only read.

use crate::config::{ComputeConfig, DnsProviderConfig};
use crate::error::{Error, Result};
use crate::traits::{ComputeProviderFactory, DnsProvider, DnsProviderFactory};
use std::collections::HashMap;
use std::sync::Arc;

/// Provider registry for configuration-driven provider creation
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered compute provider factories
    compute: HashMap<String, Arc<dyn ComputeProviderFactory>>,

    /// Registered DNS provider factories
    dns: HashMap<String, Box<dyn DnsProviderFactory>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a compute provider factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "lightsail")
    /// - `factory`: Factory that connects per-request clients
    pub fn register_compute(
        &mut self,
        name: impl Into<String>,
        factory: Arc<dyn ComputeProviderFactory>,
    ) {
        self.compute.insert(name.into(), factory);
    }

    /// Register a DNS provider factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "cloudflare")
    /// - `factory`: Factory object for creating provider instances
    pub fn register_dns(&mut self, name: impl Into<String>, factory: Box<dyn DnsProviderFactory>) {
        self.dns.insert(name.into(), factory);
    }

    /// Look up the compute factory selected by configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn ComputeProviderFactory>)`: The registered factory
    /// - `Err(Error)`: If the provider type is not registered
    pub fn compute_factory(&self, config: &ComputeConfig) -> Result<Arc<dyn ComputeProviderFactory>> {
        let provider_type = config.type_name();
        self.compute
            .get(provider_type)
            .cloned()
            .ok_or_else(|| Error::config(format!("Unknown compute provider type: {}", provider_type)))
    }

    /// Create a DNS provider from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DnsProvider>)`: Created provider instance
    /// - `Err(Error)`: If provider type is not registered or creation fails
    pub fn create_dns_provider(&self, config: &DnsProviderConfig) -> Result<Box<dyn DnsProvider>> {
        let provider_type = config.type_name();
        let factory = self
            .dns
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown DNS provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// List all registered compute provider types
    pub fn list_compute(&self) -> Vec<String> {
        self.compute.keys().cloned().collect()
    }

    /// List all registered DNS provider types
    pub fn list_dns(&self) -> Vec<String> {
        self.dns.keys().cloned().collect()
    }

    /// Check if a compute provider type is registered
    pub fn has_compute(&self, name: &str) -> bool {
        self.compute.contains_key(name)
    }

    /// Check if a DNS provider type is registered
    pub fn has_dns(&self, name: &str) -> bool {
        self.dns.contains_key(name)
    }
}
