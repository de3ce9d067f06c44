// # DNS Provider Trait
//
// Defines the interface for finding and rewriting A records in a zone.
//
// ## Implementations
//
// - Cloudflare: `instctl-provider-cloudflare` crate
// - In-memory: `instctl_core::mock` (tests)
//
// ## Usage
//
// ```rust,ignore
// let zone_id = provider.zone_id("example.com").await?;
// for record in provider.find_a_records(&zone_id, old_ip).await? {
//     provider.update_a_record(&zone_id, &record, new_ip).await?;
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// TTL value that asks the provider to pick automatically
pub const AUTOMATIC_TTL: u32 = 1;

/// A DNS record as the provider reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider record ID
    pub id: String,
    /// Fully qualified record name
    pub name: String,
    /// Record type ("A")
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record content (the address for A records)
    pub content: String,
    /// Time-to-live in seconds (1 = automatic)
    pub ttl: u32,
    /// Whether traffic is proxied through the provider
    #[serde(default)]
    pub proxied: bool,
}

impl DnsRecord {
    /// Whether this is an A record pointing at `ip`
    pub fn points_at(&self, ip: Ipv4Addr) -> bool {
        self.record_type == "A" && self.content == ip.to_string()
    }
}

/// Trait for DNS provider implementations
///
/// Each method performs the provider calls needed for one logical read or
/// write. Implementations are stateless between calls and never retry; the
/// caller decides what a failure means.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Resolve the zone ID for `domain`
    async fn zone_id(&self, domain: &str) -> Result<String, crate::Error>;

    /// List A records in `zone_id` whose content is `content`
    async fn find_a_records(
        &self,
        zone_id: &str,
        content: Ipv4Addr,
    ) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Point `record` at `new_ip`, keeping its name and resetting TTL to automatic
    async fn update_a_record(
        &self,
        zone_id: &str,
        record: &DnsRecord,
        new_ip: Ipv4Addr,
    ) -> Result<DnsRecord, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    fn create(
        &self,
        config: &crate::config::DnsProviderConfig,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(record_type: &str, content: &str) -> DnsRecord {
        DnsRecord {
            id: "rec-1".to_string(),
            name: "www.example.com".to_string(),
            record_type: record_type.to_string(),
            content: content.to_string(),
            ttl: 300,
            proxied: false,
        }
    }

    #[test]
    fn points_at_requires_exact_match() {
        let ip = Ipv4Addr::new(1, 2, 3, 4);
        assert!(record("A", "1.2.3.4").points_at(ip));
        assert!(!record("A", "1.2.3.40").points_at(ip));
        assert!(!record("AAAA", "1.2.3.4").points_at(ip));
    }

    #[test]
    fn record_type_serializes_as_type() {
        let json = serde_json::to_value(record("A", "1.2.3.4")).unwrap();
        assert_eq!(json["type"], "A");
    }
}
