//! DNS sync after static-IP reassignment
//!
//! Rewrites A records that still carry the released address. Records are
//! matched by their current content, never by name: a record that already
//! points elsewhere is left alone, so re-running a sync is harmless.

use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsRecord};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of syncing one zone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Zone the records belong to
    pub zone_id: String,
    /// Records now pointing at the new address
    pub updated: Vec<DnsRecord>,
    /// Records whose update failed, with the error message
    pub failed: Vec<(String, String)>,
}

impl SyncReport {
    /// Whether every matched record was updated
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Syncs A records of one zone through one DNS provider
#[derive(Clone)]
pub struct DnsSync {
    provider: Arc<dyn DnsProvider>,
    domain: String,
}

impl DnsSync {
    /// Create a sync for the zone of `domain`
    pub fn new(provider: Arc<dyn DnsProvider>, domain: impl Into<String>) -> Self {
        Self {
            provider,
            domain: domain.into(),
        }
    }

    /// Zone domain
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Point every A record with content `old_ip` at `new_ip`.
    ///
    /// Zone lookup and listing failures end the sync with `Error::DnsSync`.
    /// A failed record update is recorded in the report and the remaining
    /// records are still processed.
    pub async fn sync(&self, old_ip: Ipv4Addr, new_ip: Ipv4Addr) -> Result<SyncReport> {
        let provider = self.provider.provider_name();

        let zone_id = self
            .provider
            .zone_id(&self.domain)
            .await
            .map_err(|e| Error::dns_sync(format!("zone lookup for {}: {}", self.domain, e)))?;

        let candidates = self
            .provider
            .find_a_records(&zone_id, old_ip)
            .await
            .map_err(|e| Error::dns_sync(format!("listing records in {}: {}", self.domain, e)))?;

        let mut report = SyncReport {
            zone_id: zone_id.clone(),
            ..Default::default()
        };

        // Providers filter by content; only exact matches are ever rewritten
        for record in candidates.iter().filter(|r| r.points_at(old_ip)) {
            match self.provider.update_a_record(&zone_id, record, new_ip).await {
                Ok(updated) => {
                    info!(
                        provider,
                        record = %record.name,
                        id = %record.id,
                        %old_ip,
                        %new_ip,
                        "DNS record updated"
                    );
                    report.updated.push(updated);
                }
                Err(e) => {
                    warn!(provider, record = %record.name, error = %e, "DNS record update failed");
                    report.failed.push((record.name.clone(), e.to_string()));
                }
            }
        }

        if report.updated.is_empty() && report.failed.is_empty() {
            info!(provider, domain = %self.domain, %old_ip, "No DNS records matched the released address");
        }

        Ok(report)
    }
}

impl std::fmt::Debug for DnsSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsSync")
            .field("provider", &self.provider.provider_name())
            .field("domain", &self.domain)
            .finish()
    }
}
