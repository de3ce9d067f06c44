// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare implementation of `instctl_core::DnsProvider`.
//
// ## Behavior
//
// - Zone ID from configuration, or looked up by domain name
// - A record listing filtered by content, following pagination
// - Record updates via PATCH, so fields not sent (proxied, comment) are kept
// - HTTP timeout of 30 seconds
// - Specific error messages for HTTP status codes (401/403, 404, 409, 429, 5xx)
// - Dry-run mode: reads are performed, updates are only logged
// - No retries; the caller decides what a failure means
//
// ## Authentication
//
// Either a scoped API token (`Authorization: Bearer`) or the legacy global
// API key with account email (`X-Auth-Key` / `X-Auth-Email`).
// Credentials never appear in logs or `Debug` output.
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=A&content=...`
// - Patch DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use instctl_core::config::DnsProviderConfig;
use instctl_core::traits::{AUTOMATIC_TTL, DnsProvider, DnsProviderFactory, DnsRecord};
use instctl_core::{Error, ProviderRegistry, Result};
use serde::Deserialize;
use serde_json::Value;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Records requested per page when listing
const RECORDS_PER_PAGE: u32 = 100;

/// Environment variable that forces dry-run mode when set to `dry-run`
pub const DNS_MODE_ENV: &str = "INSTCTL_DNS_MODE";

/// How requests authenticate
#[derive(Clone, PartialEq, Eq)]
pub enum CloudflareAuth {
    /// Scoped API token
    Token(String),
    /// Global API key with account email
    GlobalKey {
        /// API key
        key: String,
        /// Account email
        email: String,
    },
}

impl CloudflareAuth {
    fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            CloudflareAuth::Token(token) => request.bearer_auth(token),
            CloudflareAuth::GlobalKey { key, email } => request
                .header("X-Auth-Key", key)
                .header("X-Auth-Email", email),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            CloudflareAuth::Token(token) => token.is_empty(),
            CloudflareAuth::GlobalKey { key, email } => key.is_empty() || email.is_empty(),
        }
    }
}

impl std::fmt::Debug for CloudflareAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloudflareAuth::Token(_) => f.write_str("Token(<REDACTED>)"),
            CloudflareAuth::GlobalKey { email, .. } => f
                .debug_struct("GlobalKey")
                .field("key", &"<REDACTED>")
                .field("email", email)
                .finish(),
        }
    }
}

/// Cloudflare DNS provider
///
/// Stateless between calls: the zone ID is only remembered when it comes
/// from configuration.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (zone lookup, record listing)
/// - Log the intended PATCH payload
/// - **NOT** modify DNS records
pub struct CloudflareProvider {
    /// ⚠️ NEVER log this value
    auth: CloudflareAuth,

    /// Zone ID (optional, looked up from the domain otherwise)
    zone_id: Option<String>,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// API base URL (overridable for tests)
    base_url: String,

    /// Dry-run mode: if true, perform GET requests but skip updates
    dry_run: bool,
}

// Custom Debug implementation that hides credentials
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("auth", &self.auth)
            .field("zone_id", &self.zone_id)
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// Record as returned by the API
#[derive(Debug, Deserialize)]
struct ApiRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
    #[serde(default = "automatic_ttl")]
    ttl: u32,
    #[serde(default)]
    proxied: bool,
}

fn automatic_ttl() -> u32 {
    AUTOMATIC_TTL
}

impl From<ApiRecord> for DnsRecord {
    fn from(r: ApiRecord) -> Self {
        DnsRecord {
            id: r.id,
            name: r.name,
            record_type: r.record_type,
            content: r.content,
            ttl: r.ttl,
            proxied: r.proxied,
        }
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `auth`: Token or global key with Zone:DNS:Edit permissions
    /// - `zone_id`: Optional zone ID (looked up by domain otherwise)
    /// - `dry_run`: If true, perform GET requests but skip updates
    ///
    /// # Errors
    ///
    /// Fails if the credentials are empty or the HTTP client cannot be built.
    pub fn new(auth: CloudflareAuth, zone_id: Option<String>, dry_run: bool) -> Result<Self> {
        if auth.is_empty() {
            return Err(Error::config("Cloudflare credentials cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            auth,
            zone_id,
            client,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            dry_run,
        })
    }

    /// Point the provider at a different API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether updates are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Send an authenticated request, mapping HTTP failures to errors
    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = self
            .auth
            .apply(request)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::api(format!("cloudflare: HTTP request failed: {}", e)))?;

        // Handle specific HTTP status codes
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(match status.as_u16() {
                401 | 403 => Error::api(format!(
                    "cloudflare: Authentication failed: Invalid credentials or insufficient permissions. Status: {}",
                    status
                )),
                404 => Error::not_found(format!("cloudflare: {} target not found", what)),
                409 => Error::api(format!(
                    "cloudflare: Conflict: Record is being updated by another process. Status: {}",
                    status
                )),
                429 => Error::api(format!(
                    "cloudflare: Rate limit exceeded. Please retry later. Status: {}",
                    status
                )),
                500..=599 => Error::api(format!(
                    "cloudflare: Server error (transient): {} - {}",
                    status, error_text
                )),
                _ => Error::api(format!(
                    "cloudflare: {} failed: {} - {}",
                    what, status, error_text
                )),
            });
        }

        Ok(response)
    }

    /// Send a request and return the `result` field of a successful envelope
    async fn call(&self, request: reqwest::RequestBuilder, what: &str) -> Result<Value> {
        let mut json: Value = self
            .send(request, what)
            .await?
            .json()
            .await
            .map_err(|e| Error::api(format!("cloudflare: Failed to parse response: {}", e)))?;

        let envelope = json.as_object_mut().ok_or_else(|| {
            Error::api(format!(
                "cloudflare: Invalid response format: {} response is not an object",
                what
            ))
        })?;

        if envelope.get("success") == Some(&Value::Bool(false)) {
            let errors = envelope.get("errors").cloned().unwrap_or(Value::Null);
            return Err(Error::api(format!("cloudflare: {} failed: {}", what, errors)));
        }

        Ok(envelope.remove("result").unwrap_or(Value::Null))
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// Resolve the zone ID for `domain`
    ///
    /// ```http
    /// GET /zones?name=example.com
    /// ```
    async fn zone_id(&self, domain: &str) -> Result<String> {
        // If zone_id is pre-configured, use it
        if let Some(ref zone_id) = self.zone_id {
            tracing::debug!("Using pre-configured zone ID");
            return Ok(zone_id.clone());
        }

        tracing::debug!("Looking up zone ID for domain: {}", domain);

        let url = format!("{}/zones", self.base_url);
        let result = self
            .call(self.client.get(&url).query(&[("name", domain)]), "zone lookup")
            .await?;

        let zones = result
            .as_array()
            .ok_or_else(|| Error::api("cloudflare: Invalid response format: result is not an array"))?;

        let zone = zones
            .first()
            .ok_or_else(|| Error::not_found(format!("cloudflare: zone {}", domain)))?;

        let zone_id = zone["id"]
            .as_str()
            .ok_or_else(|| Error::api("cloudflare: Invalid response format: zone.id is not a string"))?;

        tracing::debug!("Found zone ID: {}", zone_id);
        Ok(zone_id.to_string())
    }

    /// List A records with `content`, one page at a time
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?type=A&content=1.2.3.4&per_page=100&page=1
    /// ```
    async fn find_a_records(&self, zone_id: &str, content: Ipv4Addr) -> Result<Vec<DnsRecord>> {
        let url = format!("{}/zones/{}/dns_records", self.base_url, zone_id);
        let content = content.to_string();
        let per_page = RECORDS_PER_PAGE.to_string();

        let mut records = Vec::new();
        let mut page: u32 = 1;

        loop {
            let page_str = page.to_string();
            let request = self.client.get(&url).query(&[
                ("type", "A"),
                ("content", content.as_str()),
                ("per_page", per_page.as_str()),
                ("page", page_str.as_str()),
            ]);

            // The envelope's result_info is needed for paging, so parse it here
            let response = self.send(request, "record listing").await?;

            let envelope: ListEnvelope = response
                .json()
                .await
                .map_err(|e| Error::api(format!("cloudflare: Failed to parse response: {}", e)))?;

            if !envelope.success {
                return Err(Error::api(format!(
                    "cloudflare: Record listing failed: {}",
                    envelope.errors
                )));
            }

            records.extend(envelope.result.into_iter().map(DnsRecord::from));

            let total_pages = envelope.result_info.map(|i| i.total_pages).unwrap_or(1);
            if page >= total_pages {
                break;
            }
            page += 1;
        }

        tracing::debug!(
            "Found {} A record(s) with content {} in zone {}",
            records.len(),
            content,
            zone_id
        );
        Ok(records)
    }

    /// Point `record` at `new_ip` (skipped in dry-run mode)
    ///
    /// ```http
    /// PATCH /zones/:zone_id/dns_records/:record_id
    /// { "type": "A", "name": "...", "content": "5.6.7.8", "ttl": 1, "proxied": false }
    /// ```
    async fn update_a_record(
        &self,
        zone_id: &str,
        record: &DnsRecord,
        new_ip: Ipv4Addr,
    ) -> Result<DnsRecord> {
        let url = format!("{}/zones/{}/dns_records/{}", self.base_url, zone_id, record.id);
        let payload = serde_json::json!({
            "type": "A",
            "name": record.name,
            "content": new_ip.to_string(),
            "ttl": AUTOMATIC_TTL,
            "proxied": record.proxied,
        });

        tracing::info!(
            "{} DNS record: {} -> {} (was: {}) [mode: {}]",
            if self.dry_run { "Would update" } else { "Updating" },
            record.name,
            new_ip,
            record.content,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        // In dry-run mode, log the intended update and return success
        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send PATCH request to {} with payload: {}", url, payload);
            return Ok(DnsRecord {
                content: new_ip.to_string(),
                ttl: AUTOMATIC_TTL,
                ..record.clone()
            });
        }

        let result = self
            .call(self.client.patch(&url).json(&payload), "record update")
            .await?;

        let updated: ApiRecord = serde_json::from_value(result)
            .map_err(|e| Error::api(format!("cloudflare: Invalid record in response: {}", e)))?;

        tracing::info!("DNS record updated successfully: {} -> {}", record.name, new_ip);
        Ok(updated.into())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

#[derive(Debug, Deserialize)]
struct ListEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Value,
    #[serde(default)]
    result: Vec<ApiRecord>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default = "one")]
    total_pages: u32,
}

fn one() -> u32 {
    1
}

/// Factory for creating Cloudflare providers
pub struct CloudflareFactory;

impl DnsProviderFactory for CloudflareFactory {
    fn create(&self, config: &DnsProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            DnsProviderConfig::Cloudflare {
                api_key,
                api_email,
                api_token,
                zone_id,
                dry_run,
                ..
            } => {
                let auth = match api_token {
                    Some(token) if !token.is_empty() => CloudflareAuth::Token(token.clone()),
                    _ => CloudflareAuth::GlobalKey {
                        key: api_key.clone(),
                        email: api_email.clone(),
                    },
                };

                // Check for dry-run mode environment variable
                let dry_run = *dry_run
                    || std::env::var(DNS_MODE_ENV)
                        .unwrap_or_default()
                        .eq_ignore_ascii_case("dry-run");

                if dry_run {
                    tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
                }

                Ok(Box::new(CloudflareProvider::new(auth, zone_id.clone(), dry_run)?))
            }
            _ => Err(Error::config("Invalid config for Cloudflare provider")),
        }
    }
}

/// Register the Cloudflare provider with a registry
///
/// # Example
///
/// ```rust
/// use instctl_core::ProviderRegistry;
///
/// let mut registry = ProviderRegistry::new();
/// instctl_provider_cloudflare::register(&mut registry);
/// assert!(registry.has_dns("cloudflare"));
/// ```
pub fn register(registry: &mut ProviderRegistry) {
    registry.register_dns("cloudflare", Box::new(CloudflareFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const OLD: Ipv4Addr = Ipv4Addr::new(198, 51, 100, 1);
    const NEW: Ipv4Addr = Ipv4Addr::new(198, 51, 100, 2);

    fn global_key() -> CloudflareAuth {
        CloudflareAuth::GlobalKey {
            key: "secret_key_12345".to_string(),
            email: "ops@example.com".to_string(),
        }
    }

    fn provider(server: &MockServer, dry_run: bool) -> CloudflareProvider {
        CloudflareProvider::new(global_key(), None, dry_run)
            .unwrap()
            .with_base_url(server.uri())
    }

    fn record(id: &str, name: &str, content: &str) -> Value {
        serde_json::json!({
            "id": id,
            "name": name,
            "type": "A",
            "content": content,
            "ttl": 300,
            "proxied": true
        })
    }

    fn dns_record(id: &str, name: &str) -> DnsRecord {
        DnsRecord {
            id: id.to_string(),
            name: name.to_string(),
            record_type: "A".to_string(),
            content: OLD.to_string(),
            ttl: 300,
            proxied: true,
        }
    }

    #[test]
    fn test_factory_creation() {
        let factory = CloudflareFactory;

        let config = DnsProviderConfig::Cloudflare {
            api_key: "key".to_string(),
            api_email: "ops@example.com".to_string(),
            api_token: None,
            domain: "example.com".to_string(),
            zone_id: Some("test_zone".to_string()),
            dry_run: false,
        };

        let provider = factory.create(&config).unwrap();
        assert_eq!(provider.provider_name(), "cloudflare");
    }

    #[test]
    fn test_factory_missing_credentials() {
        let config = DnsProviderConfig::Cloudflare {
            api_key: String::new(),
            api_email: String::new(),
            api_token: None,
            domain: "example.com".to_string(),
            zone_id: None,
            dry_run: false,
        };

        assert!(CloudflareFactory.create(&config).is_err());
    }

    #[test]
    fn test_factory_rejects_other_config() {
        let config = DnsProviderConfig::Custom {
            factory: "route53".to_string(),
            domain: "example.com".to_string(),
            config: serde_json::json!({}),
        };
        assert!(CloudflareFactory.create(&config).is_err());
    }

    #[test]
    fn test_credentials_not_exposed_in_debug() {
        let provider = CloudflareProvider::new(global_key(), None, false).unwrap();
        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("CloudflareProvider"));

        let token = CloudflareProvider::new(CloudflareAuth::Token("tok_987".into()), None, false).unwrap();
        assert!(!format!("{:?}", token).contains("tok_987"));
    }

    #[test]
    fn test_dry_run_mode() {
        let dry = CloudflareProvider::new(global_key(), None, true).unwrap();
        let live = CloudflareProvider::new(global_key(), None, false).unwrap();
        assert!(dry.is_dry_run());
        assert!(!live.is_dry_run());
    }

    #[tokio::test]
    async fn test_zone_id_preconfigured() {
        // No server: a request would fail
        let provider = CloudflareProvider::new(global_key(), Some("zone-cfg".to_string()), false)
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        assert_eq!(provider.zone_id("example.com").await.unwrap(), "zone-cfg");
    }

    #[tokio::test]
    async fn test_zone_lookup_sends_global_key_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones"))
            .and(query_param("name", "example.com"))
            .and(header("X-Auth-Key", "secret_key_12345"))
            .and(header("X-Auth-Email", "ops@example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "errors": [],
                "result": [{ "id": "zone-1", "name": "example.com" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let zone = provider(&server, false).zone_id("example.com").await.unwrap();
        assert_eq!(zone, "zone-1");
    }

    #[tokio::test]
    async fn test_token_auth_uses_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones"))
            .and(header("Authorization", "Bearer tok_987"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "result": [{ "id": "zone-9" }]
            })))
            .mount(&server)
            .await;

        let provider = CloudflareProvider::new(CloudflareAuth::Token("tok_987".into()), None, false)
            .unwrap()
            .with_base_url(server.uri());
        assert_eq!(provider.zone_id("example.com").await.unwrap(), "zone-9");
    }

    #[tokio::test]
    async fn test_unknown_zone_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "result": []
            })))
            .mount(&server)
            .await;

        let err = provider(&server, false).zone_id("missing.example").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_non_object_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!("ok")))
            .mount(&server)
            .await;

        let provider = provider(&server, false);

        let err = provider.zone_id("example.com").await.unwrap_err();
        assert!(matches!(err, Error::Api(_)));
        assert!(err.to_string().contains("Invalid response format"));

        let err = provider
            .update_a_record("zone-1", &dns_record("r1", "www.example.com"), NEW)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid response format"));
    }

    #[tokio::test]
    async fn test_auth_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = provider(&server, false).zone_id("example.com").await.unwrap_err();
        assert!(err.to_string().contains("Authentication failed"));
        assert!(!err.to_string().contains("secret_key_12345"));
    }

    #[tokio::test]
    async fn test_find_records_follows_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones/zone-1/dns_records"))
            .and(query_param("type", "A"))
            .and(query_param("content", "198.51.100.1"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "errors": [],
                "result": [record("r1", "www.example.com", "198.51.100.1")],
                "result_info": { "page": 1, "total_pages": 2 }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/zones/zone-1/dns_records"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "errors": [],
                "result": [record("r2", "api.example.com", "198.51.100.1")],
                "result_info": { "page": 2, "total_pages": 2 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let records = provider(&server, false).find_a_records("zone-1", OLD).await.unwrap();

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);
        assert!(records.iter().all(|r| r.proxied));
    }

    #[tokio::test]
    async fn test_listing_error_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones/zone-1/dns_records"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "errors": [{ "code": 1003, "message": "Invalid zone" }],
                "result": []
            })))
            .mount(&server)
            .await;

        let err = provider(&server, false).find_a_records("zone-1", OLD).await.unwrap_err();
        assert!(err.to_string().contains("Invalid zone"));
    }

    #[tokio::test]
    async fn test_update_patches_content_and_ttl() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/zones/zone-1/dns_records/r1"))
            .and(body_partial_json(serde_json::json!({
                "type": "A",
                "name": "www.example.com",
                "content": "198.51.100.2",
                "ttl": 1,
                "proxied": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "errors": [],
                "result": {
                    "id": "r1",
                    "name": "www.example.com",
                    "type": "A",
                    "content": "198.51.100.2",
                    "ttl": 1,
                    "proxied": true
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let updated = provider(&server, false)
            .update_a_record("zone-1", &dns_record("r1", "www.example.com"), NEW)
            .await
            .unwrap();

        assert_eq!(updated.content, "198.51.100.2");
        assert_eq!(updated.ttl, 1);
    }

    #[tokio::test]
    async fn test_dry_run_sends_no_update() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let updated = provider(&server, true)
            .update_a_record("zone-1", &dns_record("r1", "www.example.com"), NEW)
            .await
            .unwrap();

        assert_eq!(updated.content, "198.51.100.2");
        assert_eq!(updated.id, "r1");
    }

    #[tokio::test]
    async fn test_conflict_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/zones/zone-1/dns_records/r1"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let err = provider(&server, false)
            .update_a_record("zone-1", &dns_record("r1", "www.example.com"), NEW)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Conflict"));
    }
}
