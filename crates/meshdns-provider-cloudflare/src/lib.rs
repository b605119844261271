// # Cloudflare Record Store
//
// This crate provides the Cloudflare implementation of `RecordStore`.
//
// ## Scope
//
// - ✅ Zone lookup by name and by ID
// - ✅ Record listing of every type (all result pages)
// - ✅ A-record create, update, delete
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Status-code and `success: false` envelope mapping to `Error::Upstream`
// - ✅ Dry-run mode for safe testing
// - ❌ NO retry logic (a failed run is re-run on the next schedule tick)
// - ❌ NO caching (every call reflects the provider's state at call time)
// - ❌ NO writes of record types other than A
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Construction fails if the token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - Zone Details: GET `/zones/:zone_id`
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&page=...`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
// - Delete DNS Record: DELETE `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use meshdns_core::traits::{ExistingRecord, RecordSpec, RecordStore};
use meshdns_core::{Error, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Records requested per listing page
const RECORDS_PER_PAGE: u32 = 100;

/// Record ID returned by `create_record` in dry-run mode
pub const DRY_RUN_RECORD_ID: &str = "dry-run";

const PROVIDER: &str = "cloudflare";

/// Cloudflare response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct DnsRecord {
    id: String,
    name: String,
}

impl<T> Envelope<T> {
    fn into_result(self, action: &str) -> Result<T> {
        self.result.ok_or_else(|| {
            Error::upstream(PROVIDER, format!("{}: response has no result", action))
        })
    }
}

/// Cloudflare DNS record store
///
/// Stateless: every call is one API operation against the live zone.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the store will:
/// - Perform all GET requests (zone lookup, record listing)
/// - Log the intended POST/PUT/DELETE
/// - **NOT** modify DNS records
pub struct CloudflareRecordStore {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL (overridable for tests)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip writes
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareRecordStore")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareRecordStore {
    /// Create a new Cloudflare record store in live mode
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token is empty or the HTTP client cannot be built.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run: false,
        })
    }

    /// Point the store at another API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, zone_id)
    }

    fn record_url(&self, zone_id: &str, record_id: &str) -> String {
        format!("{}/zones/{}/dns_records/{}", self.base_url, zone_id, record_id)
    }

    /// Send an authenticated request and decode the envelope
    ///
    /// Non-success statuses, undecodable bodies and `success: false`
    /// envelopes all become `Error::Upstream`.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        action: &str,
    ) -> Result<Envelope<T>> {
        let response = request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| {
                Error::upstream(PROVIDER, format!("{}: HTTP request failed: {}", action, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, action, &error_text));
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            Error::upstream(PROVIDER, format!("{}: failed to parse response: {}", action, e))
        })?;

        if !envelope.success {
            let messages: Vec<String> = envelope
                .errors
                .iter()
                .map(|m| format!("{} ({})", m.message, m.code))
                .collect();
            return Err(Error::upstream(
                PROVIDER,
                format!("{}: API reported failure: {}", action, messages.join("; ")),
            ));
        }

        Ok(envelope)
    }
}

/// Map a non-success HTTP status to an upstream error
fn status_error(status: StatusCode, action: &str, error_text: &str) -> Error {
    let message = match status.as_u16() {
        401 | 403 => format!(
            "{}: Authentication failed: Invalid API token or insufficient permissions. Status: {}",
            action, status
        ),
        409 => format!(
            "{}: Conflict: Record is being changed by another process. Status: {}",
            action, status
        ),
        429 => format!(
            "{}: Rate limit exceeded. Please retry later. Status: {}",
            action, status
        ),
        500..=599 => format!(
            "{}: Cloudflare server error (transient): {} - {}",
            action, status, error_text
        ),
        _ => format!("{}: {} - {}", action, status, error_text),
    };
    Error::upstream(PROVIDER, message)
}

/// Request body for create and update
fn record_payload(spec: &RecordSpec) -> Value {
    serde_json::json!({
        "type": "A",
        "name": spec.name,
        "content": spec.address.to_string(),
        "ttl": spec.ttl,
        "proxied": spec.proxied,
    })
}

#[async_trait]
impl RecordStore for CloudflareRecordStore {
    /// Find a zone ID by exact name
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones?name=example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn find_zone_id_by_name(&self, zone_name: &str) -> Result<String> {
        tracing::debug!("Looking up zone ID for {}", zone_name);

        let request = self
            .client
            .get(format!("{}/zones", self.base_url))
            .query(&[("name", zone_name)]);
        let zones: Vec<Zone> = self.send(request, "zone lookup").await?.into_result("zone lookup")?;

        let zone = zones
            .into_iter()
            .find(|z| z.name == zone_name)
            .ok_or_else(|| Error::not_found(format!("zone {} not found", zone_name)))?;

        tracing::debug!("Found zone ID: {}", zone.id);
        Ok(zone.id)
    }

    async fn zone_name(&self, zone_id: &str) -> Result<String> {
        let request = self.client.get(format!("{}/zones/{}", self.base_url, zone_id));
        let zone: Zone = self
            .send(request, "zone details")
            .await?
            .into_result("zone details")?;
        Ok(zone.name)
    }

    /// List DNS records of any type, following every result page
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?per_page=100&page=1[&name=web1.example.com]
    /// ```
    async fn list_records(&self, zone_id: &str, name: Option<&str>) -> Result<Vec<ExistingRecord>> {
        let mut records = Vec::new();
        let mut page: u32 = 1;

        loop {
            let mut query = vec![
                ("per_page", RECORDS_PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            if let Some(name) = name {
                query.push(("name", name.to_string()));
            }

            let request = self.client.get(self.records_url(zone_id)).query(&query);
            let envelope: Envelope<Vec<DnsRecord>> = self.send(request, "record listing").await?;
            let info = envelope.result_info.as_ref().map(|i| (i.page.max(page), i.total_pages));
            let batch = envelope.into_result("record listing")?;

            let fetched = batch.len();
            records.extend(batch.into_iter().map(|r| ExistingRecord::new(r.id, r.name)));

            match info {
                Some((current, total)) if fetched > 0 && current < total => page = current + 1,
                _ => break,
            }
        }

        tracing::debug!("Listed {} DNS records in zone {}", records.len(), zone_id);
        Ok(records)
    }

    /// Create an A record
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /zones/:zone_id/dns_records
    /// {"type": "A", "name": "...", "content": "10.0.0.1", "ttl": 1, "proxied": false}
    /// ```
    async fn create_record(&self, zone_id: &str, spec: &RecordSpec) -> Result<String> {
        let payload = record_payload(spec);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send POST request to {} with payload: {}",
                self.records_url(zone_id),
                payload
            );
            return Ok(DRY_RUN_RECORD_ID.to_string());
        }

        let request = self.client.post(self.records_url(zone_id)).json(&payload);
        let created: DnsRecord = self
            .send(request, "record create")
            .await?
            .into_result("record create")?;

        tracing::debug!("Created DNS record {} ({})", created.name, created.id);
        Ok(created.id)
    }

    async fn update_record(&self, zone_id: &str, record_id: &str, spec: &RecordSpec) -> Result<()> {
        let url = self.record_url(zone_id, record_id);
        let payload = record_payload(spec);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                payload
            );
            return Ok(());
        }

        let request = self.client.put(&url).json(&payload);
        self.send::<Value>(request, "record update").await?;
        Ok(())
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        let url = self.record_url(zone_id, record_id);

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send DELETE request to {}", url);
            return Ok(());
        }

        let request = self.client.delete(&url);
        self.send::<Value>(request, "record delete").await?;
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
