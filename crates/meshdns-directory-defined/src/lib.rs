// # Defined Networking Host Directory
//
// This crate provides the `HostDirectory` implementation for Defined
// Networking's managed Nebula API.
//
// ## Architecture
//
// One `list_hosts` call is one `GET /v1/hosts` request. Paging, cursor
// bookkeeping and termination are handled by the reconciler, never here.
//
// ## API Reference
//
// ```http
// GET /v1/hosts?cursor=<cursor>&pageSize=500
// Accept: application/json
// Authorization: Bearer <token>
// ```
//
// ```json
// {
//   "data": [{"id": "host-1", "ipAddress": "10.0.0.1", "name": "web1", "tags": ["public-dns"]}],
//   "metadata": {"hasNextPage": false, "cursor": ""}
// }
// ```

use async_trait::async_trait;
use meshdns_core::traits::{Host, HostDirectory, HostPage, MAX_PAGE_SIZE};
use meshdns_core::{Error, Result};
use serde::Deserialize;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Defined Networking API base URL
pub const DEFINED_API_BASE: &str = "https://api.defined.net";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const DIRECTORY: &str = "defined";

#[derive(Debug, Deserialize)]
struct HostsResponse {
    #[serde(default)]
    data: Vec<WireHost>,
    metadata: PageMetadata,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageMetadata {
    #[serde(default)]
    has_next_page: bool,
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireHost {
    id: String,
    ip_address: Ipv4Addr,
    name: String,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

impl From<WireHost> for Host {
    fn from(wire: WireHost) -> Self {
        Host::new(wire.id, wire.name, wire.ip_address).with_tags(wire.tags.unwrap_or_default())
    }
}

/// Defined Networking host directory
pub struct DefinedHostDirectory {
    /// API token with hosts:list permission
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl std::fmt::Debug for DefinedHostDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefinedHostDirectory")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl DefinedHostDirectory {
    /// Create a new directory client against the public API
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token is empty or the HTTP client cannot be built.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Defined Networking API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            base_url: DEFINED_API_BASE.to_string(),
            client,
        })
    }

    /// Point the client at another API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl HostDirectory for DefinedHostDirectory {
    async fn list_hosts(&self, cursor: &str) -> Result<HostPage> {
        let url = format!("{}/v1/hosts", self.base_url);
        let page_size = MAX_PAGE_SIZE.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("cursor", cursor), ("pageSize", page_size.as_str())])
            .header("Accept", "application/json")
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::upstream(DIRECTORY, format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::upstream(DIRECTORY, format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::upstream(
                DIRECTORY,
                format!("unexpected status code: {}, body: {}", status.as_u16(), body),
            ));
        }

        let decoded: HostsResponse = serde_json::from_str(&body)
            .map_err(|e| Error::upstream(DIRECTORY, format!("Failed to decode hosts: {}", e)))?;

        tracing::debug!(
            "Fetched {} hosts (has_next_page: {})",
            decoded.data.len(),
            decoded.metadata.has_next_page
        );

        Ok(HostPage {
            hosts: decoded.data.into_iter().map(Host::from).collect(),
            has_next_page: decoded.metadata.has_next_page,
            next_cursor: decoded.metadata.cursor.unwrap_or_default(),
        })
    }

    fn directory_name(&self) -> &'static str {
        DIRECTORY
    }
}
