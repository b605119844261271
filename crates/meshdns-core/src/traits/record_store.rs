// # DNS Record Store Trait
//
// Defines the interface for reading the DNS records of one provider zone and
// writing address (A) records into it.
//
// ## Implementations
//
// - Cloudflare: `meshdns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use meshdns_core::{RecordSpec, RecordStore};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* RecordStore implementation */;
//
//     let zone_id = store.find_zone_id_by_name("example.com").await?;
//     let spec = RecordSpec::new("web1.example.com", [10, 0, 0, 1].into());
//
//     match store.list_records(&zone_id, Some(&spec.name)).await?.first() {
//         Some(existing) => store.update_record(&zone_id, &existing.id, &spec).await?,
//         None => {
//             store.create_record(&zone_id, &spec).await?;
//         }
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// TTL written on every managed record (1 = provider-managed "automatic")
pub const MANAGED_RECORD_TTL: u32 = 1;

/// A record of any type that already exists in the zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingRecord {
    /// Provider record identifier
    pub id: String,
    /// Fully qualified record name
    pub name: String,
}

impl ExistingRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Payload of a create or update call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSpec {
    /// Fully qualified record name
    pub name: String,
    /// Address the record points to
    pub address: Ipv4Addr,
    /// Time-to-live
    pub ttl: u32,
    /// Whether the provider proxies traffic for this record
    pub proxied: bool,
}

impl RecordSpec {
    /// Build the payload used for every managed record: short TTL, no proxying
    pub fn new(name: impl Into<String>, address: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            address,
            ttl: MANAGED_RECORD_TTL,
            proxied: false,
        }
    }
}

/// Trait for DNS record stores
///
/// # Trust Level: Untrusted
///
/// Record stores are thin API wrappers:
/// - One logical API operation per call (list calls may follow result pages)
/// - No retry or backoff (a failed run is simply re-run on the next tick)
/// - No caching between calls
/// - Never log credentials
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Find the zone identifier for an exact zone name
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The zone ID
    /// - `Err(Error::NotFound)`: No zone carries that name
    /// - `Err(Error::Upstream)`: Transport or API failure
    async fn find_zone_id_by_name(&self, zone_name: &str) -> Result<String, crate::Error>;

    /// Get the name of a zone from its identifier
    async fn zone_name(&self, zone_id: &str) -> Result<String, crate::Error>;

    /// List the records of a zone, whatever their type
    ///
    /// # Parameters
    ///
    /// - `zone_id`: The zone ID
    /// - `name`: Optional exact-name filter; `None` lists every record
    async fn list_records(
        &self,
        zone_id: &str,
        name: Option<&str>,
    ) -> Result<Vec<ExistingRecord>, crate::Error>;

    /// Create an address record, returning its identifier
    async fn create_record(&self, zone_id: &str, spec: &RecordSpec) -> Result<String, crate::Error>;

    /// Overwrite an existing record in place
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        spec: &RecordSpec,
    ) -> Result<(), crate::Error>;

    /// Delete a record
    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
