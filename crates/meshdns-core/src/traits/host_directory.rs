// # Host Directory Trait
//
// Defines the interface for listing mesh-network hosts, one page at a time.
//
// ## Implementations
//
// - Defined Networking (managed Nebula): `meshdns-directory-defined` crate
//
// ## Usage
//
// ```rust,ignore
// use meshdns_core::HostDirectory;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let directory = /* HostDirectory implementation */;
//
//     let mut cursor = String::new();
//     loop {
//         let page = directory.list_hosts(&cursor).await?;
//         for host in &page.hosts {
//             println!("{} -> {}", host.name, host.address);
//         }
//         if !page.has_next_page {
//             break;
//         }
//         cursor = page.next_cursor;
//     }
//
//     Ok(())
// }
// ```
//
// The reconciler never drives this loop itself; it goes through
// `reconciler::fetch_all_hosts`, which also guards against a cursor that
// stops advancing.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

/// Maximum number of hosts requested per directory page
pub const MAX_PAGE_SIZE: usize = 500;

/// A host as listed by the mesh-network directory
///
/// Read-only for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    /// Opaque directory identifier
    pub id: String,
    /// Overlay address of the host
    pub address: Ipv4Addr,
    /// Raw host name (not guaranteed to be a valid FQDN)
    pub name: String,
    /// Tags attached to the host
    pub tags: BTreeSet<String>,
}

impl Host {
    /// Create a host without tags
    pub fn new(id: impl Into<String>, name: impl Into<String>, address: Ipv4Addr) -> Self {
        Self {
            id: id.into(),
            address,
            name: name.into(),
            tags: BTreeSet::new(),
        }
    }

    /// Attach tags to the host
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }
}

/// One page of the host listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostPage {
    /// Hosts on this page, in directory order
    pub hosts: Vec<Host>,
    /// Whether another page follows
    pub has_next_page: bool,
    /// Cursor to pass to the next `list_hosts` call
    pub next_cursor: String,
}

/// Trait for mesh-network host directories
///
/// Implementations perform exactly one request per call: no retries, no
/// caching between calls, no background tasks.
#[async_trait]
pub trait HostDirectory: Send + Sync {
    /// Fetch one page of hosts
    ///
    /// # Parameters
    ///
    /// - `cursor`: Cursor returned by the previous page; empty for the first page
    ///
    /// # Returns
    ///
    /// - `Ok(HostPage)`: The page, at most [`MAX_PAGE_SIZE`] hosts
    /// - `Err(Error::Upstream)`: Non-success status, transport or decode failure
    async fn list_hosts(&self, cursor: &str) -> Result<HostPage, crate::Error>;

    /// Get the directory name (for logging/debugging)
    fn directory_name(&self) -> &'static str;
}
