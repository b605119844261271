//! Core traits for meshdns
//!
//! The reconciler only talks to the outside world through these interfaces.
//!
//! - [`HostDirectory`]: List mesh-network hosts, page by page
//! - [`RecordStore`]: Read and write address records in a DNS zone

pub mod host_directory;
pub mod record_store;

pub use host_directory::{Host, HostDirectory, HostPage, MAX_PAGE_SIZE};
pub use record_store::{ExistingRecord, MANAGED_RECORD_TTL, RecordSpec, RecordStore};
