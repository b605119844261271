// # meshdns-core
//
// Core library for syncing mesh-network hosts into DNS address records.
//
// ## Architecture Overview
//
// - **HostDirectory**: Trait for listing mesh-network hosts, page by page
// - **RecordStore**: Trait for listing zone records and creating/updating/deleting A records
// - **policy**: Pure eligibility filter and hostname normalizer
// - **Reconciler**: One stateless pass: resolve zone → fetch → filter →
//   upsert → prune
// - **Reporter**: Injected sink for run events (tracing by default)
//
// ## Design Principles
//
// 1. **Stateless**: Every run reads the provider fresh; no cache, no state file
// 2. **Idempotent**: Upsert by name and suffix-scoped prune converge on re-run
// 3. **Fail-fast**: The first error ends the run; the next scheduled run retries
// 4. **Library-First**: The binary only wires config, clients and logging

pub mod config;
pub mod error;
pub mod policy;
pub mod reconciler;
pub mod traits;

// Re-export core types for convenience
pub use config::{AppConfig, ReconcileConfig, ZoneRef};
pub use error::{Error, Phase, Result};
pub use policy::{DesiredRecord, Policy};
pub use reconciler::{ReconcileEvent, ReconcileSummary, Reconciler, Reporter, TracingReporter};
pub use traits::{ExistingRecord, Host, HostDirectory, HostPage, RecordSpec, RecordStore};
