//! Run reporting
//!
//! The reconciler never logs on its own; it hands every notable step to a
//! [`Reporter`]. [`TracingReporter`] is the production implementation.

use std::net::Ipv4Addr;
use tracing::{debug, info, warn};

/// Counters for one completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Hosts returned by the directory
    pub hosts_seen: usize,
    /// Hosts that passed the eligibility filter
    pub eligible: usize,
    /// Records created
    pub created: usize,
    /// Records updated in place
    pub updated: usize,
    /// Stale records deleted
    pub pruned: usize,
}

/// Events emitted during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// Zone identifier is known
    ZoneResolved {
        zone_id: String,
        zone_name: Option<String>,
    },

    /// Policy in effect for this run
    PolicyApplied {
        required_suffix: String,
        required_tags: Vec<String>,
        append_suffix: String,
        prune: bool,
    },

    /// Host did not pass the eligibility filter
    HostExcluded { host_id: String, host_name: String },

    /// Directory fully read and filtered
    HostsCollected { total: usize, eligible: usize },

    /// No record carried the name; one was created
    RecordCreated {
        host_id: String,
        name: String,
        address: Ipv4Addr,
        record_id: String,
    },

    /// First record with the name was overwritten
    RecordUpdated {
        host_id: String,
        name: String,
        address: Ipv4Addr,
        record_id: String,
        /// Further records with the same name, left untouched
        ignored_duplicates: usize,
    },

    /// Prune phase started
    PruneStarted { zone_id: String },

    /// Stale managed record deleted
    RecordPruned { record_id: String, name: String },

    /// Run completed
    Finished(ReconcileSummary),
}

/// Sink for run events
pub trait Reporter: Send + Sync {
    fn report(&self, event: &ReconcileEvent);
}

/// Reporter writing each event as one `tracing` line
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &ReconcileEvent) {
        match event {
            ReconcileEvent::ZoneResolved { zone_id, zone_name } => {
                info!(zone_id = %zone_id, zone_name = ?zone_name, "Resolved Cloudflare zone");
            }
            ReconcileEvent::PolicyApplied {
                required_suffix,
                required_tags,
                append_suffix,
                prune,
            } => {
                info!(
                    required_suffix = %required_suffix,
                    required_tags = %required_tags.join(","),
                    append_suffix = %append_suffix,
                    prune,
                    "Collecting eligible hosts"
                );
            }
            ReconcileEvent::HostExcluded { host_id, host_name } => {
                debug!(host_id = %host_id, host_name = %host_name, "Host not eligible");
            }
            ReconcileEvent::HostsCollected { total, eligible } => {
                info!(total, eligible, "Found {} eligible hosts", eligible);
            }
            ReconcileEvent::RecordCreated {
                host_id,
                name,
                address,
                record_id,
            } => {
                info!(host_id = %host_id, record_id = %record_id, address = %address, "Created DNS record {}", name);
            }
            ReconcileEvent::RecordUpdated {
                host_id,
                name,
                address,
                record_id,
                ignored_duplicates,
            } => {
                info!(host_id = %host_id, record_id = %record_id, address = %address, "Updated DNS record {}", name);
                if *ignored_duplicates > 0 {
                    warn!(
                        ignored_duplicates,
                        "DNS record {} has duplicates that were left untouched", name
                    );
                }
            }
            ReconcileEvent::PruneStarted { zone_id } => {
                info!(zone_id = %zone_id, "Pruning DNS records");
            }
            ReconcileEvent::RecordPruned { record_id, name } => {
                info!(record_id = %record_id, "Pruned stale DNS record {}", name);
            }
            ReconcileEvent::Finished(summary) => {
                info!(
                    hosts_seen = summary.hosts_seen,
                    eligible = summary.eligible,
                    created = summary.created,
                    updated = summary.updated,
                    pruned = summary.pruned,
                    "Reconciliation finished"
                );
            }
        }
    }
}
