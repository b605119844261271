//! Reconciler
//!
//! One run walks these steps in order and stops at the first error:
//!
//! ```text
//! resolve zone ─▶ fetch hosts ─▶ filter + normalize ─▶ upsert ─▶ prune (optional)
//!      │               │                                  │          │
//!      ▼               ▼                                  ▼          ▼
//! RecordStore    HostDirectory                      RecordStore  RecordStore
//! ```
//!
//! ## Contract
//!
//! - Upsert is keyed by record name: no record → create, otherwise the first
//!   record with that name is overwritten. Further duplicates are left alone.
//! - Prune only ever touches records ending with the managed suffix that no
//!   eligible host maps to.
//! - Nothing is retried. Work already done before a failure stays done; the
//!   next run converges the rest.

pub mod report;

pub use report::{ReconcileEvent, ReconcileSummary, Reporter, TracingReporter};

use crate::config::{ReconcileConfig, ZoneRef};
use crate::error::{Error, Phase, Result};
use crate::policy::{self, DesiredRecord, Policy};
use crate::traits::{Host, HostDirectory, RecordSpec, RecordStore};
use std::collections::HashSet;
use tracing::debug;

/// Desired state derived from the directory
#[derive(Debug, Clone, Default)]
pub struct Plan {
    /// Eligible hosts with their records, in directory order
    pub upserts: Vec<(DesiredRecord, Host)>,
    /// Every desired record name
    pub desired_names: HashSet<String>,
    /// Hosts that failed the eligibility filter
    pub excluded: Vec<Host>,
}

/// Filter and normalize every host, keeping directory order
///
/// Two hosts mapping to the same name both stay in `upserts`; the later one
/// is applied last and wins.
pub fn plan(hosts: Vec<Host>, policy: &Policy) -> Plan {
    let mut plan = Plan::default();

    for host in hosts {
        if !policy::included(&host, policy) {
            plan.excluded.push(host);
            continue;
        }

        let record = policy::desired_record(&host, policy);
        plan.desired_names.insert(record.name.clone());
        plan.upserts.push((record, host));
    }

    plan
}

/// Read every directory page, following the cursor of each page
///
/// A page asking for a cursor that was already used ends the run with an
/// upstream error instead of looping.
pub async fn fetch_all_hosts(directory: &dyn HostDirectory) -> Result<Vec<Host>> {
    let mut hosts = Vec::new();
    let mut cursor = String::new();
    let mut used_cursors = HashSet::new();

    loop {
        used_cursors.insert(cursor.clone());

        let page = directory.list_hosts(&cursor).await?;
        debug!(
            "Fetched {} hosts from {} (has_next_page: {})",
            page.hosts.len(),
            directory.directory_name(),
            page.has_next_page
        );
        hosts.extend(page.hosts);

        if !page.has_next_page {
            return Ok(hosts);
        }

        if used_cursors.contains(&page.next_cursor) {
            return Err(Error::upstream(
                directory.directory_name(),
                format!(
                    "pagination cursor did not advance (cursor {:?} was already used)",
                    page.next_cursor
                ),
            ));
        }

        cursor = page.next_cursor;
    }
}

/// Core reconciler
///
/// Owns its collaborators for the duration of one run. Calling [`run`]
/// again performs a fresh run; nothing is cached between runs.
///
/// [`run`]: Reconciler::run
pub struct Reconciler {
    /// Source of hosts
    directory: Box<dyn HostDirectory>,

    /// DNS provider
    store: Box<dyn RecordStore>,

    /// Event sink
    reporter: Box<dyn Reporter>,

    /// Zone and policy settings
    config: ReconcileConfig,
}

impl Reconciler {
    /// Create a reconciler reporting through `tracing`
    pub fn new(
        directory: Box<dyn HostDirectory>,
        store: Box<dyn RecordStore>,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            directory,
            store,
            reporter: Box::new(TracingReporter),
            config,
        }
    }

    /// Replace the reporter
    pub fn with_reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Run one full reconciliation pass
    ///
    /// # Returns
    ///
    /// - `Ok(ReconcileSummary)`: Every eligible host has its record; stale
    ///   records are gone if pruning is enabled
    /// - `Err(Error)`: The first failure; earlier writes are kept
    pub async fn run(&self) -> Result<ReconcileSummary> {
        let (zone_id, policy) = self.resolve_zone().await?;

        self.reporter.report(&ReconcileEvent::PolicyApplied {
            required_suffix: policy.required_suffix.clone(),
            required_tags: policy.required_tags.iter().cloned().collect(),
            append_suffix: policy.append_suffix.clone(),
            prune: policy.prune,
        });

        let hosts = fetch_all_hosts(self.directory.as_ref()).await?;
        let hosts_seen = hosts.len();
        let plan = plan(hosts, &policy);

        for host in &plan.excluded {
            self.reporter.report(&ReconcileEvent::HostExcluded {
                host_id: host.id.clone(),
                host_name: host.name.clone(),
            });
        }

        let mut summary = ReconcileSummary {
            hosts_seen,
            eligible: plan.upserts.len(),
            ..ReconcileSummary::default()
        };

        self.reporter.report(&ReconcileEvent::HostsCollected {
            total: summary.hosts_seen,
            eligible: summary.eligible,
        });

        for (record, host) in &plan.upserts {
            self.upsert(&zone_id, record, host, &mut summary).await?;
        }

        if policy.prune {
            self.prune(&zone_id, &policy, &plan.desired_names, &mut summary)
                .await?;
        }

        self.reporter.report(&ReconcileEvent::Finished(summary));
        Ok(summary)
    }

    /// Resolve the zone ID and the effective policy
    ///
    /// The zone name is only fetched for an ID-configured zone when it is
    /// needed as the managed suffix.
    async fn resolve_zone(&self) -> Result<(String, Policy)> {
        let (zone_id, zone_name) = match &self.config.zone {
            ZoneRef::Name(name) => {
                let id = self.store.find_zone_id_by_name(name).await?;
                (id, Some(name.clone()))
            }
            ZoneRef::Id(id) if self.config.append_suffix.is_none() => {
                let name = self.store.zone_name(id).await?;
                (id.clone(), Some(name))
            }
            ZoneRef::Id(id) => (id.clone(), None),
        };

        self.reporter.report(&ReconcileEvent::ZoneResolved {
            zone_id: zone_id.clone(),
            zone_name: zone_name.clone(),
        });

        let policy = self.config.policy(zone_name.as_deref().unwrap_or_default());
        Ok((zone_id, policy))
    }

    async fn upsert(
        &self,
        zone_id: &str,
        record: &DesiredRecord,
        host: &Host,
        summary: &mut ReconcileSummary,
    ) -> Result<()> {
        let subject = format!(
            "host {} ({}) -> {} on {}",
            host.id,
            host.name,
            record.name,
            self.store.provider_name()
        );
        let fail = |e: Error| Error::reconcile(Phase::Upsert, subject.clone(), e);

        let spec = RecordSpec::new(record.name.clone(), record.address);
        let existing = self
            .store
            .list_records(zone_id, Some(&record.name))
            .await
            .map_err(fail)?;

        match existing.split_first() {
            None => {
                let record_id = self
                    .store
                    .create_record(zone_id, &spec)
                    .await
                    .map_err(fail)?;
                summary.created += 1;
                self.reporter.report(&ReconcileEvent::RecordCreated {
                    host_id: host.id.clone(),
                    name: record.name.clone(),
                    address: record.address,
                    record_id,
                });
            }
            Some((first, duplicates)) => {
                self.store
                    .update_record(zone_id, &first.id, &spec)
                    .await
                    .map_err(fail)?;
                summary.updated += 1;
                self.reporter.report(&ReconcileEvent::RecordUpdated {
                    host_id: host.id.clone(),
                    name: record.name.clone(),
                    address: record.address,
                    record_id: first.id.clone(),
                    ignored_duplicates: duplicates.len(),
                });
            }
        }

        Ok(())
    }

    async fn prune(
        &self,
        zone_id: &str,
        policy: &Policy,
        desired_names: &HashSet<String>,
        summary: &mut ReconcileSummary,
    ) -> Result<()> {
        self.reporter.report(&ReconcileEvent::PruneStarted {
            zone_id: zone_id.to_string(),
        });

        let existing = self
            .store
            .list_records(zone_id, None)
            .await
            .map_err(|e| {
                let subject = format!("{} zone {}", self.store.provider_name(), zone_id);
                Error::reconcile(Phase::Prune, subject, e)
            })?;

        for record in existing {
            if !record.name.ends_with(&policy.append_suffix) {
                continue;
            }
            if desired_names.contains(&record.name) {
                continue;
            }

            self.store
                .delete_record(zone_id, &record.id)
                .await
                .map_err(|e| {
                    Error::reconcile(
                        Phase::Prune,
                        format!(
                            "{} record {} ({})",
                            self.store.provider_name(),
                            record.id,
                            record.name
                        ),
                        e,
                    )
                })?;

            summary.pruned += 1;
            self.reporter.report(&ReconcileEvent::RecordPruned {
                record_id: record.id,
                name: record.name,
            });
        }

        Ok(())
    }
}
