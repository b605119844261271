//! Host eligibility and DNS name derivation
//!
//! Both functions here are pure: the same host and policy always give the
//! same answer, independent of any other host in the run.

use crate::traits::Host;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

/// Filter and naming policy for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    /// Tags a host must carry to be eligible
    pub required_tags: BTreeSet<String>,
    /// Suffix a raw host name must end with (empty = no constraint)
    pub required_suffix: String,
    /// Keep only the leftmost label of the raw name
    pub trim_suffix: bool,
    /// Managed suffix appended to every record name
    pub append_suffix: String,
    /// Delete managed records with no matching host
    pub prune: bool,
}

/// A record the run wants to exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredRecord {
    /// Final, lower-case DNS name
    pub name: String,
    /// Address of the source host
    pub address: Ipv4Addr,
}

/// Eligibility filter
///
/// A host is excluded when its name does not end with the required suffix
/// (case-sensitive) or when it lacks any required tag. An empty policy lets
/// every host through.
pub fn included(host: &Host, policy: &Policy) -> bool {
    if !policy.required_suffix.is_empty() && !host.name.ends_with(&policy.required_suffix) {
        return false;
    }

    policy.required_tags.iter().all(|tag| host.tags.contains(tag))
}

/// Hostname normalizer
///
/// No FQDN validation happens here; whatever the directory returns is
/// passed through.
pub fn normalize(host: &Host, policy: &Policy) -> String {
    let base = if policy.trim_suffix {
        first_label(&host.name)
    } else {
        host.name.as_str()
    };

    format!("{}.{}", base, policy.append_suffix).to_ascii_lowercase()
}

/// Map a host to the record it should have
pub fn desired_record(host: &Host, policy: &Policy) -> DesiredRecord {
    DesiredRecord {
        name: normalize(host, policy),
        address: host.address,
    }
}

fn first_label(name: &str) -> &str {
    match name.find('.') {
        Some(idx) => &name[..idx],
        None => name,
    }
}
