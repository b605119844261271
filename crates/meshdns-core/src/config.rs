//! Configuration types for meshdns
//!
//! Configuration is read from a TOML file, then provider tokens may be
//! overridden from the environment ([`CF_API_TOKEN_ENV`], [`DN_API_TOKEN_ENV`]).
//!
//! ```toml
//! required_tags = ["public-dns"]
//! required_suffix = ".internal"
//! trim_suffix = true
//! append_suffix = "example.com"
//! prune_records = true
//!
//! [cloudflare]
//! api_token = "..."
//! zone_name = "example.com"
//!
//! [defined]
//! api_token = "..."
//! ```

use crate::error::{Error, Result};
use crate::policy::Policy;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Environment variable overriding `cloudflare.api_token`
pub const CF_API_TOKEN_ENV: &str = "CF_API_TOKEN";

/// Environment variable overriding `defined.api_token`
pub const DN_API_TOKEN_ENV: &str = "DN_API_TOKEN";

/// Top-level configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Tags a host must carry to be eligible
    #[serde(default)]
    pub required_tags: Vec<String>,

    /// Suffix a raw host name must end with to be eligible
    #[serde(default)]
    pub required_suffix: String,

    /// Keep only the leftmost label of the host name
    #[serde(default)]
    pub trim_suffix: bool,

    /// Managed suffix; defaults to the zone name when unset
    #[serde(default)]
    pub append_suffix: Option<String>,

    /// Delete managed records that no eligible host maps to
    #[serde(default)]
    pub prune_records: bool,

    /// Cloudflare settings
    #[serde(default)]
    pub cloudflare: CloudflareConfig,

    /// Defined Networking settings
    #[serde(default)]
    pub defined: DefinedConfig,
}

/// Cloudflare settings
#[derive(Clone, Default, Deserialize)]
pub struct CloudflareConfig {
    /// API token with Zone:DNS:Edit permission
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub api_token: String,

    /// Zone to manage, resolved to an ID at runtime
    #[serde(default)]
    pub zone_name: Option<String>,

    /// Pre-resolved zone ID
    #[serde(default)]
    pub zone_id: Option<String>,
}

impl fmt::Debug for CloudflareConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudflareConfig")
            .field("api_token", &"<REDACTED>")
            .field("zone_name", &self.zone_name)
            .field("zone_id", &self.zone_id)
            .finish()
    }
}

/// Defined Networking settings
#[derive(Clone, Default, Deserialize)]
pub struct DefinedConfig {
    /// API token with hosts:list permission
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub api_token: String,

    /// API base URL override (defaults to the public endpoint)
    #[serde(default)]
    pub base_url: Option<String>,
}

impl fmt::Debug for DefinedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinedConfig")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// How the zone to manage is identified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneRef {
    /// Zone name, looked up once per run
    Name(String),
    /// Zone ID, used as-is
    Id(String),
}

/// Everything the reconciler needs from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileConfig {
    pub zone: ZoneRef,
    pub required_tags: BTreeSet<String>,
    pub required_suffix: String,
    pub trim_suffix: bool,
    pub append_suffix: Option<String>,
    pub prune: bool,
}

impl ReconcileConfig {
    /// Create a config for a named zone with an empty filter
    pub fn new(zone: ZoneRef) -> Self {
        Self {
            zone,
            required_tags: BTreeSet::new(),
            required_suffix: String::new(),
            trim_suffix: false,
            append_suffix: None,
            prune: false,
        }
    }

    /// Build the run policy, falling back to the zone name for the suffix
    pub fn policy(&self, zone_name: &str) -> Policy {
        Policy {
            required_tags: self.required_tags.clone(),
            required_suffix: self.required_suffix.clone(),
            trim_suffix: self.trim_suffix,
            append_suffix: self
                .append_suffix
                .clone()
                .unwrap_or_else(|| zone_name.to_string()),
            prune: self.prune,
        }
    }
}

impl AppConfig {
    /// Load, apply environment overrides and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut config = Self::from_toml_str(&contents)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        tracing::debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Parse configuration without validating it
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Replace tokens with non-empty values from `lookup`
    ///
    /// Production passes the process environment; tests pass a map.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(CF_API_TOKEN_ENV).filter(|t| !t.is_empty()) {
            self.cloudflare.api_token = token;
        }
        if let Some(token) = lookup(DN_API_TOKEN_ENV).filter(|t| !t.is_empty()) {
            self.defined.api_token = token;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.cloudflare.api_token.is_empty() {
            return Err(Error::config(format!(
                "Cloudflare API token is required (cloudflare.api_token or {})",
                CF_API_TOKEN_ENV
            )));
        }

        if self.defined.api_token.is_empty() {
            return Err(Error::config(format!(
                "Defined Networking API token is required (defined.api_token or {})",
                DN_API_TOKEN_ENV
            )));
        }

        self.zone()?;

        if self.append_suffix.as_deref() == Some("") {
            return Err(Error::config(
                "append_suffix cannot be empty; remove it to default to the zone name",
            ));
        }

        Ok(())
    }

    /// The configured zone selector
    pub fn zone(&self) -> Result<ZoneRef> {
        let name = self.cloudflare.zone_name.as_deref().filter(|n| !n.is_empty());
        let id = self.cloudflare.zone_id.as_deref().filter(|i| !i.is_empty());

        match (name, id) {
            (Some(name), None) => Ok(ZoneRef::Name(name.to_string())),
            (None, Some(id)) => Ok(ZoneRef::Id(id.to_string())),
            (Some(_), Some(_)) => Err(Error::config(
                "set only one of cloudflare.zone_name and cloudflare.zone_id",
            )),
            (None, None) => Err(Error::config(
                "one of cloudflare.zone_name or cloudflare.zone_id is required",
            )),
        }
    }

    /// Extract the reconciler settings
    pub fn reconcile_config(&self) -> Result<ReconcileConfig> {
        Ok(ReconcileConfig {
            zone: self.zone()?,
            required_tags: self.required_tags.iter().cloned().collect(),
            required_suffix: self.required_suffix.clone(),
            trim_suffix: self.trim_suffix,
            append_suffix: self.append_suffix.clone(),
            prune: self.prune_records,
        })
    }
}
