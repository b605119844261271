//! Error types for meshdns
//!
//! Every error aborts the current run. Nothing is retried or swallowed
//! inside the core; the next scheduled run converges whatever is left.

use std::fmt;
use thiserror::Error;

/// Result type alias for meshdns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Phase of a run in which a per-record operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Create-or-update of a desired record
    Upsert,
    /// Deletion of a stale managed record
    Prune,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Upsert => f.write_str("upsert"),
            Phase::Prune => f.write_str("prune"),
        }
    }
}

/// Core error type for meshdns
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed configuration or credentials
    #[error("Configuration error: {0}")]
    Config(String),

    /// Zone lookup miss
    #[error("Not found: {0}")]
    NotFound(String),

    /// Non-success status, transport failure or undecodable response
    #[error("Upstream error ({service}): {message}")]
    Upstream {
        /// Upstream service name ("cloudflare", "defined")
        service: String,
        /// Error message
        message: String,
    },

    /// Failure while creating, updating or deleting one record
    #[error("{phase} failed for {subject}")]
    Reconcile {
        /// Phase the failure happened in
        phase: Phase,
        /// Host and/or record the operation was acting on
        subject: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an upstream error
    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Wrap an error with the record it was raised for
    pub fn reconcile(phase: Phase, subject: impl Into<String>, source: Error) -> Self {
        Self::Reconcile {
            phase,
            subject: subject.into(),
            source: Box::new(source),
        }
    }

    /// True for configuration errors (used for exit-code mapping)
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid TOML: {}", err))
    }
}
