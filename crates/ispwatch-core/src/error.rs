//! Error types for the ispwatch system
//!
//! [`Error`] covers configuration, notifier and scheduler failures.
//! Outcomes of a single address fetch are classified separately by
//! [`FetchError`], because only one of its variants may trigger the
//! backup path and callers must be able to match on it.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for ispwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the ispwatch system
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client errors outside of a fetch cycle
    #[error("HTTP error: {0}")]
    Http(String),

    /// A notifier could not deliver a message
    #[error("Notifier error: {0}")]
    Notifier(String),

    /// Scheduler lifecycle errors
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a notifier error
    pub fn notifier(msg: impl Into<String>) -> Self {
        Self::Notifier(msg.into())
    }

    /// Create a scheduler error
    pub fn scheduler(msg: impl Into<String>) -> Self {
        Self::Scheduler(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

/// What went wrong during a fetch, as a closed set of kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum FailureKind {
    /// The request did not complete within the configured timeout
    Timeout,
    /// Connection could not be established (refused, DNS, TLS)
    Connect,
    /// The source answered with a non-success status
    Status(u16),
    /// The response body could not be read
    Body,
    /// Malformed request (bad URL, redirect loop, builder error)
    Request,
    /// Anything else
    Unknown,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Connect => write!(f, "connect"),
            FailureKind::Status(code) => write!(f, "status {}", code),
            FailureKind::Body => write!(f, "body"),
            FailureKind::Request => write!(f, "request"),
            FailureKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classified outcome of a failed address fetch
///
/// Only [`FetchError::TemporarilyUnavailable`] sends a check cycle down
/// the backup path. The other two variants end the cycle and are reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The source reported "service unavailable"
    #[error("address source temporarily unavailable")]
    TemporarilyUnavailable,

    /// Request-level failure: status, timeout, DNS, connection
    #[error("HTTP failure ({kind}): {message}")]
    Http {
        /// Failure kind
        kind: FailureKind,
        /// Human readable detail
        message: String,
    },

    /// Non-network failure during the call
    #[error("unexpected failure ({kind}): {message}")]
    Other {
        /// Failure kind
        kind: FailureKind,
        /// Human readable detail
        message: String,
    },
}

impl FetchError {
    /// Create an HTTP-classified fetch error
    pub fn http(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Http {
            kind,
            message: message.into(),
        }
    }

    /// Create an other-classified fetch error
    pub fn other(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Other {
            kind,
            message: message.into(),
        }
    }

    /// Whether this failure should trigger the backup sources
    pub fn is_temporarily_unavailable(&self) -> bool {
        matches!(self, FetchError::TemporarilyUnavailable)
    }
}
