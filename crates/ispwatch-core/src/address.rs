//! Network address value type
//!
//! An [`Address`] is whatever a source reported, normalized to a trimmed
//! string. Absence is the empty address, never `None`.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static IPV4_LITERAL_REGEX: OnceLock<Regex> = OnceLock::new();

fn ipv4_literal_regex() -> &'static Regex {
    IPV4_LITERAL_REGEX.get_or_init(|| {
        Regex::new(r"\d{1,3}(\.\d{1,3}){3}").expect("IPv4 literal regex is valid")
    })
}

/// An externally visible network address as reported by a source
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Create an address from a raw value, trimming surrounding whitespace
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().trim().to_string())
    }

    /// The empty address
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Extract an address from a free-form response body
    ///
    /// Returns the first IPv4 literal in the body. Bodies without one are
    /// kept as-is (trimmed), since fallback sources do not promise a bare IP.
    pub fn extract(body: &str) -> Self {
        match ipv4_literal_regex().find(body) {
            Some(found) => Self(found.as_str().to_string()),
            None => Self::new(body),
        }
    }

    /// Whether this is the empty address
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the address as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// ASCII case-insensitive equality
    pub fn matches(&self, other: &Address) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }

    /// Key used when counting distinct values
    pub(crate) fn normalized_key(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
