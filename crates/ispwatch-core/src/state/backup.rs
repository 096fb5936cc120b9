// # Backup Check Result
//
// Ordered mapping from backup URL to the address it reported during one
// fallback round. Insertion order is query order and keys are unique.
// Failing URLs contribute no entry.

use std::collections::HashSet;

use serde::Serialize;

use crate::address::Address;

/// One backup source and the address it returned
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupEntry {
    /// Source URL
    pub url: String,
    /// Extracted address
    pub address: Address,
}

/// Per-URL results of one backup round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BackupCheckResult {
    entries: Vec<BackupEntry>,
}

/// Decision derived from a complete backup round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consensus {
    /// No source returned anything
    Empty,
    /// Every responding source agreed on one address
    Agreed(Address),
    /// Responding sources disagree
    Ambiguous,
}

impl BackupCheckResult {
    /// Create an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the address for `url`, replacing an earlier entry in place
    pub fn insert(&mut self, url: impl Into<String>, address: Address) {
        let url = url.into();
        match self.entries.iter_mut().find(|entry| entry.url == url) {
            Some(entry) => entry.address = address,
            None => self.entries.push(BackupEntry { url, address }),
        }
    }

    /// Address recorded for `url`
    pub fn get(&self, url: &str) -> Option<&Address> {
        self.entries
            .iter()
            .find(|entry| entry.url == url)
            .map(|entry| &entry.address)
    }

    /// Entries in query order
    pub fn iter(&self) -> impl Iterator<Item = &BackupEntry> {
        self.entries.iter()
    }

    /// Number of responding sources
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no source responded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of distinct (case-insensitive) addresses
    pub fn distinct_count(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| entry.address.normalized_key())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Consensus over the recorded entries
    pub fn consensus(&self) -> Consensus {
        match (self.entries.first(), self.distinct_count()) {
            (None, _) => Consensus::Empty,
            (Some(first), 1) => Consensus::Agreed(first.address.clone()),
            _ => Consensus::Ambiguous,
        }
    }
}
