//! Backup address resolver
//!
//! Queries every fallback source in configured order and records one entry
//! per responding source. A failing source is skipped from the result map
//! and returned as a [`BackupFailure`]; it never stops the remaining
//! sources from being queried.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::address::Address;
use crate::error::FetchError;
use crate::state::BackupCheckResult;
use crate::traits::AddressFetcher;

/// A backup source that did not respond usefully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFailure {
    /// Source URL
    pub url: String,
    /// Classified failure
    pub error: FetchError,
}

/// Queries the ordered list of fallback sources
pub struct BackupResolver {
    fetcher: Arc<dyn AddressFetcher>,
    urls: Vec<String>,
}

impl BackupResolver {
    /// Create a resolver over `urls`, queried in the given order
    pub fn new(fetcher: Arc<dyn AddressFetcher>, urls: Vec<String>) -> Self {
        Self { fetcher, urls }
    }

    /// The configured backup sources
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Query every source and repopulate `results`
    ///
    /// `results` is cleared before the first request, so it never mixes
    /// entries from two rounds. Returns the sources that failed.
    pub async fn resolve_all(&self, results: &mut BackupCheckResult) -> Vec<BackupFailure> {
        results.clear();
        let mut failures = Vec::new();

        for url in &self.urls {
            match self.fetcher.fetch(url).await {
                Ok(body) => {
                    let address = Address::extract(&body);
                    debug!("Backup source {} returned {}", url, address);
                    results.insert(url.clone(), address);
                }
                Err(error) => {
                    warn!("Backup source {} failed: {}", url, error);
                    failures.push(BackupFailure {
                        url: url.clone(),
                        error,
                    });
                }
            }
        }

        debug!(
            "Backup round finished: {} responded, {} failed",
            results.len(),
            failures.len()
        );

        failures
    }
}
