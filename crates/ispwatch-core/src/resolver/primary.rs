//! Primary address resolver

use std::sync::Arc;

use tracing::debug;

use crate::address::Address;
use crate::error::FetchError;
use crate::traits::AddressFetcher;

/// Issues one check against the primary address source
///
/// No retry: the schedule is the retry mechanism.
pub struct PrimaryResolver {
    fetcher: Arc<dyn AddressFetcher>,
    endpoint: String,
}

impl PrimaryResolver {
    /// Create a resolver for `endpoint`
    pub fn new(fetcher: Arc<dyn AddressFetcher>, endpoint: impl Into<String>) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.into(),
        }
    }

    /// The configured primary endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch the current address from the primary source
    ///
    /// The response body is the address (trimmed).
    pub async fn fetch(&self) -> Result<Address, FetchError> {
        debug!(
            "Querying primary source {} via {}",
            self.endpoint,
            self.fetcher.fetcher_name()
        );
        let body = self.fetcher.fetch(&self.endpoint).await?;
        Ok(Address::new(body))
    }
}
