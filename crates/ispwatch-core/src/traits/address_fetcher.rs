// # Address Fetcher Trait
//
// Defines the interface for issuing one outbound request to an
// address-reporting source.
//
// ## Implementations
//
// - HTTP (reqwest): `ispwatch-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ispwatch_core::AddressFetcher;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let fetcher = /* AddressFetcher implementation */;
//
//     match fetcher.fetch("https://api.ipify.org").await {
//         Ok(body) => println!("source said: {}", body),
//         Err(e) => println!("source failed: {}", e),
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::error::FetchError;

/// Trait for address source transports
///
/// A fetcher performs exactly one request per call and classifies the
/// outcome. It does not parse addresses and does not retry: the resolvers
/// decide what a body means and the schedule decides when to try again.
///
/// # Classification
///
/// - 2xx → `Ok(body)`
/// - "service unavailable" → [`FetchError::TemporarilyUnavailable`]
/// - any other status, timeout, DNS or connection failure → [`FetchError::Http`]
/// - anything else → [`FetchError::Other`]
///
/// A non-2xx status must never be returned as an empty `Ok` body.
#[async_trait]
pub trait AddressFetcher: Send + Sync {
    /// Issue a single GET to `url` and return the raw response body
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;

    /// Name of the transport (for logging)
    fn fetcher_name(&self) -> &'static str;
}
