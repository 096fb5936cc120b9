//! Core traits for the ispwatch system
//!
//! - [`AddressFetcher`]: issue one request to an address source
//! - [`Notifier`]: receive every event the engine reports

pub mod address_fetcher;
pub mod notifier;

pub use address_fetcher::AddressFetcher;
pub use notifier::{AddressReport, HeartbeatSnapshot, Notifier};
