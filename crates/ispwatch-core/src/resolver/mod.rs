//! Address resolvers
//!
//! - [`PrimaryResolver`]: one request to the primary source per cycle
//! - [`BackupResolver`]: one request to each fallback source per round

pub mod backup;
pub mod primary;

pub use backup::{BackupFailure, BackupResolver};
pub use primary::PrimaryResolver;
