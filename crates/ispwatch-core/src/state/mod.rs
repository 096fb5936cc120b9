// # Engine State
//
// In-memory state owned by the check engine and shared counters.
// Nothing here persists across restarts.

pub mod address;
pub mod backup;
pub mod counters;

pub use address::AddressState;
pub use backup::{BackupCheckResult, BackupEntry, Consensus};
pub use counters::{CounterSnapshot, CounterStore};
