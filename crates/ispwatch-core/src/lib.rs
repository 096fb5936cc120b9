// # ispwatch-core
//
// Core library for detecting external address changes.
//
// ## Architecture Overview
//
// - **AddressFetcher**: Trait for issuing one GET against an address source
// - **Notifier**: Trait for reporting detected events
// - **CheckEngine**: Runs check and heartbeat cycles over the address state
// - **Scheduler**: Drives the engine from check, tick and heartbeat timers
// - **CounterStore**: Shared activity counters
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Decisions live here, transports live in
//    the `ispwatch-http` and `ispwatch-notify` crates
// 2. **Serialized Cycles**: One cycle at a time mutates the address state
// 3. **Schedule Is The Retry**: A failed cycle is simply retried next tick
// 4. **Library-First**: The daemon is a thin wiring layer over this crate

pub mod address;
pub mod config;
pub mod engine;
pub mod error;
pub mod resolver;
pub mod scheduler;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use address::Address;
pub use config::{HttpConfig, MonitorConfig, ScheduleConfig};
pub use engine::{CheckEngine, CheckOutcome};
pub use error::{Error, FailureKind, FetchError, Result};
pub use scheduler::{Scheduler, SchedulerHandle, next_heartbeat};
pub use state::{AddressState, BackupCheckResult, BackupEntry, Consensus, CounterSnapshot, CounterStore};
pub use traits::{AddressFetcher, AddressReport, HeartbeatSnapshot, Notifier};
