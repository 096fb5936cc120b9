// # Notifier Trait
//
// Defines the capability the check engine calls into whenever something
// worth reporting happens. One method per event; each receives semantic
// data only (addresses, counters, interval, backup results) and never
// formatting logic.
//
// ## Implementations
//
// - `ispwatch-notify` crate: renders messages and hands them to a
//   transport (structured log, JSON webhook)

use async_trait::async_trait;
use serde::Serialize;

use crate::address::Address;
use crate::error::FailureKind;
use crate::state::{BackupCheckResult, CounterSnapshot};

/// Facts attached to every address-related notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressReport {
    /// Address now considered current
    pub new_address: Address,
    /// Address that was current before
    pub old_address: Address,
    /// Counters at the time of the event
    pub counters: CounterSnapshot,
    /// Effective check interval in minutes
    pub interval_minutes: u64,
}

/// Change-independent status summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeartbeatSnapshot {
    /// Previous address
    pub old_address: Address,
    /// Current address
    pub current_address: Address,
    /// Last staged address
    pub new_address: Address,
    /// Counters at the time of the heartbeat
    pub counters: CounterSnapshot,
    /// Fresh results from every backup source
    pub backup_results: BackupCheckResult,
    /// Effective check interval in minutes
    pub interval_minutes: u64,
    /// Days until the next heartbeat
    pub heartbeat_interval_days: u64,
}

/// Trait for notification sinks
///
/// Implementations must be thread-safe; the engine calls them from
/// scheduler tasks. A returned error is logged by the engine and never
/// aborts a check cycle.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// First successful fetch after startup changed the address
    async fn configuration_succeeded(&self, report: &AddressReport) -> crate::Result<()>;

    /// The primary source reported a new address
    async fn connection_reestablished(&self, report: &AddressReport) -> crate::Result<()>;

    /// Backup sources agreed on an address while the primary was down
    async fn address_changed_via_backup(&self, report: &AddressReport) -> crate::Result<()>;

    /// Backup sources disagreed
    async fn multiple_addresses_returned(
        &self,
        results: &BackupCheckResult,
        report: &AddressReport,
    ) -> crate::Result<()>;

    /// No backup source returned anything
    async fn no_address_returned(&self, report: &AddressReport) -> crate::Result<()>;

    /// Check attempts and scheduled ticks have drifted apart
    async fn counters_out_of_sync(&self, counters: &CounterSnapshot) -> crate::Result<()>;

    /// The primary source failed at the request level
    async fn primary_http_failure(&self, kind: FailureKind, message: &str) -> crate::Result<()>;

    /// The primary fetch failed for a non-network reason
    async fn primary_other_failure(&self, kind: FailureKind, message: &str) -> crate::Result<()>;

    /// A backup source failed at the request level
    async fn backup_http_failure(
        &self,
        url: &str,
        kind: FailureKind,
        message: &str,
    ) -> crate::Result<()>;

    /// A backup fetch failed for a non-network reason
    async fn backup_other_failure(
        &self,
        url: &str,
        kind: FailureKind,
        message: &str,
    ) -> crate::Result<()>;

    /// Periodic status summary
    async fn heartbeat(&self, snapshot: &HeartbeatSnapshot) -> crate::Result<()>;

    /// Startup configuration was rejected
    ///
    /// Called by the daemon before it exits; the engine never calls it.
    async fn configuration_error(&self, message: &str) -> crate::Result<()> {
        tracing::debug!("configuration error not forwarded: {}", message);
        Ok(())
    }
}
