//! Core check engine
//!
//! The CheckEngine is responsible for:
//! - Running one check cycle against the primary source
//! - Falling back to the backup sources when the primary is unavailable
//! - Moving the address state and counters
//! - Deciding which notification fires
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────┐
//!  Scheduler ───▶ │ CheckEngine  │
//!                 └──────────────┘
//!                        │
//!      ┌─────────────────┼──────────────────┬─────────────────┐
//!      │                 │                  │                 │
//!      ▼                 ▼                  ▼                 ▼
//! ┌──────────┐    ┌──────────────┐   ┌──────────────┐  ┌────────────┐
//! │ Primary  │    │   Backup     │   │ AddressState │  │  Notifier  │
//! │ Resolver │    │   Resolver   │   │ + Counters   │  │  (report)  │
//! └──────────┘    └──────────────┘   └──────────────┘  └────────────┘
//! ```
//!
//! ## Check Cycle
//!
//! 1. Count the request
//! 2. Fetch from the primary source
//!    - request-level or unexpected failure: report, end the cycle
//!    - temporarily unavailable: count it, run a backup round, end the cycle
//! 3. Report drift between request and tick counters (non-blocking)
//! 4. Compare against the current address; on change, transition and report
//!    either the initial configuration success or a re-established connection
//!
//! Cycles are serialized: the address state lives behind one async mutex held
//! for the whole cycle, so overlapping timer fires queue up instead of
//! interleaving.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::address::Address;
use crate::config::{MonitorConfig, ScheduleConfig};
use crate::error::{FetchError, Result};
use crate::resolver::{BackupFailure, BackupResolver, PrimaryResolver};
use crate::state::{AddressState, BackupCheckResult, Consensus, CounterStore};
use crate::traits::{AddressFetcher, AddressReport, HeartbeatSnapshot, Notifier};

/// What a check cycle ended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Primary answered with the address already current
    Unchanged(Address),
    /// First successful fetch after startup changed the address
    ConfigurationSucceeded(Address),
    /// Primary answered with a new address
    ConnectionReestablished(Address),
    /// Primary unavailable, backup sources agreed
    BackupAgreed(Address),
    /// Primary unavailable, backup sources disagreed
    BackupAmbiguous(BackupCheckResult),
    /// Primary unavailable, no backup source answered
    BackupEmpty,
    /// Primary failed in a way that ends the cycle
    PrimaryFailed(FetchError),
}

impl CheckOutcome {
    /// Whether this cycle moved the current address
    pub fn changed_address(&self) -> bool {
        matches!(
            self,
            CheckOutcome::ConfigurationSucceeded(_)
                | CheckOutcome::ConnectionReestablished(_)
                | CheckOutcome::BackupAgreed(_)
        )
    }
}

/// State guarded for the duration of a cycle
#[derive(Debug, Default)]
struct CycleState {
    addresses: AddressState,
    backup_results: BackupCheckResult,
}

/// Core check engine
///
/// The engine owns the address state and the backup snapshot. Counters are
/// shared with the scheduler and the passive endpoint through
/// [`CounterStore`].
///
/// ## Lifecycle
///
/// 1. Create with [`CheckEngine::new()`]
/// 2. Hand an `Arc<CheckEngine>` to the [`Scheduler`](crate::Scheduler)
/// 3. Or drive [`run_check()`](CheckEngine::run_check) /
///    [`run_heartbeat()`](CheckEngine::run_heartbeat) directly
///
/// ## Failure Policy
///
/// No cycle ever returns an error. Source failures are reported through the
/// notifier and logged; notifier failures are logged. The next scheduled
/// tick is the retry.
pub struct CheckEngine {
    /// Primary source
    primary: PrimaryResolver,

    /// Fallback sources
    backup: BackupResolver,

    /// Where events are reported
    notifier: Arc<dyn Notifier>,

    /// Shared counters
    counters: Arc<CounterStore>,

    /// Timer settings (interval and heartbeat period are reported)
    schedule: ScheduleConfig,

    /// Address state and backup snapshot, locked per cycle
    cycle: Mutex<CycleState>,
}

impl CheckEngine {
    /// Create a new check engine
    ///
    /// # Parameters
    ///
    /// - `fetcher`: transport used by both resolvers
    /// - `notifier`: event sink
    /// - `counters`: shared counters
    /// - `config`: monitor configuration (validated here)
    pub fn new(
        fetcher: Arc<dyn AddressFetcher>,
        notifier: Arc<dyn Notifier>,
        counters: Arc<CounterStore>,
        config: MonitorConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            primary: PrimaryResolver::new(Arc::clone(&fetcher), config.primary_endpoint),
            backup: BackupResolver::new(fetcher, config.backup_endpoints),
            notifier,
            counters,
            schedule: config.schedule,
            cycle: Mutex::new(CycleState::default()),
        })
    }

    /// Shared counters
    pub fn counters(&self) -> &Arc<CounterStore> {
        &self.counters
    }

    /// Timer settings
    pub fn schedule(&self) -> &ScheduleConfig {
        &self.schedule
    }

    /// Copy of the address state (waits for an in-flight cycle)
    pub async fn addresses(&self) -> AddressState {
        self.cycle.lock().await.addresses.clone()
    }

    /// Run one check cycle
    pub async fn run_check(&self) -> CheckOutcome {
        let mut cycle = self.cycle.lock().await;

        let request_count = self.counters.increment_requests();
        debug!("Check cycle {} started", request_count);

        let fetched = match self.primary.fetch().await {
            Ok(address) => address,
            Err(FetchError::TemporarilyUnavailable) => {
                let failed = self.counters.increment_failed_primary();
                warn!(
                    "Primary source {} temporarily unavailable ({} in a row), querying backups",
                    self.primary.endpoint(),
                    failed
                );
                return self.backup_round(&mut cycle).await;
            }
            Err(error) => {
                error!("Primary source {} failed: {}", self.primary.endpoint(), error);
                self.report_primary_failure(&error).await;
                return CheckOutcome::PrimaryFailed(error);
            }
        };

        cycle.addresses.stage(fetched.clone());

        let counters = self.counters.snapshot();
        if counters.out_of_sync() {
            warn!(
                "Counters out of sync: {} requests vs {} ticks",
                counters.request_count, counters.check_tick_count
            );
            log_delivery(
                "counters_out_of_sync",
                self.notifier.counters_out_of_sync(&counters).await,
            );
        }

        if !cycle.addresses.compare(&fetched) {
            debug!("Address unchanged: {}", fetched);
            return CheckOutcome::Unchanged(fetched);
        }

        cycle.addresses.transition(fetched.clone());
        let report = self.report(fetched.clone(), cycle.addresses.old().clone());

        if request_count == 1 && counters.failed_primary_count == 0 {
            info!("Initial address resolved: {}", fetched);
            log_delivery(
                "configuration_succeeded",
                self.notifier.configuration_succeeded(&report).await,
            );
            self.heartbeat_locked(&mut cycle).await;
            CheckOutcome::ConfigurationSucceeded(fetched)
        } else {
            info!("Address changed: {} -> {}", report.old_address, fetched);
            log_delivery(
                "connection_reestablished",
                self.notifier.connection_reestablished(&report).await,
            );
            self.counters.reset_failed_primary();
            CheckOutcome::ConnectionReestablished(fetched)
        }
    }

    /// Run one heartbeat cycle
    ///
    /// Gathers a fresh snapshot from every backup source, reports it with
    /// the address state and counters, then clears the snapshot.
    pub async fn run_heartbeat(&self) -> HeartbeatSnapshot {
        let mut cycle = self.cycle.lock().await;
        self.heartbeat_locked(&mut cycle).await
    }

    /// Backup round that decides on consensus
    async fn backup_round(&self, cycle: &mut CycleState) -> CheckOutcome {
        let failures = self.backup.resolve_all(&mut cycle.backup_results).await;
        for failure in &failures {
            self.report_backup_failure(failure).await;
        }

        match cycle.backup_results.consensus() {
            Consensus::Empty => {
                warn!("No backup source returned an address");
                let report = self.report(Address::empty(), cycle.addresses.current().clone());
                log_delivery(
                    "no_address_returned",
                    self.notifier.no_address_returned(&report).await,
                );
                CheckOutcome::BackupEmpty
            }
            Consensus::Agreed(address) => {
                cycle.addresses.replace_via_backup(address.clone());
                self.counters.increment_backup_checks();
                info!(
                    "Backup sources agreed on {} (was {})",
                    address,
                    cycle.addresses.old()
                );
                let report = self.report(address.clone(), cycle.addresses.old().clone());
                log_delivery(
                    "address_changed_via_backup",
                    self.notifier.address_changed_via_backup(&report).await,
                );
                CheckOutcome::BackupAgreed(address)
            }
            Consensus::Ambiguous => {
                warn!(
                    "Backup sources disagree: {} distinct addresses from {} sources",
                    cycle.backup_results.distinct_count(),
                    cycle.backup_results.len()
                );
                let report = self.report(Address::empty(), cycle.addresses.current().clone());
                log_delivery(
                    "multiple_addresses_returned",
                    self.notifier
                        .multiple_addresses_returned(&cycle.backup_results, &report)
                        .await,
                );
                CheckOutcome::BackupAmbiguous(cycle.backup_results.clone())
            }
        }
    }

    /// Heartbeat body, for callers already holding the cycle lock
    async fn heartbeat_locked(&self, cycle: &mut CycleState) -> HeartbeatSnapshot {
        let failures = self.backup.resolve_all(&mut cycle.backup_results).await;
        self.counters.increment_backup_checks();

        if !failures.is_empty() {
            debug!("{} backup source(s) failed during heartbeat", failures.len());
        }

        let snapshot = HeartbeatSnapshot {
            old_address: cycle.addresses.old().clone(),
            current_address: cycle.addresses.current().clone(),
            new_address: cycle.addresses.staged().clone(),
            counters: self.counters.snapshot(),
            backup_results: cycle.backup_results.clone(),
            interval_minutes: self.schedule.check_interval_minutes(),
            heartbeat_interval_days: self.schedule.heartbeat_interval_days,
        };

        info!(
            "Heartbeat: current {} ({} backup source(s) responded)",
            snapshot.current_address,
            snapshot.backup_results.len()
        );
        log_delivery("heartbeat", self.notifier.heartbeat(&snapshot).await);

        cycle.backup_results.clear();
        snapshot
    }

    async fn report_primary_failure(&self, error: &FetchError) {
        let delivery = match error {
            FetchError::Http { kind, message } => {
                self.notifier.primary_http_failure(*kind, message).await
            }
            FetchError::Other { kind, message } => {
                self.notifier.primary_other_failure(*kind, message).await
            }
            FetchError::TemporarilyUnavailable => return,
        };
        log_delivery("primary_failure", delivery);
    }

    async fn report_backup_failure(&self, failure: &BackupFailure) {
        let delivery = match &failure.error {
            FetchError::Http { kind, message } => {
                self.notifier
                    .backup_http_failure(&failure.url, *kind, message)
                    .await
            }
            FetchError::TemporarilyUnavailable => {
                self.notifier
                    .backup_http_failure(
                        &failure.url,
                        crate::error::FailureKind::Status(503),
                        "service unavailable",
                    )
                    .await
            }
            FetchError::Other { kind, message } => {
                self.notifier
                    .backup_other_failure(&failure.url, *kind, message)
                    .await
            }
        };
        log_delivery("backup_failure", delivery);
    }

    fn report(&self, new_address: Address, old_address: Address) -> AddressReport {
        AddressReport {
            new_address,
            old_address,
            counters: self.counters.snapshot(),
            interval_minutes: self.schedule.check_interval_minutes(),
        }
    }
}

/// Log a notifier failure; delivery problems never abort a cycle
fn log_delivery(event: &str, result: Result<()>) {
    if let Err(e) = result {
        warn!("Failed to deliver {} notification: {}", event, e);
    }
}
