// # Counter Store
//
// Process-wide counters shared by the check engine, the scheduler and the
// passive endpoint. Every operation is a single atomic; there is no lock.
//
// The check-tick counter starts at 1: the check timer fires immediately at
// startup while the tick timer first fires one interval later, so the
// immediate check counts as scheduled.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic counters driving diagnostics and reports
#[derive(Debug)]
pub struct CounterStore {
    request_count: AtomicU64,
    check_tick_count: AtomicU64,
    failed_primary_count: AtomicU64,
    backup_check_count: AtomicU64,
    endpoint_hit_count: AtomicU64,
}

/// Point-in-time copy of all counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    /// Primary check attempts
    pub request_count: u64,
    /// Scheduled check ticks
    pub check_tick_count: u64,
    /// Primary "temporarily unavailable" responses since the last recovery
    pub failed_primary_count: u64,
    /// Backup rounds counted (consensus reached or heartbeat snapshot)
    pub backup_check_count: u64,
    /// Requests served by the passive endpoint
    pub endpoint_hit_count: u64,
}

impl CounterSnapshot {
    /// Whether check attempts and scheduled ticks have drifted apart
    pub fn out_of_sync(&self) -> bool {
        self.request_count != self.check_tick_count
    }
}

impl CounterStore {
    /// Create a counter store with the startup values
    pub fn new() -> Self {
        Self {
            request_count: AtomicU64::new(0),
            check_tick_count: AtomicU64::new(1),
            failed_primary_count: AtomicU64::new(0),
            backup_check_count: AtomicU64::new(0),
            endpoint_hit_count: AtomicU64::new(0),
        }
    }

    /// Count a primary check attempt, returning the new value
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Count a scheduled tick, returning the new value
    pub fn increment_check_ticks(&self) -> u64 {
        self.check_tick_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Count a primary outage, returning the new value
    pub fn increment_failed_primary(&self) -> u64 {
        self.failed_primary_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Count a backup round, returning the new value
    pub fn increment_backup_checks(&self) -> u64 {
        self.backup_check_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Count a passive endpoint hit, returning the new value
    pub fn increment_endpoint_hits(&self) -> u64 {
        self.endpoint_hit_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Reset the failed-primary counter after a connection is re-established
    pub fn reset_failed_primary(&self) {
        self.failed_primary_count.store(0, Ordering::SeqCst);
    }

    /// Current primary check attempts
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Current scheduled ticks
    pub fn check_tick_count(&self) -> u64 {
        self.check_tick_count.load(Ordering::SeqCst)
    }

    /// Current primary outages since the last recovery
    pub fn failed_primary_count(&self) -> u64 {
        self.failed_primary_count.load(Ordering::SeqCst)
    }

    /// Current backup rounds counted
    pub fn backup_check_count(&self) -> u64 {
        self.backup_check_count.load(Ordering::SeqCst)
    }

    /// Current passive endpoint hits
    pub fn endpoint_hit_count(&self) -> u64 {
        self.endpoint_hit_count.load(Ordering::SeqCst)
    }

    /// Read all counters
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            request_count: self.request_count(),
            check_tick_count: self.check_tick_count(),
            failed_primary_count: self.failed_primary_count(),
            backup_check_count: self.backup_check_count(),
            endpoint_hit_count: self.endpoint_hit_count(),
        }
    }
}

impl Default for CounterStore {
    fn default() -> Self {
        Self::new()
    }
}
