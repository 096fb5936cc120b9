//! Contract Test: Check Cycle
//!
//! Verifies the primary-source path of a check cycle.
//!
//! Constraints verified:
//! - The first successful fetch reports configuration success, then a heartbeat
//! - Later changes report a re-established connection and reset the failure streak
//! - Unchanged addresses produce no notification
//! - Request-level and unexpected failures are reported and never reach the backups
//! - Counter drift is reported before change detection
//! - Overlapping cycles are serialized
//! - Notifier failures never abort a cycle

mod common;

use std::time::Duration;

use common::*;
use ispwatch_core::{Address, CheckEngine, CheckOutcome, CounterStore, Error, FailureKind};
use std::sync::Arc;

#[tokio::test]
async fn first_success_reports_configuration_then_heartbeat() {
    let h = Harness::new();
    h.fetcher.respond(PRIMARY, ok("1.2.3.4\n"));
    h.backups(ok("1.2.3.4"), ok("1.2.3.4"), ok("1.2.3.4"));

    let outcome = h.engine.run_check().await;

    assert_eq!(outcome, CheckOutcome::ConfigurationSucceeded(Address::from("1.2.3.4")));
    assert_eq!(h.notifier.names(), vec!["configuration_succeeded", "heartbeat"]);

    let state = h.engine.addresses().await;
    assert_eq!(state.current().as_str(), "1.2.3.4");
    assert!(state.old().is_empty());

    // The post-configuration heartbeat is a full silent backup round
    assert_eq!(h.fetcher.calls(BACKUP_A), 1);
    assert_eq!(h.fetcher.calls(BACKUP_C), 1);
    assert_eq!(h.counters.backup_check_count(), 1);
}

#[tokio::test]
async fn configuration_report_carries_addresses_and_interval() {
    let h = Harness::new();
    h.fetcher.respond(PRIMARY, ok("1.2.3.4"));

    h.engine.run_check().await;

    match &h.notifier.calls()[0] {
        NotifierCall::ConfigurationSucceeded(report) => {
            assert_eq!(report.new_address.as_str(), "1.2.3.4");
            assert!(report.old_address.is_empty());
            assert_eq!(report.interval_minutes, 60);
            assert_eq!(report.counters.request_count, 1);
        }
        other => panic!("unexpected first call: {:?}", other),
    }
}

#[tokio::test]
async fn unchanged_address_is_silent() {
    let h = Harness::new();
    h.fetcher.respond(PRIMARY, ok("1.2.3.4"));
    h.engine.run_check().await;
    h.notifier.clear();

    h.tick();
    let outcome = h.engine.run_check().await;

    assert_eq!(outcome, CheckOutcome::Unchanged(Address::from("1.2.3.4")));
    assert!(h.notifier.calls().is_empty());
}

#[tokio::test]
async fn comparison_ignores_case() {
    let h = Harness::new();
    h.fetcher.enqueue(PRIMARY, ok("fe80::ABCD"));
    h.fetcher.enqueue(PRIMARY, ok("FE80::abcd"));

    h.engine.run_check().await;
    h.tick();
    let outcome = h.engine.run_check().await;

    assert!(matches!(outcome, CheckOutcome::Unchanged(_)));
}

#[tokio::test]
async fn new_address_reports_reestablished_connection() {
    let h = Harness::new();
    h.fetcher.enqueue(PRIMARY, ok("1.2.3.4"));
    h.fetcher.enqueue(PRIMARY, ok("5.6.7.8"));
    h.engine.run_check().await;
    h.notifier.clear();

    h.tick();
    let outcome = h.engine.run_check().await;

    assert_eq!(outcome, CheckOutcome::ConnectionReestablished(Address::from("5.6.7.8")));
    match h.notifier.calls().as_slice() {
        [NotifierCall::ConnectionReestablished(report)] => {
            assert_eq!(report.old_address.as_str(), "1.2.3.4");
            assert_eq!(report.new_address.as_str(), "5.6.7.8");
        }
        other => panic!("unexpected calls: {:?}", other),
    }

    let state = h.engine.addresses().await;
    assert_eq!(state.old().as_str(), "1.2.3.4");
    assert_eq!(state.current().as_str(), "5.6.7.8");
}

#[tokio::test]
async fn recovery_after_unavailable_is_not_configuration_success() {
    let h = Harness::new();
    h.fetcher.enqueue(PRIMARY, unavailable());
    h.fetcher.respond(PRIMARY, ok("1.2.3.4"));
    h.backups(connect_error(), connect_error(), connect_error());

    assert_eq!(h.engine.run_check().await, CheckOutcome::BackupEmpty);
    assert_eq!(h.counters.failed_primary_count(), 1);

    h.notifier.clear();
    h.tick();
    let outcome = h.engine.run_check().await;

    assert_eq!(outcome, CheckOutcome::ConnectionReestablished(Address::from("1.2.3.4")));
    assert_eq!(h.notifier.names(), vec!["connection_reestablished"]);
    assert_eq!(h.counters.failed_primary_count(), 0);

    // The report still shows the streak that just ended
    match &h.notifier.calls()[0] {
        NotifierCall::ConnectionReestablished(report) => {
            assert_eq!(report.counters.failed_primary_count, 1);
        }
        other => panic!("unexpected call: {:?}", other),
    }
}

#[tokio::test]
async fn http_failure_is_reported_without_backup_round() {
    let h = Harness::new();
    h.fetcher.respond(PRIMARY, http_error(500));

    let outcome = h.engine.run_check().await;

    assert!(matches!(outcome, CheckOutcome::PrimaryFailed(_)));
    assert_eq!(
        h.notifier.calls(),
        vec![NotifierCall::PrimaryHttpFailure(
            FailureKind::Status(500),
            "status 500".to_string()
        )]
    );
    assert_eq!(h.fetcher.total_calls(), 1);
    assert_eq!(h.counters.failed_primary_count(), 0);
    assert!(h.engine.addresses().await.current().is_empty());
}

#[tokio::test]
async fn connect_failure_is_an_http_failure() {
    let h = Harness::new();
    h.fetcher.respond(PRIMARY, connect_error());

    h.engine.run_check().await;

    assert_eq!(
        h.notifier.calls(),
        vec![NotifierCall::PrimaryHttpFailure(
            FailureKind::Connect,
            "connection refused".to_string()
        )]
    );
    assert_eq!(h.fetcher.calls(BACKUP_A), 0);
}

#[tokio::test]
async fn unexpected_failure_is_reported_without_backup_round() {
    let h = Harness::new();
    h.fetcher.respond(PRIMARY, unexpected_error());

    h.engine.run_check().await;

    assert_eq!(
        h.notifier.calls(),
        vec![NotifierCall::PrimaryOtherFailure(
            FailureKind::Unknown,
            "unexpected".to_string()
        )]
    );
    assert_eq!(h.fetcher.calls(BACKUP_A), 0);
}

#[tokio::test]
async fn failed_cycle_keeps_current_address() {
    let h = Harness::new();
    h.fetcher.enqueue(PRIMARY, ok("1.2.3.4"));
    h.fetcher.respond(PRIMARY, http_error(404));
    h.engine.run_check().await;

    h.tick();
    h.engine.run_check().await;

    assert_eq!(h.engine.addresses().await.current().as_str(), "1.2.3.4");
}

#[tokio::test]
async fn drift_is_reported_before_change_detection() {
    let h = Harness::new();
    h.fetcher.enqueue(PRIMARY, ok("1.2.3.4"));
    h.fetcher.enqueue(PRIMARY, ok("5.6.7.8"));
    h.engine.run_check().await;
    h.notifier.clear();

    // No tick: 2 requests vs 1 tick
    h.engine.run_check().await;

    assert_eq!(
        h.notifier.names(),
        vec!["counters_out_of_sync", "connection_reestablished"]
    );
    match &h.notifier.calls()[0] {
        NotifierCall::CountersOutOfSync(counters) => {
            assert_eq!(counters.request_count, 2);
            assert_eq!(counters.check_tick_count, 1);
        }
        other => panic!("unexpected call: {:?}", other),
    }
}

#[tokio::test]
async fn drift_is_reported_even_when_unchanged() {
    let h = Harness::new();
    h.fetcher.respond(PRIMARY, ok("1.2.3.4"));
    for _ in 0..4 {
        h.engine.run_check().await;
        h.tick();
    }
    h.notifier.clear();

    // 5 vs 5 is in sync, 6 vs 5 is not
    h.engine.run_check().await;
    h.engine.run_check().await;

    assert_eq!(h.notifier.names(), vec!["counters_out_of_sync"]);
}

#[tokio::test]
async fn notifier_failure_does_not_abort_cycle() {
    let h = Harness::new();
    h.notifier.fail_deliveries();
    h.fetcher.respond(PRIMARY, ok("1.2.3.4"));

    let outcome = h.engine.run_check().await;

    assert!(matches!(outcome, CheckOutcome::ConfigurationSucceeded(_)));
    assert_eq!(h.engine.addresses().await.current().as_str(), "1.2.3.4");
    assert_eq!(h.notifier.names(), vec!["configuration_succeeded", "heartbeat"]);
}

#[tokio::test(start_paused = true)]
async fn overlapping_cycles_are_serialized() {
    let h = Harness::new();
    h.fetcher.respond(PRIMARY, ok("1.2.3.4"));
    h.fetcher.set_delay(Duration::from_secs(5));

    let (first, second) = tokio::join!(h.engine.run_check(), h.engine.run_check());

    assert_eq!(h.fetcher.max_in_flight(), 1);
    assert_eq!(h.counters.request_count(), 2);
    assert!(first.changed_address() ^ second.changed_address());
    assert_eq!(h.notifier.count("configuration_succeeded"), 1);
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let mut config = test_config();
    config.backup_endpoints.clear();

    let result = CheckEngine::new(
        Arc::new(ScriptedFetcher::new()),
        Arc::new(RecordingNotifier::new()),
        Arc::new(CounterStore::new()),
        config,
    );

    assert!(matches!(result, Err(Error::Config(_))));
}
