//! Test doubles and common utilities for contract tests
//!
//! - [`ScriptedFetcher`]: per-URL scripted responses with call counting
//! - [`RecordingNotifier`]: records every notifier call in order

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ispwatch_core::error::{Error, FailureKind, FetchError, Result};
use ispwatch_core::traits::{AddressFetcher, AddressReport, HeartbeatSnapshot, Notifier};
use ispwatch_core::{BackupCheckResult, CheckEngine, CounterSnapshot, CounterStore, MonitorConfig};

pub const PRIMARY: &str = "http://primary.test/HTTP/GetIp";
pub const BACKUP_A: &str = "http://backup-a.test/";
pub const BACKUP_B: &str = "http://backup-b.test/";
pub const BACKUP_C: &str = "http://backup-c.test/";

type Response = std::result::Result<String, FetchError>;

#[derive(Default)]
struct Script {
    queued: VecDeque<Response>,
    fallback: Option<Response>,
}

/// An AddressFetcher that answers from a per-URL script
///
/// Queued responses are consumed first, then the sticky response repeats.
/// Unscripted URLs fail with a connect error.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<HashMap<String, usize>>,
    total_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `response` until told otherwise
    pub fn respond(&self, url: &str, response: Response) {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .fallback = Some(response);
    }

    /// Answer the next request to `url` with `response`
    pub fn enqueue(&self, url: &str, response: Response) {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .queued
            .push_back(response);
    }

    /// Sleep before every answer
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    /// Highest number of requests observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AddressFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;
        self.total_calls.fetch_add(1, Ordering::SeqCst);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let response = {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(url) {
                Some(script) => script
                    .queued
                    .pop_front()
                    .or_else(|| script.fallback.clone())
                    .unwrap_or_else(|| Err(FetchError::http(FailureKind::Connect, "unscripted"))),
                None => Err(FetchError::http(FailureKind::Connect, "unscripted")),
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }

    fn fetcher_name(&self) -> &'static str {
        "scripted"
    }
}

/// One recorded notifier call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    ConfigurationSucceeded(AddressReport),
    ConnectionReestablished(AddressReport),
    AddressChangedViaBackup(AddressReport),
    MultipleAddressesReturned(BackupCheckResult, AddressReport),
    NoAddressReturned(AddressReport),
    CountersOutOfSync(CounterSnapshot),
    PrimaryHttpFailure(FailureKind, String),
    PrimaryOtherFailure(FailureKind, String),
    BackupHttpFailure(String, FailureKind, String),
    BackupOtherFailure(String, FailureKind, String),
    Heartbeat(HeartbeatSnapshot),
    ConfigurationError(String),
}

impl NotifierCall {
    pub fn name(&self) -> &'static str {
        match self {
            NotifierCall::ConfigurationSucceeded(_) => "configuration_succeeded",
            NotifierCall::ConnectionReestablished(_) => "connection_reestablished",
            NotifierCall::AddressChangedViaBackup(_) => "address_changed_via_backup",
            NotifierCall::MultipleAddressesReturned(..) => "multiple_addresses_returned",
            NotifierCall::NoAddressReturned(_) => "no_address_returned",
            NotifierCall::CountersOutOfSync(_) => "counters_out_of_sync",
            NotifierCall::PrimaryHttpFailure(..) => "primary_http_failure",
            NotifierCall::PrimaryOtherFailure(..) => "primary_other_failure",
            NotifierCall::BackupHttpFailure(..) => "backup_http_failure",
            NotifierCall::BackupOtherFailure(..) => "backup_other_failure",
            NotifierCall::Heartbeat(_) => "heartbeat",
            NotifierCall::ConfigurationError(_) => "configuration_error",
        }
    }
}

/// A Notifier that records every call
#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<NotifierCall>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every delivery fail (after recording it)
    pub fn fail_deliveries(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<NotifierCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.calls().iter().map(NotifierCall::name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names().iter().filter(|n| **n == name).count()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: NotifierCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::notifier("delivery refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn configuration_succeeded(&self, report: &AddressReport) -> Result<()> {
        self.record(NotifierCall::ConfigurationSucceeded(report.clone()))
    }

    async fn connection_reestablished(&self, report: &AddressReport) -> Result<()> {
        self.record(NotifierCall::ConnectionReestablished(report.clone()))
    }

    async fn address_changed_via_backup(&self, report: &AddressReport) -> Result<()> {
        self.record(NotifierCall::AddressChangedViaBackup(report.clone()))
    }

    async fn multiple_addresses_returned(
        &self,
        results: &BackupCheckResult,
        report: &AddressReport,
    ) -> Result<()> {
        self.record(NotifierCall::MultipleAddressesReturned(
            results.clone(),
            report.clone(),
        ))
    }

    async fn no_address_returned(&self, report: &AddressReport) -> Result<()> {
        self.record(NotifierCall::NoAddressReturned(report.clone()))
    }

    async fn counters_out_of_sync(&self, counters: &CounterSnapshot) -> Result<()> {
        self.record(NotifierCall::CountersOutOfSync(*counters))
    }

    async fn primary_http_failure(&self, kind: FailureKind, message: &str) -> Result<()> {
        self.record(NotifierCall::PrimaryHttpFailure(kind, message.to_string()))
    }

    async fn primary_other_failure(&self, kind: FailureKind, message: &str) -> Result<()> {
        self.record(NotifierCall::PrimaryOtherFailure(kind, message.to_string()))
    }

    async fn backup_http_failure(&self, url: &str, kind: FailureKind, message: &str) -> Result<()> {
        self.record(NotifierCall::BackupHttpFailure(
            url.to_string(),
            kind,
            message.to_string(),
        ))
    }

    async fn backup_other_failure(&self, url: &str, kind: FailureKind, message: &str) -> Result<()> {
        self.record(NotifierCall::BackupOtherFailure(
            url.to_string(),
            kind,
            message.to_string(),
        ))
    }

    async fn heartbeat(&self, snapshot: &HeartbeatSnapshot) -> Result<()> {
        self.record(NotifierCall::Heartbeat(snapshot.clone()))
    }

    async fn configuration_error(&self, message: &str) -> Result<()> {
        self.record(NotifierCall::ConfigurationError(message.to_string()))
    }
}

/// Config with the primary and three backups
pub fn test_config() -> MonitorConfig {
    MonitorConfig::new(
        PRIMARY,
        vec![
            BACKUP_A.to_string(),
            BACKUP_B.to_string(),
            BACKUP_C.to_string(),
        ],
    )
}

/// Everything a contract test needs to drive and observe an engine
pub struct Harness {
    pub engine: Arc<CheckEngine>,
    pub fetcher: Arc<ScriptedFetcher>,
    pub notifier: Arc<RecordingNotifier>,
    pub counters: Arc<CounterStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: MonitorConfig) -> Self {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let counters = Arc::new(CounterStore::new());

        let engine = CheckEngine::new(
            fetcher.clone(),
            notifier.clone(),
            counters.clone(),
            config,
        )
        .expect("engine construction succeeds");

        Self {
            engine: Arc::new(engine),
            fetcher,
            notifier,
            counters,
        }
    }

    /// Script all three backups
    pub fn backups(&self, a: Response, b: Response, c: Response) {
        self.fetcher.respond(BACKUP_A, a);
        self.fetcher.respond(BACKUP_B, b);
        self.fetcher.respond(BACKUP_C, c);
    }

    /// Keep the tick counter in step with the request counter
    pub fn tick(&self) {
        self.counters.increment_check_ticks();
    }
}

pub fn ok(body: &str) -> Response {
    Ok(body.to_string())
}

pub fn unavailable() -> Response {
    Err(FetchError::TemporarilyUnavailable)
}

pub fn http_error(status: u16) -> Response {
    Err(FetchError::http(FailureKind::Status(status), format!("status {}", status)))
}

/// Connection refused, classified the way `HttpFetcher` does
pub fn connect_error() -> Response {
    Err(FetchError::http(FailureKind::Connect, "connection refused"))
}

/// A failure outside HTTP classification
pub fn unexpected_error() -> Response {
    Err(FetchError::other(FailureKind::Unknown, "unexpected"))
}
