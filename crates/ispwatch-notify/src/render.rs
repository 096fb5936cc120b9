//! Plain-text rendering for every notifier event
//!
//! Rendering is pure: each function turns semantic data into a [`Message`]
//! and never performs I/O.

use chrono::{NaiveTime, Weekday};
use ispwatch_core::error::FailureKind;
use ispwatch_core::traits::{AddressReport, HeartbeatSnapshot};
use ispwatch_core::{BackupCheckResult, CounterSnapshot, MonitorConfig};

use crate::message::{EventKind, Message};

/// Where the DNS record for the watched address is managed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsProviderLink {
    /// Provider name shown to the reader
    pub name: String,
    /// Page where the record is edited
    pub url: String,
}

/// Static facts shown alongside events
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Primary address source
    pub primary_endpoint: String,
    /// Backup sources in query order
    pub backup_endpoints: Vec<String>,
    /// Heartbeat weekday
    pub heartbeat_day_of_week: Weekday,
    /// Heartbeat time of day
    pub heartbeat_time_of_day: NaiveTime,
    /// Optional DNS provider named in change messages
    pub dns_provider: Option<DnsProviderLink>,
}

impl RenderContext {
    /// Context for the endpoints and schedule of `config`
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            primary_endpoint: config.primary_endpoint.clone(),
            backup_endpoints: config.backup_endpoints.clone(),
            heartbeat_day_of_week: config.schedule.heartbeat_day_of_week,
            heartbeat_time_of_day: config.schedule.heartbeat_time_of_day,
            dns_provider: None,
        }
    }

    /// Name the DNS provider in change messages
    pub fn with_dns_provider(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.dns_provider = Some(DnsProviderLink {
            name: name.into(),
            url: url.into(),
        });
        self
    }

    fn update_hint(&self) -> String {
        match &self.dns_provider {
            Some(link) => format!("Go to {} ({}) to update the DNS record.", link.name, link.url),
            None => "Update the DNS record with your DNS provider.".to_string(),
        }
    }
}

fn counter_lines(counters: &CounterSnapshot) -> Vec<String> {
    vec![
        format!("Requests: {}", counters.request_count),
        format!("Scheduled checks: {}", counters.check_tick_count),
        format!("Failed primary attempts: {}", counters.failed_primary_count),
        format!("Backup checks: {}", counters.backup_check_count),
        format!("Endpoint calls: {}", counters.endpoint_hit_count),
    ]
}

fn backup_lines(results: &BackupCheckResult) -> Vec<String> {
    if results.is_empty() {
        return vec!["No backup source responded.".to_string()];
    }
    results
        .iter()
        .map(|entry| format!("{} -> {}", entry.url, entry.address))
        .collect()
}

fn or_none(value: &ispwatch_core::Address) -> &str {
    if value.is_empty() { "(none)" } else { value.as_str() }
}

/// First address obtained after startup
pub fn configuration_succeeded(ctx: &RenderContext, report: &AddressReport) -> Message {
    let mut lines = vec![
        "The address checker is configured and running.".to_string(),
        format!("Current address: {}", report.new_address),
        String::new(),
        format!("Primary endpoint: {}", ctx.primary_endpoint),
    ];
    for (index, url) in ctx.backup_endpoints.iter().enumerate() {
        lines.push(format!("Backup endpoint {}: {}", index, url));
    }
    lines.push(format!("A check is made every {} minutes", report.interval_minutes));
    lines.push(format!(
        "Heartbeat on {} at {}",
        ctx.heartbeat_day_of_week,
        ctx.heartbeat_time_of_day.format("%H:%M")
    ));
    if let Some(link) = &ctx.dns_provider {
        lines.push(format!("DNS provider: {} ({})", link.name, link.url));
    }
    lines.push(String::new());
    lines.extend(counter_lines(&report.counters));

    Message::new(
        EventKind::ConfigurationSucceeded,
        "ispwatch: configuration succeeded",
        lines.join("\n"),
    )
}

/// Primary answered again with a changed address
pub fn connection_reestablished(ctx: &RenderContext, report: &AddressReport) -> Message {
    let mut lines = vec![
        format!("{} is your new address.", report.new_address),
        format!("The old address was {}.", or_none(&report.old_address)),
        ctx.update_hint(),
        String::new(),
        format!("Primary endpoint: {}", ctx.primary_endpoint),
        format!("A check is made every {} minutes", report.interval_minutes),
    ];
    lines.extend(counter_lines(&report.counters));
    lines.push("The failed primary attempts counter is reset after this message.".to_string());

    Message::new(
        EventKind::ConnectionReestablished,
        "ispwatch: address changed",
        lines.join("\n"),
    )
}

/// Backup sources agreed on an address
pub fn address_changed_via_backup(ctx: &RenderContext, report: &AddressReport) -> Message {
    let mut lines = vec![
        format!(
            "The primary endpoint is unavailable; backup sources agree that {} is your address.",
            report.new_address
        ),
        format!("The previous address was {}.", or_none(&report.old_address)),
        ctx.update_hint(),
        String::new(),
        format!("Primary endpoint: {}", ctx.primary_endpoint),
        format!("A check is made every {} minutes", report.interval_minutes),
    ];
    lines.extend(counter_lines(&report.counters));

    Message::new(
        EventKind::AddressChangedViaBackup,
        "ispwatch: address changed (backup sources)",
        lines.join("\n"),
    )
}

/// Backup sources disagreed; lists every answer
pub fn multiple_addresses_returned(
    ctx: &RenderContext,
    results: &BackupCheckResult,
    report: &AddressReport,
) -> Message {
    let mut lines = vec![
        format!(
            "The primary endpoint is unavailable and the backup sources returned {} different addresses.",
            results.distinct_count()
        ),
        format!("The current address stays {}.", or_none(&report.old_address)),
        String::new(),
    ];
    lines.extend(backup_lines(results));
    lines.push(String::new());
    lines.push(format!("Primary endpoint: {}", ctx.primary_endpoint));
    lines.extend(counter_lines(&report.counters));

    Message::new(
        EventKind::MultipleAddressesReturned,
        "ispwatch: backup sources disagree",
        lines.join("\n"),
    )
}

/// Primary unavailable and no backup answered
pub fn no_address_returned(ctx: &RenderContext, report: &AddressReport) -> Message {
    let mut lines = vec![
        "The primary endpoint is unavailable and no backup source returned an address.".to_string(),
        format!("The current address stays {}.", or_none(&report.old_address)),
        format!("Primary endpoint: {}", ctx.primary_endpoint),
        String::new(),
    ];
    lines.extend(counter_lines(&report.counters));

    Message::new(
        EventKind::NoAddressReturned,
        "ispwatch: no address returned",
        lines.join("\n"),
    )
}

/// Request and tick counters differ
pub fn counters_out_of_sync(counters: &CounterSnapshot) -> Message {
    let body = format!(
        "The check counters are out of sync.\nRequests: {}\nScheduled checks: {}",
        counters.request_count, counters.check_tick_count
    );

    Message::new(
        EventKind::CountersOutOfSync,
        "ispwatch: counter difference",
        body,
    )
}

/// Primary failed with an HTTP or other error, per `event`
pub fn primary_failure(
    ctx: &RenderContext,
    event: EventKind,
    kind: FailureKind,
    message: &str,
) -> Message {
    let subject = match event {
        EventKind::PrimaryHttpFailure => "ispwatch: primary endpoint HTTP failure",
        _ => "ispwatch: primary endpoint error",
    };
    let body = format!(
        "The primary endpoint did not respond.\nEndpoint: {}\nKind: {}\nMessage: {}",
        ctx.primary_endpoint, kind, message
    );

    Message::new(event, subject, body)
}

/// A backup source failed with an HTTP or other error, per `event`
pub fn backup_failure(url: &str, event: EventKind, kind: FailureKind, message: &str) -> Message {
    let subject = match event {
        EventKind::BackupHttpFailure => "ispwatch: backup source HTTP failure",
        _ => "ispwatch: backup source error",
    };
    let body = format!(
        "A backup source did not respond.\nSource: {}\nKind: {}\nMessage: {}",
        url, kind, message
    );

    Message::new(event, subject, body)
}

/// Periodic status report
pub fn heartbeat(ctx: &RenderContext, snapshot: &HeartbeatSnapshot) -> Message {
    let mut lines = vec![
        format!("Current address: {}", or_none(&snapshot.current_address)),
        format!("Old address: {}", or_none(&snapshot.old_address)),
        format!("Last fetched address: {}", or_none(&snapshot.new_address)),
        String::new(),
    ];
    lines.extend(backup_lines(&snapshot.backup_results));
    lines.push(String::new());
    lines.push(format!("Primary endpoint: {}", ctx.primary_endpoint));
    lines.push(format!("A check is made every {} minutes", snapshot.interval_minutes));
    lines.extend(counter_lines(&snapshot.counters));
    lines.push(format!(
        "See you in {} days.",
        snapshot.heartbeat_interval_days
    ));

    Message::new(EventKind::Heartbeat, "ispwatch: status update", lines.join("\n"))
}

/// Startup configuration was rejected
pub fn configuration_error(message: &str) -> Message {
    Message::new(
        EventKind::ConfigurationError,
        "ispwatch: configuration error",
        format!("The configuration is invalid: {}", message),
    )
}
