//! Rendered notification messages

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which notifier event produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ConfigurationSucceeded,
    ConnectionReestablished,
    AddressChangedViaBackup,
    MultipleAddressesReturned,
    NoAddressReturned,
    CountersOutOfSync,
    PrimaryHttpFailure,
    PrimaryOtherFailure,
    BackupHttpFailure,
    BackupOtherFailure,
    Heartbeat,
    ConfigurationError,
}

impl EventKind {
    /// Stable snake_case name, as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ConfigurationSucceeded => "configuration_succeeded",
            EventKind::ConnectionReestablished => "connection_reestablished",
            EventKind::AddressChangedViaBackup => "address_changed_via_backup",
            EventKind::MultipleAddressesReturned => "multiple_addresses_returned",
            EventKind::NoAddressReturned => "no_address_returned",
            EventKind::CountersOutOfSync => "counters_out_of_sync",
            EventKind::PrimaryHttpFailure => "primary_http_failure",
            EventKind::PrimaryOtherFailure => "primary_other_failure",
            EventKind::BackupHttpFailure => "backup_http_failure",
            EventKind::BackupOtherFailure => "backup_other_failure",
            EventKind::Heartbeat => "heartbeat",
            EventKind::ConfigurationError => "configuration_error",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A plain-text message ready for a transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Event that produced the message
    pub event: EventKind,
    /// One-line subject
    pub subject: String,
    /// Plain-text body
    pub body: String,
    /// When the message was rendered
    pub sent_at: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current time
    pub fn new(event: EventKind, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            event,
            subject: subject.into(),
            body: body.into(),
            sent_at: Utc::now(),
        }
    }

    /// Subject and body as one block of text
    pub fn to_text(&self) -> String {
        format!("{}\n\n{}", self.subject, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_as_snake_case() {
        let message = Message::new(EventKind::CountersOutOfSync, "s", "b");
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["event"], "counters_out_of_sync");
        assert_eq!(json["event"], EventKind::CountersOutOfSync.as_str());
    }

    #[test]
    fn text_joins_subject_and_body() {
        let message = Message::new(EventKind::Heartbeat, "Status", "all good");
        assert_eq!(message.to_text(), "Status\n\nall good");
    }
}
