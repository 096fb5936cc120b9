//! `Notifier` implementation over a [`Transport`]

use async_trait::async_trait;
use ispwatch_core::error::FailureKind;
use ispwatch_core::traits::{AddressReport, HeartbeatSnapshot, Notifier};
use ispwatch_core::{BackupCheckResult, CounterSnapshot, Result};

use crate::message::{EventKind, Message};
use crate::render::{self, RenderContext};
use crate::transport::Transport;

/// Renders each event and hands it to a transport
pub struct MessageNotifier<T: Transport> {
    context: RenderContext,
    transport: T,
}

impl<T: Transport> MessageNotifier<T> {
    /// Render with `context` and deliver through `transport`
    pub fn new(context: RenderContext, transport: T) -> Self {
        Self { context, transport }
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn deliver(&self, message: Message) -> Result<()> {
        tracing::debug!(
            "Sending {} via {}",
            message.event,
            self.transport.transport_name()
        );
        self.transport.send(&message).await
    }
}

#[async_trait]
impl<T: Transport> Notifier for MessageNotifier<T> {
    async fn configuration_succeeded(&self, report: &AddressReport) -> Result<()> {
        self.deliver(render::configuration_succeeded(&self.context, report))
            .await
    }

    async fn connection_reestablished(&self, report: &AddressReport) -> Result<()> {
        self.deliver(render::connection_reestablished(&self.context, report))
            .await
    }

    async fn address_changed_via_backup(&self, report: &AddressReport) -> Result<()> {
        self.deliver(render::address_changed_via_backup(&self.context, report))
            .await
    }

    async fn multiple_addresses_returned(
        &self,
        results: &BackupCheckResult,
        report: &AddressReport,
    ) -> Result<()> {
        self.deliver(render::multiple_addresses_returned(
            &self.context,
            results,
            report,
        ))
        .await
    }

    async fn no_address_returned(&self, report: &AddressReport) -> Result<()> {
        self.deliver(render::no_address_returned(&self.context, report))
            .await
    }

    async fn counters_out_of_sync(&self, counters: &CounterSnapshot) -> Result<()> {
        self.deliver(render::counters_out_of_sync(counters)).await
    }

    async fn primary_http_failure(&self, kind: FailureKind, message: &str) -> Result<()> {
        self.deliver(render::primary_failure(
            &self.context,
            EventKind::PrimaryHttpFailure,
            kind,
            message,
        ))
        .await
    }

    async fn primary_other_failure(&self, kind: FailureKind, message: &str) -> Result<()> {
        self.deliver(render::primary_failure(
            &self.context,
            EventKind::PrimaryOtherFailure,
            kind,
            message,
        ))
        .await
    }

    async fn backup_http_failure(&self, url: &str, kind: FailureKind, message: &str) -> Result<()> {
        self.deliver(render::backup_failure(
            url,
            EventKind::BackupHttpFailure,
            kind,
            message,
        ))
        .await
    }

    async fn backup_other_failure(&self, url: &str, kind: FailureKind, message: &str) -> Result<()> {
        self.deliver(render::backup_failure(
            url,
            EventKind::BackupOtherFailure,
            kind,
            message,
        ))
        .await
    }

    async fn heartbeat(&self, snapshot: &HeartbeatSnapshot) -> Result<()> {
        self.deliver(render::heartbeat(&self.context, snapshot)).await
    }

    async fn configuration_error(&self, message: &str) -> Result<()> {
        self.deliver(render::configuration_error(message)).await
    }
}
