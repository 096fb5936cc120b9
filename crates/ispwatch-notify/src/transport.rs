//! Message delivery
//!
//! A [`Transport`] delivers one rendered [`Message`] per call. No retry:
//! a failed delivery is returned to the caller, which logs it.

use std::time::Duration;

use async_trait::async_trait;
use ispwatch_core::{Error, Result};
use serde_json::json;

use crate::message::Message;

/// Default HTTP timeout for webhook delivery (30 seconds)
const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Delivers rendered messages
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one message
    async fn send(&self, message: &Message) -> Result<()>;

    /// Transport name for logs
    fn transport_name(&self) -> &'static str;
}

/// Writes every message to the tracing log
#[derive(Debug, Default, Clone)]
pub struct LogTransport;

#[async_trait]
impl Transport for LogTransport {
    async fn send(&self, message: &Message) -> Result<()> {
        tracing::info!(
            event = %message.event,
            subject = %message.subject,
            "{}",
            message.body
        );
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "log"
    }
}

/// POSTs every message as JSON to a webhook URL
///
/// The payload carries the structured fields plus a `content` field with
/// subject and body joined, which chat webhooks display as-is.
#[derive(Debug, Clone)]
pub struct WebhookTransport {
    url: String,
    client: reqwest::Client,
}

impl WebhookTransport {
    /// Create a webhook transport for `url`
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_WEBHOOK_TIMEOUT)
            .build()
            .map_err(|e| Error::notifier(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Destination webhook URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for WebhookTransport {
    async fn send(&self, message: &Message) -> Result<()> {
        let payload = json!({
            "event": message.event,
            "subject": message.subject,
            "body": message.body,
            "sent_at": message.sent_at,
            "content": message.to_text(),
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::notifier(format!("Webhook request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::notifier(format!(
                "Webhook rejected {}: {} - {}",
                message.event, status, error_text
            )));
        }

        tracing::debug!("Delivered {} via webhook", message.event);
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "webhook"
    }
}
