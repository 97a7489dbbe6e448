use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;

use crate::error::NotificationError;
use crate::models::Notification;

/// Delivers one rendered notification. Retries belong to the worker.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// Writes notifications to the log. Used when no webhook is configured.
#[derive(Debug, Default, Clone)]
pub struct LogSender;

#[async_trait]
impl NotificationSender for LogSender {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        info!(
            "Notification {} ({:?}) to {}: {}",
            notification.id, notification.kind, notification.recipient, notification.subject
        );
        debug!("{}", notification.body);
        Ok(())
    }
}

/// Posts notifications as JSON to an email/SMS relay.
pub struct WebhookSender {
    client: Client,
    url: String,
}

impl WebhookSender {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl NotificationSender for WebhookSender {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({
                "id": notification.id,
                "kind": notification.kind,
                "to": notification.recipient,
                "subject": notification.subject,
                "body": notification.body,
                "invoice_id": notification.invoice_id,
            }))
            .send()
            .await
            .map_err(|e| NotificationError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
            });
        }

        debug!("Webhook accepted notification {}", notification.id);
        Ok(())
    }
}

/// Webhook sender when `notification_webhook_url` is set, log sender otherwise.
pub fn sender_from_config(config: &AppConfig) -> Arc<dyn NotificationSender> {
    match &config.notification_webhook_url {
        Some(url) => Arc::new(WebhookSender::new(url.clone())),
        None => Arc::new(LogSender),
    }
}
