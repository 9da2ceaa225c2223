//! Slack incoming-webhook notifier.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::error::DeliveryError;
use crate::notify::Notifier;

const CHANNEL_NAME: &str = "slack";

/// Body Slack returns when it accepted the message.
pub const SLACK_ACK: &str = "ok";

/// Posts alerts to a Slack incoming webhook.
pub struct SlackWebhook {
    webhook_url: SecretString,
    client: reqwest::Client,
}

impl SlackWebhook {
    pub fn new(webhook_url: SecretString) -> Self {
        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for SlackWebhook {
    async fn notify(&self, message: &str) -> Result<(), DeliveryError> {
        let body = serde_json::json!({ "text": message });

        let resp = self
            .client
            .post(self.webhook_url.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| DeliveryError::Request {
                channel: CHANNEL_NAME.into(),
                reason: e.without_url().to_string(),
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| DeliveryError::Request {
            channel: CHANNEL_NAME.into(),
            reason: e.without_url().to_string(),
        })?;

        if status.is_success() && text.trim() == SLACK_ACK {
            tracing::info!("Message sent to slack");
            return Ok(());
        }

        tracing::error!(status = ?status, body = %text, "Failed to send slack message");
        Err(DeliveryError::Rejected {
            channel: CHANNEL_NAME.into(),
            status,
            body: text,
        })
    }
}
