//! Notification channels for alerts.

pub mod slack;

use async_trait::async_trait;

use crate::error::DeliveryError;

pub use slack::SlackWebhook;

/// Delivers a plain-text alert.
///
/// Implementations report anything short of an explicit acknowledgement as
/// a [`DeliveryError`] and never retry.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<(), DeliveryError>;
}
