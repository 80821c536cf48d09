//! Push-gateway notification dispatcher.
//!
//! Transport internals (device tokens, APNs/FCM fan-out) live behind the
//! gateway; this adapter only hands over composed payloads.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::PushConfig;
use crate::domain::ports::{Notification, NotificationDispatcher};

/// Dispatcher that POSTs notifications to the configured push gateway.
pub struct PushGatewayDispatcher {
    client: reqwest::Client,
    gateway_url: String,
    api_key: String,
}

impl PushGatewayDispatcher {
    pub fn new(config: &PushConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            gateway_url: config.gateway_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl NotificationDispatcher for PushGatewayDispatcher {
    async fn dispatch(&self, notification: &Notification) -> DomainResult<()> {
        let response = self
            .client
            .post(&self.gateway_url)
            .bearer_auth(&self.api_key)
            .json(notification)
            .send()
            .await
            .map_err(|e| DomainError::DispatchFailed {
                user_id: notification.recipient,
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(DomainError::DispatchFailed {
                user_id: notification.recipient,
                reason: format!("gateway returned {}", response.status()),
            });
        }

        Ok(())
    }
}

/// Dispatcher used when no gateway is configured: accepts everything and
/// logs at debug so batch runs stay observable in development.
#[derive(Debug, Default, Clone)]
pub struct NullDispatcher;

#[async_trait]
impl NotificationDispatcher for NullDispatcher {
    async fn dispatch(&self, notification: &Notification) -> DomainResult<()> {
        debug!(
            recipient = %notification.recipient,
            title = %notification.title,
            "dropping notification (no gateway configured)"
        );
        Ok(())
    }
}
