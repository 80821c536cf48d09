//! Outbound notification port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainResult;

/// A composed notification ready for transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: Uuid,
    pub title: String,
    pub body: String,
    /// Structured payload for the client (goal id, tier, deep link target)
    pub metadata: serde_json::Value,
}

/// Transport interface to the external push collaborator.
///
/// A failed dispatch is returned as an error and must be treated as
/// non-fatal by callers; one candidate's failure never aborts a batch.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: &Notification) -> DomainResult<()>;
}
