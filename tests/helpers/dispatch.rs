//! Test doubles for the notification dispatcher port.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use pursue_reminders::domain::errors::{DomainError, DomainResult};
use pursue_reminders::domain::ports::{Notification, NotificationDispatcher};

/// Captures every dispatched notification for assertions.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingDispatcher {
    pub fn new() -> (Arc<Self>, Arc<Mutex<Vec<Notification>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        (Arc::new(Self { sent: sent.clone() }), sent)
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn dispatch(&self, notification: &Notification) -> DomainResult<()> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Fails for one specific recipient, succeeds for everyone else.
pub struct FailingDispatcher {
    pub fail_for: Uuid,
    pub sent: Arc<Mutex<Vec<Notification>>>,
}

#[async_trait]
impl NotificationDispatcher for FailingDispatcher {
    async fn dispatch(&self, notification: &Notification) -> DomainResult<()> {
        if notification.recipient == self.fail_for {
            return Err(DomainError::DispatchFailed {
                user_id: notification.recipient,
                reason: "simulated gateway outage".to_string(),
            });
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
