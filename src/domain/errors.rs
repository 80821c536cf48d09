//! Domain errors for the reminder scheduling system.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Goal not found: {0}")]
    GoalNotFound(Uuid),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Notification dispatch failed for user {user_id}: {reason}")]
    DispatchFailed { user_id: Uuid, reason: String },
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
