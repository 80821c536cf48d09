//! Pattern store port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{LoggingPattern, PatternDay};

/// Repository interface for logging-pattern persistence.
///
/// There is exactly one entry per (user, goal, day) key. Recalculation
/// replaces a goal's entries wholesale; an empty slice clears them.
#[async_trait]
pub trait PatternRepository: Send + Sync {
    /// Atomically replace every pattern entry for one (user, goal).
    async fn replace_for_goal(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        patterns: &[LoggingPattern],
    ) -> DomainResult<()>;

    /// Get a single entry by key.
    async fn get(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        day: PatternDay,
    ) -> DomainResult<Option<LoggingPattern>>;

    /// All entries for one user, across goals.
    async fn list_for_user(&self, user_id: Uuid) -> DomainResult<Vec<LoggingPattern>>;

    /// Bulk fetch for a batch run: all entries for the given users.
    async fn list_for_users(&self, user_ids: &[Uuid]) -> DomainResult<Vec<LoggingPattern>>;
}
