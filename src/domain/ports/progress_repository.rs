//! Progress log read port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::ProgressLog;

/// Read interface over progress logs.
///
/// Logs are written by the application's logging path; this crate only reads
/// them. The bulk methods are keyed by id sets so a batch run issues each
/// exactly once.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// All logs by the given users at or after the instant.
    async fn logs_for_users_since(
        &self,
        user_ids: &[Uuid],
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<ProgressLog>>;

    /// All logs against the given goals at or after the instant, for the
    /// social context builder.
    async fn logs_for_goals_since(
        &self,
        goal_ids: &[Uuid],
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<ProgressLog>>;

    /// Log instants for one (user, goal) at or after the instant, oldest
    /// first. The pattern calculator's sample source.
    async fn log_timestamps(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<DateTime<Utc>>>;

    /// Lifetime log count for one (user, goal), for milestone checks.
    async fn log_count(&self, user_id: Uuid, goal_id: Uuid) -> DomainResult<u64>;

    /// Distinct (user, goal) pairs with at least one log since the instant:
    /// the weekly recalculation sweep's work list.
    async fn pairs_logged_since(
        &self,
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<(Uuid, Uuid)>>;
}
