//! Reminder history store port.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Effectiveness, ReminderRecord, ReminderTier};

/// Lightweight row for same-day gating: which tiers already fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentReminder {
    pub user_id: Uuid,
    pub goal_id: Uuid,
    pub tier: ReminderTier,
    pub local_date: NaiveDate,
}

/// Per-record outcome row for suppression computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderOutcome {
    pub user_id: Uuid,
    pub goal_id: Uuid,
    pub local_date: NaiveDate,
    pub effectiveness: Effectiveness,
}

/// Repository interface for the reminder history log.
///
/// Records are append-only; only the effectiveness field is ever updated,
/// and nothing is ever deleted. The (user, goal, local_date, tier) unique
/// index makes appends idempotent at tier granularity.
#[async_trait]
pub trait ReminderRepository: Send + Sync {
    /// Append an immutable record. Returns false when a record for the same
    /// (user, goal, local_date, tier) key already exists (the benign
    /// outcome of overlapping batch runs), true on a fresh insert.
    async fn append(&self, record: &ReminderRecord) -> DomainResult<bool>;

    /// Bulk fetch: everything sent to the given users on any of the given
    /// local dates. One query serves both per-goal tier gating and per-user
    /// daily totals.
    async fn list_sent_on_dates(
        &self,
        user_ids: &[Uuid],
        dates: &[NaiveDate],
    ) -> DomainResult<Vec<SentReminder>>;

    /// Bulk fetch: per-record outcomes for the given users since a local
    /// date, for consecutive-ineffective-day computation.
    async fn outcomes_since(
        &self,
        user_ids: &[Uuid],
        since: NaiveDate,
    ) -> DomainResult<Vec<ReminderOutcome>>;

    /// Records with unknown effectiveness sent at or after the cutoff.
    async fn unresolved_since(&self, cutoff: DateTime<Utc>) -> DomainResult<Vec<ReminderRecord>>;

    /// Batched effectiveness back-fill for the given record ids.
    async fn set_effectiveness(
        &self,
        effective: &[Uuid],
        ineffective: &[Uuid],
    ) -> DomainResult<()>;
}
