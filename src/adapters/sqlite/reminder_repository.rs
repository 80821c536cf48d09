//! SQLite implementation of the ReminderRepository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Effectiveness, ReminderRecord, ReminderTier, SocialContext};
use crate::domain::ports::reminder_repository::{ReminderOutcome, SentReminder};
use crate::domain::ports::ReminderRepository;

use super::{parse_date, parse_datetime, parse_timezone, parse_uuid, placeholders};

#[derive(Clone)]
pub struct SqliteReminderRepository {
    pool: SqlitePool,
}

impl SqliteReminderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str =
    "id, user_id, goal_id, tier, sent_at, local_date, timezone, effectiveness, social_context";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl ReminderRepository for SqliteReminderRepository {
    async fn append(&self, record: &ReminderRecord) -> DomainResult<bool> {
        let social_json = record
            .social_context
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let result = sqlx::query(
            r#"INSERT INTO reminder_records
               (id, user_id, goal_id, tier, sent_at, local_date, timezone, effectiveness, social_context)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(record.id.to_string())
        .bind(record.user_id.to_string())
        .bind(record.goal_id.to_string())
        .bind(record.tier.as_str())
        .bind(record.sent_at.to_rfc3339())
        .bind(record.local_date.format("%Y-%m-%d").to_string())
        .bind(record.timezone.name())
        .bind(record.effectiveness.as_str())
        .bind(social_json)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) if is_unique_violation(&err) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn list_sent_on_dates(
        &self,
        user_ids: &[Uuid],
        dates: &[NaiveDate],
    ) -> DomainResult<Vec<SentReminder>> {
        if user_ids.is_empty() || dates.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT user_id, goal_id, tier, local_date FROM reminder_records
             WHERE user_id IN ({}) AND local_date IN ({})",
            placeholders(user_ids.len()),
            placeholders(dates.len())
        );

        let mut q = sqlx::query_as::<_, SentRow>(&query);
        for user_id in user_ids {
            q = q.bind(user_id.to_string());
        }
        for date in dates {
            q = q.bind(date.format("%Y-%m-%d").to_string());
        }

        let rows: Vec<SentRow> = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn outcomes_since(
        &self,
        user_ids: &[Uuid],
        since: NaiveDate,
    ) -> DomainResult<Vec<ReminderOutcome>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT user_id, goal_id, local_date, effectiveness FROM reminder_records
             WHERE user_id IN ({}) AND local_date >= ?",
            placeholders(user_ids.len())
        );

        let mut q = sqlx::query_as::<_, OutcomeRow>(&query);
        for user_id in user_ids {
            q = q.bind(user_id.to_string());
        }
        q = q.bind(since.format("%Y-%m-%d").to_string());

        let rows: Vec<OutcomeRow> = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn unresolved_since(&self, cutoff: DateTime<Utc>) -> DomainResult<Vec<ReminderRecord>> {
        let rows: Vec<RecordRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM reminder_records
             WHERE effectiveness = 'unknown' AND sent_at >= ? ORDER BY sent_at"
        ))
        .bind(cutoff.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn set_effectiveness(
        &self,
        effective: &[Uuid],
        ineffective: &[Uuid],
    ) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        for (ids, value) in [
            (effective, Effectiveness::Effective),
            (ineffective, Effectiveness::Ineffective),
        ] {
            if ids.is_empty() {
                continue;
            }
            let query = format!(
                "UPDATE reminder_records SET effectiveness = ? WHERE id IN ({}) AND effectiveness = 'unknown'",
                placeholders(ids.len())
            );
            let mut q = sqlx::query(&query).bind(value.as_str());
            for id in ids {
                q = q.bind(id.to_string());
            }
            q.execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct SentRow {
    user_id: String,
    goal_id: String,
    tier: String,
    local_date: String,
}

impl TryFrom<SentRow> for SentReminder {
    type Error = DomainError;

    fn try_from(row: SentRow) -> Result<Self, Self::Error> {
        let tier = ReminderTier::from_str(&row.tier)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid tier: {}", row.tier)))?;

        Ok(SentReminder {
            user_id: parse_uuid(&row.user_id)?,
            goal_id: parse_uuid(&row.goal_id)?,
            tier,
            local_date: parse_date(&row.local_date)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OutcomeRow {
    user_id: String,
    goal_id: String,
    local_date: String,
    effectiveness: String,
}

impl TryFrom<OutcomeRow> for ReminderOutcome {
    type Error = DomainError;

    fn try_from(row: OutcomeRow) -> Result<Self, Self::Error> {
        let effectiveness = Effectiveness::from_str(&row.effectiveness).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid effectiveness: {}", row.effectiveness))
        })?;

        Ok(ReminderOutcome {
            user_id: parse_uuid(&row.user_id)?,
            goal_id: parse_uuid(&row.goal_id)?,
            local_date: parse_date(&row.local_date)?,
            effectiveness,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: String,
    user_id: String,
    goal_id: String,
    tier: String,
    sent_at: String,
    local_date: String,
    timezone: String,
    effectiveness: String,
    social_context: Option<String>,
}

impl TryFrom<RecordRow> for ReminderRecord {
    type Error = DomainError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let tier = ReminderTier::from_str(&row.tier)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid tier: {}", row.tier)))?;

        let effectiveness = Effectiveness::from_str(&row.effectiveness).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid effectiveness: {}", row.effectiveness))
        })?;

        let social_context: Option<SocialContext> = row
            .social_context
            .map(|s| serde_json::from_str(&s))
            .transpose()?;

        Ok(ReminderRecord {
            id: parse_uuid(&row.id)?,
            user_id: parse_uuid(&row.user_id)?,
            goal_id: parse_uuid(&row.goal_id)?,
            tier,
            sent_at: parse_datetime(&row.sent_at)?,
            local_date: parse_date(&row.local_date)?,
            timezone: parse_timezone(&row.timezone)?,
            effectiveness,
            social_context,
        })
    }
}
