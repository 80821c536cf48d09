//! SQLite implementation of the ProgressRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ProgressLog;
use crate::domain::ports::ProgressRepository;

use super::{parse_datetime, parse_uuid, placeholders};

#[derive(Clone)]
pub struct SqliteProgressRepository {
    pool: SqlitePool,
}

impl SqliteProgressRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProgressRepository for SqliteProgressRepository {
    async fn logs_for_users_since(
        &self,
        user_ids: &[Uuid],
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<ProgressLog>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT id, goal_id, user_id, logged_at FROM progress_logs
             WHERE user_id IN ({}) AND logged_at >= ?",
            placeholders(user_ids.len())
        );

        let mut q = sqlx::query_as::<_, LogRow>(&query);
        for user_id in user_ids {
            q = q.bind(user_id.to_string());
        }
        q = q.bind(since.to_rfc3339());

        let rows: Vec<LogRow> = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn logs_for_goals_since(
        &self,
        goal_ids: &[Uuid],
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<ProgressLog>> {
        if goal_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT id, goal_id, user_id, logged_at FROM progress_logs
             WHERE goal_id IN ({}) AND logged_at >= ?",
            placeholders(goal_ids.len())
        );

        let mut q = sqlx::query_as::<_, LogRow>(&query);
        for goal_id in goal_ids {
            q = q.bind(goal_id.to_string());
        }
        q = q.bind(since.to_rfc3339());

        let rows: Vec<LogRow> = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn log_timestamps(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<DateTime<Utc>>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT logged_at FROM progress_logs
             WHERE user_id = ? AND goal_id = ? AND logged_at >= ?
             ORDER BY logged_at",
        )
        .bind(user_id.to_string())
        .bind(goal_id.to_string())
        .bind(since.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|(s,)| parse_datetime(s)).collect()
    }

    async fn log_count(&self, user_id: Uuid, goal_id: Uuid) -> DomainResult<u64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM progress_logs WHERE user_id = ? AND goal_id = ?",
        )
        .bind(user_id.to_string())
        .bind(goal_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u64)
    }

    async fn pairs_logged_since(
        &self,
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<(Uuid, Uuid)>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT DISTINCT user_id, goal_id FROM progress_logs WHERE logged_at >= ?",
        )
        .bind(since.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|(u, g)| Ok((parse_uuid(u)?, parse_uuid(g)?)))
            .collect()
    }
}

#[derive(sqlx::FromRow)]
struct LogRow {
    id: String,
    goal_id: String,
    user_id: String,
    logged_at: String,
}

impl TryFrom<LogRow> for ProgressLog {
    type Error = DomainError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        Ok(ProgressLog {
            id: parse_uuid(&row.id)?,
            goal_id: parse_uuid(&row.goal_id)?,
            user_id: parse_uuid(&row.user_id)?,
            logged_at: parse_datetime(&row.logged_at)?,
        })
    }
}
