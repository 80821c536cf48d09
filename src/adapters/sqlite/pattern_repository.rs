//! SQLite implementation of the PatternRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{LoggingPattern, PatternDay};
use crate::domain::ports::PatternRepository;

use super::{parse_datetime, parse_uuid, placeholders};

#[derive(Clone)]
pub struct SqlitePatternRepository {
    pool: SqlitePool,
}

impl SqlitePatternRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PatternRepository for SqlitePatternRepository {
    async fn replace_for_goal(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        patterns: &[LoggingPattern],
    ) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM logging_patterns WHERE user_id = ? AND goal_id = ?")
            .bind(user_id.to_string())
            .bind(goal_id.to_string())
            .execute(&mut *tx)
            .await?;

        for pattern in patterns {
            sqlx::query(
                r#"INSERT INTO logging_patterns
                   (user_id, goal_id, day_of_week, window_start_hour, window_end_hour, confidence, sample_count, calculated_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(pattern.user_id.to_string())
            .bind(pattern.goal_id.to_string())
            .bind(i64::from(pattern.day.as_i8()))
            .bind(i64::from(pattern.window_start_hour))
            .bind(i64::from(pattern.window_end_hour))
            .bind(pattern.confidence)
            .bind(i64::from(pattern.sample_count))
            .bind(pattern.calculated_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        day: PatternDay,
    ) -> DomainResult<Option<LoggingPattern>> {
        let row: Option<PatternRow> = sqlx::query_as(
            "SELECT user_id, goal_id, day_of_week, window_start_hour, window_end_hour, confidence, sample_count, calculated_at
             FROM logging_patterns WHERE user_id = ? AND goal_id = ? AND day_of_week = ?",
        )
        .bind(user_id.to_string())
        .bind(goal_id.to_string())
        .bind(i64::from(day.as_i8()))
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn list_for_user(&self, user_id: Uuid) -> DomainResult<Vec<LoggingPattern>> {
        let rows: Vec<PatternRow> = sqlx::query_as(
            "SELECT user_id, goal_id, day_of_week, window_start_hour, window_end_hour, confidence, sample_count, calculated_at
             FROM logging_patterns WHERE user_id = ? ORDER BY goal_id, day_of_week",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn list_for_users(&self, user_ids: &[Uuid]) -> DomainResult<Vec<LoggingPattern>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT user_id, goal_id, day_of_week, window_start_hour, window_end_hour, confidence, sample_count, calculated_at
             FROM logging_patterns WHERE user_id IN ({})",
            placeholders(user_ids.len())
        );

        let mut q = sqlx::query_as::<_, PatternRow>(&query);
        for user_id in user_ids {
            q = q.bind(user_id.to_string());
        }

        let rows: Vec<PatternRow> = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }
}

#[derive(sqlx::FromRow)]
struct PatternRow {
    user_id: String,
    goal_id: String,
    day_of_week: i64,
    window_start_hour: i64,
    window_end_hour: i64,
    confidence: f64,
    sample_count: i64,
    calculated_at: String,
}

impl TryFrom<PatternRow> for LoggingPattern {
    type Error = DomainError;

    fn try_from(row: PatternRow) -> Result<Self, Self::Error> {
        let day = PatternDay::from_i8(row.day_of_week as i8).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid day_of_week: {}", row.day_of_week))
        })?;

        Ok(LoggingPattern {
            user_id: parse_uuid(&row.user_id)?,
            goal_id: parse_uuid(&row.goal_id)?,
            day,
            window_start_hour: row.window_start_hour as u8,
            window_end_hour: row.window_end_hour as u8,
            confidence: row.confidence,
            sample_count: row.sample_count as u32,
            calculated_at: parse_datetime(&row.calculated_at)?,
        })
    }
}
