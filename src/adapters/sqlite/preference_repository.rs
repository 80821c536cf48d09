//! SQLite implementation of the PreferenceRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Aggressiveness, QuietHours, ReminderMode, ReminderPreference};
use crate::domain::ports::PreferenceRepository;

use super::{parse_uuid, placeholders};

#[derive(Clone)]
pub struct SqlitePreferenceRepository {
    pool: SqlitePool,
}

impl SqlitePreferenceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str =
    "user_id, goal_id, enabled, mode, fixed_hour, aggressiveness, quiet_start_hour, quiet_end_hour";

#[async_trait]
impl PreferenceRepository for SqlitePreferenceRepository {
    async fn get(&self, user_id: Uuid, goal_id: Uuid) -> DomainResult<Option<ReminderPreference>> {
        let row: Option<PreferenceRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM reminder_preferences WHERE user_id = ? AND goal_id = ?"
        ))
        .bind(user_id.to_string())
        .bind(goal_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn list_for_user(&self, user_id: Uuid) -> DomainResult<Vec<ReminderPreference>> {
        let rows: Vec<PreferenceRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM reminder_preferences WHERE user_id = ? ORDER BY goal_id"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn list_for_users(&self, user_ids: &[Uuid]) -> DomainResult<Vec<ReminderPreference>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM reminder_preferences WHERE user_id IN ({})",
            placeholders(user_ids.len())
        );

        let mut q = sqlx::query_as::<_, PreferenceRow>(&query);
        for user_id in user_ids {
            q = q.bind(user_id.to_string());
        }

        let rows: Vec<PreferenceRow> = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn upsert(&self, preference: &ReminderPreference) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO reminder_preferences
               (user_id, goal_id, enabled, mode, fixed_hour, aggressiveness, quiet_start_hour, quiet_end_hour)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (user_id, goal_id) DO UPDATE SET
                 enabled = excluded.enabled,
                 mode = excluded.mode,
                 fixed_hour = excluded.fixed_hour,
                 aggressiveness = excluded.aggressiveness,
                 quiet_start_hour = excluded.quiet_start_hour,
                 quiet_end_hour = excluded.quiet_end_hour"#,
        )
        .bind(preference.user_id.to_string())
        .bind(preference.goal_id.to_string())
        .bind(preference.enabled)
        .bind(preference.mode.as_str())
        .bind(preference.fixed_hour.map(i64::from))
        .bind(preference.aggressiveness.as_str())
        .bind(preference.quiet_hours.map(|q| i64::from(q.start_hour)))
        .bind(preference.quiet_hours.map(|q| i64::from(q.end_hour)))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct PreferenceRow {
    user_id: String,
    goal_id: String,
    enabled: bool,
    mode: String,
    fixed_hour: Option<i64>,
    aggressiveness: String,
    quiet_start_hour: Option<i64>,
    quiet_end_hour: Option<i64>,
}

impl TryFrom<PreferenceRow> for ReminderPreference {
    type Error = DomainError;

    fn try_from(row: PreferenceRow) -> Result<Self, Self::Error> {
        let mode = ReminderMode::from_str(&row.mode)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid mode: {}", row.mode)))?;

        let aggressiveness = Aggressiveness::from_str(&row.aggressiveness).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid aggressiveness: {}", row.aggressiveness))
        })?;

        let quiet_hours = match (row.quiet_start_hour, row.quiet_end_hour) {
            (Some(start), Some(end)) => Some(QuietHours {
                start_hour: start as u8,
                end_hour: end as u8,
            }),
            _ => None,
        };

        Ok(ReminderPreference {
            user_id: parse_uuid(&row.user_id)?,
            goal_id: parse_uuid(&row.goal_id)?,
            enabled: row.enabled,
            mode,
            fixed_hour: row.fixed_hour.map(|h| h as u8),
            aggressiveness,
            quiet_hours,
        })
    }
}
