//! SQLite implementation of the GroupRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Goal, GoalCadence, MembershipStatus, ReminderMode, User};
use crate::domain::ports::group_repository::{CandidatePair, MemberRow};
use crate::domain::ports::GroupRepository;

use super::{parse_datetime, parse_timezone, parse_uuid, placeholders};

#[derive(Clone)]
pub struct SqliteGroupRepository {
    pool: SqlitePool,
}

impl SqliteGroupRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupRepository for SqliteGroupRepository {
    async fn reminder_candidates(&self) -> DomainResult<Vec<CandidatePair>> {
        // Pairs with an explicitly disabled preference are filtered here so
        // they never enter a batch; the decision engine re-checks anyway.
        let rows: Vec<CandidateRow> = sqlx::query_as(
            r#"SELECT m.user_id, m.goal_id, u.timezone, g.name AS goal_name
               FROM group_memberships m
               JOIN users u ON u.id = m.user_id AND u.active = 1
               JOIN goals g ON g.id = m.goal_id AND g.active = 1 AND g.cadence = ?
               LEFT JOIN reminder_preferences p
                 ON p.user_id = m.user_id AND p.goal_id = m.goal_id
               WHERE m.status = ?
                 AND (p.user_id IS NULL OR (p.enabled = 1 AND p.mode != ?))
               ORDER BY m.user_id, m.goal_id"#,
        )
        .bind(GoalCadence::Daily.as_str())
        .bind(MembershipStatus::Approved.as_str())
        .bind(ReminderMode::Disabled.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn members_of_goals(&self, goal_ids: &[Uuid]) -> DomainResult<Vec<MemberRow>> {
        if goal_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            r#"SELECT m.goal_id, m.user_id, u.display_name, u.timezone, m.current_streak
               FROM group_memberships m
               JOIN users u ON u.id = m.user_id
               WHERE m.status = '{}' AND m.goal_id IN ({})"#,
            MembershipStatus::Approved.as_str(),
            placeholders(goal_ids.len())
        );

        let mut q = sqlx::query_as::<_, MemberRowRaw>(&query);
        for goal_id in goal_ids {
            q = q.bind(goal_id.to_string());
        }

        let rows: Vec<MemberRowRaw> = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn get_user(&self, user_id: Uuid) -> DomainResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, display_name, timezone, active, created_at FROM users WHERE id = ?",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn get_goal(&self, goal_id: Uuid) -> DomainResult<Option<Goal>> {
        let row: Option<GoalRow> = sqlx::query_as(
            "SELECT id, name, cadence, active, created_at FROM goals WHERE id = ?",
        )
        .bind(goal_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn goals_for_user(&self, user_id: Uuid) -> DomainResult<Vec<Goal>> {
        let rows: Vec<GoalRow> = sqlx::query_as(
            r#"SELECT g.id, g.name, g.cadence, g.active, g.created_at
               FROM goals g
               JOIN group_memberships m ON m.goal_id = g.id
               WHERE m.user_id = ? AND m.status = 'approved'
               ORDER BY g.created_at"#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }
}

#[derive(sqlx::FromRow)]
struct CandidateRow {
    user_id: String,
    goal_id: String,
    timezone: String,
    goal_name: String,
}

impl TryFrom<CandidateRow> for CandidatePair {
    type Error = DomainError;

    fn try_from(row: CandidateRow) -> Result<Self, Self::Error> {
        Ok(CandidatePair {
            user_id: parse_uuid(&row.user_id)?,
            goal_id: parse_uuid(&row.goal_id)?,
            timezone: parse_timezone(&row.timezone)?,
            goal_name: row.goal_name,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MemberRowRaw {
    goal_id: String,
    user_id: String,
    display_name: String,
    timezone: String,
    current_streak: i64,
}

impl TryFrom<MemberRowRaw> for MemberRow {
    type Error = DomainError;

    fn try_from(row: MemberRowRaw) -> Result<Self, Self::Error> {
        Ok(MemberRow {
            goal_id: parse_uuid(&row.goal_id)?,
            user_id: parse_uuid(&row.user_id)?,
            display_name: row.display_name,
            timezone: parse_timezone(&row.timezone)?,
            current_streak: row.current_streak.max(0) as u32,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    display_name: String,
    timezone: String,
    active: bool,
    created_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: parse_uuid(&row.id)?,
            display_name: row.display_name,
            timezone: parse_timezone(&row.timezone)?,
            active: row.active,
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct GoalRow {
    id: String,
    name: String,
    cadence: String,
    active: bool,
    created_at: String,
}

impl TryFrom<GoalRow> for Goal {
    type Error = DomainError;

    fn try_from(row: GoalRow) -> Result<Self, Self::Error> {
        let cadence = GoalCadence::from_str(&row.cadence).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid cadence: {}", row.cadence))
        })?;

        Ok(Goal {
            id: parse_uuid(&row.id)?,
            name: row.name,
            cadence,
            active: row.active,
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}
