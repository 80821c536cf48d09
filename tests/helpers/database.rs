//! Shared database fixtures for integration tests.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use pursue_reminders::adapters::sqlite::create_migrated_test_pool;

pub async fn setup_test_db() -> SqlitePool {
    create_migrated_test_pool()
        .await
        .expect("failed to create test database")
}

pub async fn seed_user(pool: &SqlitePool, display_name: &str, timezone: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, display_name, timezone, active, created_at) VALUES (?, ?, ?, 1, ?)",
    )
    .bind(id.to_string())
    .bind(display_name)
    .bind(timezone)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await
    .expect("failed to seed user");
    id
}

pub async fn seed_goal(pool: &SqlitePool, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO goals (id, name, cadence, active, created_at) VALUES (?, ?, 'daily', 1, ?)")
        .bind(id.to_string())
        .bind(name)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await
        .expect("failed to seed goal");
    id
}

pub async fn seed_membership(pool: &SqlitePool, goal_id: Uuid, user_id: Uuid, streak: u32) {
    sqlx::query(
        "INSERT INTO group_memberships (goal_id, user_id, status, current_streak, joined_at)
         VALUES (?, ?, 'approved', ?, ?)",
    )
    .bind(goal_id.to_string())
    .bind(user_id.to_string())
    .bind(i64::from(streak))
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await
    .expect("failed to seed membership");
}

pub async fn seed_reminder_record(
    pool: &SqlitePool,
    user_id: Uuid,
    goal_id: Uuid,
    tier: &str,
    sent_at: DateTime<Utc>,
    local_date: &str,
    timezone: &str,
    effectiveness: &str,
) {
    sqlx::query(
        "INSERT INTO reminder_records (id, user_id, goal_id, tier, sent_at, local_date, timezone, effectiveness)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id.to_string())
    .bind(goal_id.to_string())
    .bind(tier)
    .bind(sent_at.to_rfc3339())
    .bind(local_date)
    .bind(timezone)
    .bind(effectiveness)
    .execute(pool)
    .await
    .expect("failed to seed reminder record");
}

pub async fn seed_log(pool: &SqlitePool, goal_id: Uuid, user_id: Uuid, logged_at: DateTime<Utc>) {
    sqlx::query("INSERT INTO progress_logs (id, goal_id, user_id, logged_at) VALUES (?, ?, ?, ?)")
        .bind(Uuid::new_v4().to_string())
        .bind(goal_id.to_string())
        .bind(user_id.to_string())
        .bind(logged_at.to_rfc3339())
        .execute(pool)
        .await
        .expect("failed to seed progress log");
}
