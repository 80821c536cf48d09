mod helpers;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use sqlx::SqlitePool;

use pursue_reminders::adapters::sqlite::{SqliteProgressRepository, SqliteReminderRepository};
use pursue_reminders::domain::models::SchedulerConfig;
use pursue_reminders::services::EffectivenessService;

use helpers::database::{
    seed_goal, seed_log, seed_membership, seed_reminder_record, seed_user, setup_test_db,
};

fn service(pool: &SqlitePool) -> EffectivenessService {
    EffectivenessService::new(
        Arc::new(SqliteReminderRepository::new(pool.clone())),
        Arc::new(SqliteProgressRepository::new(pool.clone())),
        SchedulerConfig::default(),
    )
}

async fn effectiveness_of(pool: &SqlitePool, user: uuid::Uuid) -> Vec<String> {
    sqlx::query_as::<_, (String,)>(
        "SELECT effectiveness FROM reminder_records WHERE user_id = ? ORDER BY sent_at",
    )
    .bind(user.to_string())
    .fetch_all(pool)
    .await
    .unwrap()
    .into_iter()
    .map(|(e,)| e)
    .collect()
}

#[tokio::test]
async fn test_same_local_date_response_marks_effective() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "Mia", "Pacific/Auckland").await;
    let goal = seed_goal(&pool, "Run").await;
    seed_membership(&pool, goal, user, 0).await;

    // Last-chance at 22:30 Auckland on June 9 (10:30 UTC)
    seed_reminder_record(
        &pool,
        user,
        goal,
        "last_chance",
        Utc.with_ymd_and_hms(2025, 6, 9, 10, 30, 0).unwrap(),
        "2025-06-09",
        "Pacific/Auckland",
        "unknown",
    )
    .await;
    // Answered at 23:55 local, still June 9 in Auckland
    seed_log(&pool, goal, user, Utc.with_ymd_and_hms(2025, 6, 9, 11, 55, 0).unwrap()).await;

    let now = Utc.with_ymd_and_hms(2025, 6, 10, 9, 30, 0).unwrap();
    let summary = service(&pool).run(now).await.unwrap();

    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.marked_effective, 1);
    assert_eq!(effectiveness_of(&pool, user).await, vec!["effective"]);
}

#[tokio::test]
async fn test_next_morning_response_marks_ineffective() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "Mia", "Pacific/Auckland").await;
    let goal = seed_goal(&pool, "Run").await;
    seed_membership(&pool, goal, user, 0).await;

    seed_reminder_record(
        &pool,
        user,
        goal,
        "last_chance",
        Utc.with_ymd_and_hms(2025, 6, 9, 10, 30, 0).unwrap(),
        "2025-06-09",
        "Pacific/Auckland",
        "unknown",
    )
    .await;
    // 08:00 local on June 10: after the send instant but a different local
    // date, so the reminder did not do its job that day
    seed_log(&pool, goal, user, Utc.with_ymd_and_hms(2025, 6, 9, 20, 0, 0).unwrap()).await;

    let now = Utc.with_ymd_and_hms(2025, 6, 10, 9, 30, 0).unwrap();
    let summary = service(&pool).run(now).await.unwrap();

    assert_eq!(summary.marked_ineffective, 1);
    assert_eq!(effectiveness_of(&pool, user).await, vec!["ineffective"]);
}

#[tokio::test]
async fn test_records_from_an_unfinished_local_day_are_deferred() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "Mia", "Pacific/Auckland").await;
    let goal = seed_goal(&pool, "Run").await;
    seed_membership(&pool, goal, user, 0).await;

    // Sent at 17:00 Auckland today; the user may still log tonight
    seed_reminder_record(
        &pool,
        user,
        goal,
        "supportive",
        Utc.with_ymd_and_hms(2025, 6, 10, 5, 0, 0).unwrap(),
        "2025-06-10",
        "Pacific/Auckland",
        "unknown",
    )
    .await;

    let now = Utc.with_ymd_and_hms(2025, 6, 10, 9, 30, 0).unwrap();
    let summary = service(&pool).run(now).await.unwrap();

    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.deferred, 1);
    assert_eq!(summary.marked_effective + summary.marked_ineffective, 0);
    assert_eq!(effectiveness_of(&pool, user).await, vec!["unknown"]);
}
