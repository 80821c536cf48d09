mod helpers;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use sqlx::SqlitePool;

use pursue_reminders::adapters::sqlite::{
    SqliteGroupRepository, SqlitePatternRepository, SqliteProgressRepository,
};
use pursue_reminders::domain::models::{PatternDay, SchedulerConfig};
use pursue_reminders::domain::ports::PatternRepository;
use pursue_reminders::services::{PatternOutcome, PatternService};

use helpers::database::{seed_goal, seed_log, seed_membership, seed_user, setup_test_db};

fn pattern_service(pool: &SqlitePool) -> PatternService {
    PatternService::new(
        Arc::new(SqlitePatternRepository::new(pool.clone())),
        Arc::new(SqliteProgressRepository::new(pool.clone())),
        Arc::new(SqliteGroupRepository::new(pool.clone())),
        &SchedulerConfig::default(),
    )
}

#[tokio::test]
async fn test_recalculate_stores_local_morning_window() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "Mia", "Pacific/Auckland").await;
    let goal = seed_goal(&pool, "Morning run").await;
    seed_membership(&pool, goal, user, 0).await;

    // Ten logs at 19:00 UTC, which is 07:00 NZST the following morning
    for day in 1..=10 {
        seed_log(&pool, goal, user, Utc.with_ymd_and_hms(2025, 6, day, 19, 0, 0).unwrap()).await;
    }

    let service = pattern_service(&pool);
    let now = Utc.with_ymd_and_hms(2025, 6, 12, 0, 0, 0).unwrap();
    let outcome = service.recalculate(user, goal, now).await.unwrap();

    let patterns = match outcome {
        PatternOutcome::Computed(patterns) => patterns,
        other => panic!("expected a pattern, got {other:?}"),
    };
    let any_day = patterns.iter().find(|p| p.day == PatternDay::AnyDay).unwrap();
    assert_eq!(any_day.window_start_hour, 7);
    assert_eq!(any_day.sample_count, 10);

    // And it landed in the store
    let repo = SqlitePatternRepository::new(pool.clone());
    let stored = repo.get(user, goal, PatternDay::AnyDay).await.unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_insufficient_history_clears_stale_entries() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "Mia", "UTC").await;
    let goal = seed_goal(&pool, "Read").await;
    seed_membership(&pool, goal, user, 0).await;

    // A stale pattern from a previously active period
    let repo = SqlitePatternRepository::new(pool.clone());
    repo.replace_for_goal(
        user,
        goal,
        &[pursue_reminders::domain::models::LoggingPattern {
            user_id: user,
            goal_id: goal,
            day: PatternDay::AnyDay,
            window_start_hour: 8,
            window_end_hour: 10,
            confidence: 0.9,
            sample_count: 25,
            calculated_at: Utc::now(),
        }],
    )
    .await
    .unwrap();

    // Only three recent logs
    for day in 8..=10 {
        seed_log(&pool, goal, user, Utc.with_ymd_and_hms(2025, 6, day, 8, 0, 0).unwrap()).await;
    }

    let service = pattern_service(&pool);
    let now = Utc.with_ymd_and_hms(2025, 6, 12, 0, 0, 0).unwrap();
    let outcome = service.recalculate(user, goal, now).await.unwrap();

    assert!(matches!(outcome, PatternOutcome::InsufficientData { samples: 3, .. }));
    assert!(repo.get(user, goal, PatternDay::AnyDay).await.unwrap().is_none());
}

#[tokio::test]
async fn test_milestone_hook_fires_only_at_milestones() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "Mia", "UTC").await;
    let goal = seed_goal(&pool, "Stretch").await;
    seed_membership(&pool, goal, user, 0).await;

    // Five logs across eight days: exactly the first milestone
    for day in [1, 2, 4, 6, 8] {
        seed_log(&pool, goal, user, Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap()).await;
    }

    let service = pattern_service(&pool);
    let now = Utc.with_ymd_and_hms(2025, 6, 9, 0, 0, 0).unwrap();

    let outcome = service.maybe_recalculate_on_milestone(user, goal, now).await.unwrap();
    assert!(matches!(outcome, Some(PatternOutcome::Computed(_))));

    // A sixth log moves the count off the milestone; the hook stays quiet
    seed_log(&pool, goal, user, Utc.with_ymd_and_hms(2025, 6, 9, 12, 0, 0).unwrap()).await;
    let outcome = service.maybe_recalculate_on_milestone(user, goal, now).await.unwrap();
    assert!(outcome.is_none());
}

#[tokio::test]
async fn test_sweep_covers_all_recently_active_pairs() {
    let pool = setup_test_db().await;
    let active = seed_user(&pool, "Mia", "UTC").await;
    let sparse = seed_user(&pool, "Sam", "UTC").await;
    let goal = seed_goal(&pool, "Run").await;
    seed_membership(&pool, goal, active, 0).await;
    seed_membership(&pool, goal, sparse, 0).await;

    for day in 1..=10 {
        seed_log(&pool, goal, active, Utc.with_ymd_and_hms(2025, 6, day, 7, 0, 0).unwrap()).await;
    }
    seed_log(&pool, goal, sparse, Utc.with_ymd_and_hms(2025, 6, 5, 7, 0, 0).unwrap()).await;

    let service = pattern_service(&pool);
    let now = Utc.with_ymd_and_hms(2025, 6, 12, 0, 0, 0).unwrap();
    let summary = service.run_sweep(now).await.unwrap();

    assert_eq!(summary.pairs, 2);
    assert_eq!(summary.recalculated, 1);
    assert_eq!(summary.insufficient, 1);
    assert_eq!(summary.failures, 0);
}
