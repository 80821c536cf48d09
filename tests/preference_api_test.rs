mod helpers;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use sqlx::SqlitePool;
use tower::ServiceExt;
use uuid::Uuid;

use pursue_reminders::adapters::push::NullDispatcher;
use pursue_reminders::adapters::sqlite::{
    SqliteGroupRepository, SqlitePatternRepository, SqlitePreferenceRepository,
    SqliteProgressRepository, SqliteReminderRepository,
};
use pursue_reminders::domain::models::SchedulerConfig;
use pursue_reminders::domain::ports::{
    GroupRepository, NotificationDispatcher, PatternRepository, PreferenceRepository,
    ProgressRepository, ReminderRepository,
};
use pursue_reminders::infrastructure::http::{build_router, AppState};
use pursue_reminders::services::{EffectivenessService, PatternService, ReminderBatchService};

use helpers::database::{seed_goal, seed_membership, seed_user, setup_test_db};

const TOKEN: &str = "test-job-token";

fn test_router(pool: &SqlitePool) -> Router {
    let groups: Arc<dyn GroupRepository> = Arc::new(SqliteGroupRepository::new(pool.clone()));
    let progress: Arc<dyn ProgressRepository> = Arc::new(SqliteProgressRepository::new(pool.clone()));
    let patterns: Arc<dyn PatternRepository> = Arc::new(SqlitePatternRepository::new(pool.clone()));
    let preferences: Arc<dyn PreferenceRepository> =
        Arc::new(SqlitePreferenceRepository::new(pool.clone()));
    let reminders: Arc<dyn ReminderRepository> =
        Arc::new(SqliteReminderRepository::new(pool.clone()));
    let dispatcher: Arc<dyn NotificationDispatcher> = Arc::new(NullDispatcher);

    let config = SchedulerConfig::default();
    let state = AppState {
        batch: Arc::new(ReminderBatchService::new(
            groups.clone(),
            progress.clone(),
            patterns.clone(),
            preferences.clone(),
            reminders.clone(),
            dispatcher,
            config.clone(),
        )),
        pattern_service: Arc::new(PatternService::new(
            patterns.clone(),
            progress.clone(),
            groups.clone(),
            &config,
        )),
        effectiveness: Arc::new(EffectivenessService::new(reminders, progress, config)),
        preferences,
        patterns,
        groups,
        auth_token: Arc::from(TOKEN),
    };
    build_router(state)
}

fn authed(request: axum::http::request::Builder) -> axum::http::request::Builder {
    request.header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let pool = setup_test_db().await;
    let router = test_router(&pool);

    let response = router
        .clone()
        .oneshot(Request::post("/jobs/reminders").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .clone()
        .oneshot(
            Request::post("/jobs/reminders")
                .header(header::AUTHORIZATION, "Bearer wrong-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The health probe stays open
    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_reminder_job_returns_summary() {
    let pool = setup_test_db().await;
    let router = test_router(&pool);

    let response = router
        .oneshot(authed(Request::post("/jobs/reminders")).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["selected"], 0);
    assert_eq!(body["failures"], 0);
}

#[tokio::test]
async fn test_get_preferences_shows_defaults_until_stored() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "Mia", "Pacific/Auckland").await;
    let goal = seed_goal(&pool, "Morning run").await;
    seed_membership(&pool, goal, user, 0).await;
    let router = test_router(&pool);

    let response = router
        .clone()
        .oneshot(
            authed(Request::get(format!("/users/{user}/reminder-preferences")))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let goals = body["goals"].as_array().unwrap();
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0]["goal_name"], "Morning run");
    assert_eq!(goals[0]["stored"], false);
    assert_eq!(goals[0]["preference"]["mode"], "smart");
    assert_eq!(goals[0]["preference"]["aggressiveness"], "balanced");
    assert!(goals[0]["pattern_summary"].is_null());
}

#[tokio::test]
async fn test_patch_preference_is_partial() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "Mia", "Pacific/Auckland").await;
    let goal = seed_goal(&pool, "Morning run").await;
    seed_membership(&pool, goal, user, 0).await;
    let router = test_router(&pool);

    let uri = format!("/users/{user}/goals/{goal}/reminder-preference");

    let response = router
        .clone()
        .oneshot(
            authed(Request::patch(uri.as_str()))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"aggressiveness": "persistent"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Second partial edit must not clobber the first
    let response = router
        .clone()
        .oneshot(
            authed(Request::patch(uri.as_str()))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"mode": "fixed", "fixed_hour": 8, "quiet_hours": {"start_hour": 22, "end_hour": 7}}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["mode"], "fixed");
    assert_eq!(body["fixed_hour"], 8);
    assert_eq!(body["aggressiveness"], "persistent");
    assert_eq!(body["quiet_hours"]["start_hour"], 22);
}

#[tokio::test]
async fn test_patch_rejects_unknown_enum_values() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "Mia", "Pacific/Auckland").await;
    let goal = seed_goal(&pool, "Morning run").await;
    seed_membership(&pool, goal, user, 0).await;
    let router = test_router(&pool);

    let response = router
        .oneshot(
            authed(Request::patch(format!("/users/{user}/goals/{goal}/reminder-preference")))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"mode": "aggressive"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("unknown mode"));
}

#[tokio::test]
async fn test_patch_unknown_user_is_404() {
    let pool = setup_test_db().await;
    let router = test_router(&pool);

    let response = router
        .oneshot(
            authed(Request::patch(format!(
                "/users/{}/goals/{}/reminder-preference",
                Uuid::new_v4(),
                Uuid::new_v4()
            )))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"enabled": false}"#))
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_forced_recalculation_reports_insufficient_data() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "Mia", "Pacific/Auckland").await;
    let goal = seed_goal(&pool, "Morning run").await;
    seed_membership(&pool, goal, user, 0).await;
    let router = test_router(&pool);

    let response = router
        .oneshot(
            authed(Request::post(format!("/users/{user}/goals/{goal}/pattern/recalculate")))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "insufficient_data");
    assert_eq!(body["samples"], 0);
}
