//! Preference API handlers.
//!
//! Consumed by the client application: read per-goal reminder settings with
//! a human-readable pattern summary, partially update one goal's settings,
//! and force a pattern recalculation. Enum values outside the closed sets
//! are rejected here, before anything reaches the decision engine.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::models::{
    Aggressiveness, LoggingPattern, PatternDay, PreferenceUpdate, QuietHours, ReminderMode,
    ReminderPreference,
};
use crate::services::PatternOutcome;

use super::state::AppState;
use super::ApiError;

#[derive(Debug, Serialize)]
pub struct GoalPreferenceView {
    pub goal_id: Uuid,
    pub goal_name: String,
    pub preference: ReminderPreference,
    /// Whether the preference row exists or the defaults are in effect
    pub stored: bool,
    pub pattern_summary: Option<String>,
    pub pattern: Option<LoggingPattern>,
}

#[derive(Debug, Serialize)]
pub struct UserPreferencesResponse {
    pub user_id: Uuid,
    pub goals: Vec<GoalPreferenceView>,
}

/// GET /users/:user_id/reminder-preferences
pub async fn list_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserPreferencesResponse>, ApiError> {
    state
        .groups
        .get_user(user_id)
        .await?
        .ok_or(DomainError::UserNotFound(user_id))?;

    let goals = state.groups.goals_for_user(user_id).await?;
    let stored: std::collections::HashMap<Uuid, ReminderPreference> = state
        .preferences
        .list_for_user(user_id)
        .await?
        .into_iter()
        .map(|p| (p.goal_id, p))
        .collect();

    let mut patterns: std::collections::HashMap<Uuid, LoggingPattern> = Default::default();
    for pattern in state.patterns.list_for_user(user_id).await? {
        // The any-day aggregate is the one summarized to users
        if pattern.day == PatternDay::AnyDay {
            patterns.insert(pattern.goal_id, pattern);
        }
    }

    let goals = goals
        .into_iter()
        .map(|goal| {
            let preference = stored
                .get(&goal.id)
                .cloned()
                .unwrap_or_else(|| ReminderPreference::defaults(user_id, goal.id));
            let pattern = patterns.get(&goal.id).cloned();
            GoalPreferenceView {
                goal_id: goal.id,
                goal_name: goal.name,
                stored: stored.contains_key(&goal.id),
                pattern_summary: pattern.as_ref().map(LoggingPattern::summary),
                pattern,
                preference,
            }
        })
        .collect();

    Ok(Json(UserPreferencesResponse { user_id, goals }))
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct QuietHoursBody {
    pub start_hour: u8,
    pub end_hour: u8,
}

/// Distinguishes an absent field from an explicit null: absent leaves the
/// stored value untouched, null clears it.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePreferenceBody {
    pub enabled: Option<bool>,
    pub mode: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub fixed_hour: Option<Option<u8>>,
    pub aggressiveness: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub quiet_hours: Option<Option<QuietHoursBody>>,
}

impl UpdatePreferenceBody {
    fn into_update(self) -> Result<PreferenceUpdate, ApiError> {
        let mode = self
            .mode
            .map(|m| {
                ReminderMode::from_str(&m)
                    .ok_or_else(|| ApiError::unprocessable(format!("unknown mode: {m}")))
            })
            .transpose()?;

        let aggressiveness = self
            .aggressiveness
            .map(|a| {
                Aggressiveness::from_str(&a)
                    .ok_or_else(|| ApiError::unprocessable(format!("unknown aggressiveness: {a}")))
            })
            .transpose()?;

        Ok(PreferenceUpdate {
            enabled: self.enabled,
            mode,
            fixed_hour: self.fixed_hour,
            aggressiveness,
            quiet_hours: self.quiet_hours.map(|outer| {
                outer.map(|q| QuietHours { start_hour: q.start_hour, end_hour: q.end_hour })
            }),
        })
    }
}

/// PATCH /users/:user_id/goals/:goal_id/reminder-preference
pub async fn update_preference(
    State(state): State<AppState>,
    Path((user_id, goal_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdatePreferenceBody>,
) -> Result<Json<ReminderPreference>, ApiError> {
    state
        .groups
        .get_user(user_id)
        .await?
        .ok_or(DomainError::UserNotFound(user_id))?;
    state
        .groups
        .get_goal(goal_id)
        .await?
        .ok_or(DomainError::GoalNotFound(goal_id))?;

    let update = body.into_update()?;

    let mut preference = state
        .preferences
        .get(user_id, goal_id)
        .await?
        .unwrap_or_else(|| ReminderPreference::defaults(user_id, goal_id));
    preference.apply(&update);
    preference
        .validate()
        .map_err(ApiError::unprocessable)?;

    state.preferences.upsert(&preference).await?;
    Ok(Json(preference))
}

/// POST /users/:user_id/goals/:goal_id/pattern/recalculate
pub async fn recalculate_pattern(
    State(state): State<AppState>,
    Path((user_id, goal_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError> {
    state
        .groups
        .get_goal(goal_id)
        .await?
        .ok_or(DomainError::GoalNotFound(goal_id))?;

    let outcome = state
        .pattern_service
        .recalculate(user_id, goal_id, Utc::now())
        .await?;

    let body = match outcome {
        PatternOutcome::Computed(patterns) => {
            let summary = patterns
                .iter()
                .find(|p| p.day == PatternDay::AnyDay)
                .map(LoggingPattern::summary);
            json!({
                "status": "recalculated",
                "summary": summary,
                "patterns": patterns,
            })
        }
        PatternOutcome::InsufficientData { samples, span_days } => json!({
            "status": "insufficient_data",
            "samples": samples,
            "span_days": span_days,
        }),
    };
    Ok(Json(body))
}
