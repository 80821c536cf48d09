//! Job trigger endpoints.
//!
//! Each endpoint runs one externally scheduled job to completion and returns
//! its summary. The scheduler infrastructure (cron, cloud tasks) owns the
//! cadence; these handlers own nothing but the invocation.

use axum::extract::State;
use axum::Json;
use chrono::Utc;

use crate::services::{EffectivenessSummary, RunSummary, SweepSummary};

use super::state::AppState;
use super::ApiError;

/// POST /jobs/reminders: one batch run, short cadence.
pub async fn run_reminders(State(state): State<AppState>) -> Result<Json<RunSummary>, ApiError> {
    let summary = state.batch.run(Utc::now()).await?;
    Ok(Json(summary))
}

/// POST /jobs/patterns: weekly recalculation sweep.
pub async fn run_pattern_sweep(
    State(state): State<AppState>,
) -> Result<Json<SweepSummary>, ApiError> {
    let summary = state.pattern_service.run_sweep(Utc::now()).await?;
    Ok(Json(summary))
}

/// POST /jobs/effectiveness: daily effectiveness back-fill.
pub async fn run_effectiveness(
    State(state): State<AppState>,
) -> Result<Json<EffectivenessSummary>, ApiError> {
    let summary = state.effectiveness.run(Utc::now()).await?;
    Ok(Json(summary))
}
