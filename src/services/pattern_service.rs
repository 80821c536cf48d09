//! Pattern recalculation orchestration.
//!
//! Three triggers feed the calculator: the weekly sweep over every pair with
//! recent activity, milestone sample counts on the logging path, and explicit
//! user requests through the preference API. All three end in the same
//! wholesale replacement of the pattern store entries.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::SchedulerConfig;
use crate::domain::ports::{GroupRepository, PatternRepository, ProgressRepository};
use crate::services::pattern_calculator::{PatternCalculator, PatternOutcome};

/// Sample counts at which the logging path asks for an early recalculation,
/// so new users get a pattern before the first weekly sweep reaches them.
const MILESTONE_SAMPLE_COUNTS: [u64; 4] = [5, 10, 20, 30];

#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SweepSummary {
    pub pairs: usize,
    pub recalculated: usize,
    pub insufficient: usize,
    pub failures: usize,
}

pub struct PatternService {
    patterns: Arc<dyn PatternRepository>,
    progress: Arc<dyn ProgressRepository>,
    groups: Arc<dyn GroupRepository>,
    calculator: PatternCalculator,
    lookback_days: u32,
}

impl PatternService {
    pub fn new(
        patterns: Arc<dyn PatternRepository>,
        progress: Arc<dyn ProgressRepository>,
        groups: Arc<dyn GroupRepository>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            patterns,
            progress,
            groups,
            calculator: PatternCalculator::new(config),
            lookback_days: config.pattern_lookback_days,
        }
    }

    /// Recalculate one (user, goal) and replace its store entries.
    ///
    /// Insufficient history clears any stale entries and reports the fact;
    /// it is an expected outcome, not an error.
    pub async fn recalculate(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<PatternOutcome> {
        let user = self
            .groups
            .get_user(user_id)
            .await?
            .ok_or(DomainError::UserNotFound(user_id))?;

        let since = now - Duration::days(i64::from(self.lookback_days));
        let timestamps = self.progress.log_timestamps(user_id, goal_id, since).await?;

        let outcome = self
            .calculator
            .calculate(user_id, goal_id, &timestamps, user.timezone, now);

        match &outcome {
            PatternOutcome::Computed(patterns) => {
                self.patterns.replace_for_goal(user_id, goal_id, patterns).await?;
            }
            PatternOutcome::InsufficientData { .. } => {
                self.patterns.replace_for_goal(user_id, goal_id, &[]).await?;
            }
        }
        Ok(outcome)
    }

    /// Hook for the logging path: recalculate early when the lifetime sample
    /// count crosses a milestone.
    pub async fn maybe_recalculate_on_milestone(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<PatternOutcome>> {
        let count = self.progress.log_count(user_id, goal_id).await?;
        if !MILESTONE_SAMPLE_COUNTS.contains(&count) {
            return Ok(None);
        }
        self.recalculate(user_id, goal_id, now).await.map(Some)
    }

    /// Weekly sweep over every pair with at least one log in the lookback
    /// window. Per-pair failures are counted and skipped.
    pub async fn run_sweep(&self, now: DateTime<Utc>) -> DomainResult<SweepSummary> {
        let since = now - Duration::days(i64::from(self.lookback_days));
        let pairs = self.progress.pairs_logged_since(since).await?;

        let mut summary = SweepSummary { pairs: pairs.len(), ..Default::default() };
        for (user_id, goal_id) in pairs {
            match self.recalculate(user_id, goal_id, now).await {
                Ok(PatternOutcome::Computed(_)) => summary.recalculated += 1,
                Ok(PatternOutcome::InsufficientData { .. }) => summary.insufficient += 1,
                Err(err) => {
                    warn!(
                        user_id = %user_id,
                        goal_id = %goal_id,
                        error = %err,
                        "pattern recalculation failed"
                    );
                    summary.failures += 1;
                }
            }
        }

        info!(
            pairs = summary.pairs,
            recalculated = summary.recalculated,
            insufficient = summary.insufficient,
            failures = summary.failures,
            "pattern sweep complete"
        );
        Ok(summary)
    }
}
