//! Social context builder.
//!
//! Aggregates group-completion data for a whole candidate set in two bulk
//! queries. Nothing here runs per candidate; the orchestrator calls `build`
//! once per run and then does map lookups.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{SocialContext, StreakHolder};
use crate::domain::ports::{GroupRepository, ProgressRepository};

/// How far back member logs are fetched. Two days covers every timezone's
/// notion of "today" relative to the server clock.
const LOG_WINDOW_HOURS: i64 = 48;

/// Per-goal aggregate plus per-member streaks for personalization.
#[derive(Debug, Default)]
pub struct SocialSnapshot {
    aggregates: HashMap<Uuid, GoalAggregate>,
    streaks: HashMap<(Uuid, Uuid), u32>,
}

#[derive(Debug, Clone)]
struct GoalAggregate {
    goal_name: String,
    member_count: u32,
    members_logged_today: u32,
    top_streak: Option<StreakHolder>,
}

impl SocialSnapshot {
    /// Personalized context for one candidate, or None when the goal had no
    /// membership rows (deleted group racing the batch).
    pub fn context_for(&self, goal_id: Uuid, user_id: Uuid) -> Option<SocialContext> {
        let aggregate = self.aggregates.get(&goal_id)?;
        let member_count = aggregate.member_count;
        Some(SocialContext {
            goal_id,
            goal_name: aggregate.goal_name.clone(),
            member_count,
            members_logged_today: aggregate.members_logged_today,
            completion_fraction: if member_count == 0 {
                0.0
            } else {
                f64::from(aggregate.members_logged_today) / f64::from(member_count)
            },
            top_streak: aggregate.top_streak.clone(),
            own_streak: self.streaks.get(&(goal_id, user_id)).copied().unwrap_or(0),
        })
    }
}

pub struct SocialContextBuilder {
    groups: Arc<dyn GroupRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl SocialContextBuilder {
    pub fn new(groups: Arc<dyn GroupRepository>, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { groups, progress }
    }

    /// Build the snapshot for the full goal set of one batch run.
    ///
    /// `goal_names` comes from the already-fetched candidate rows so no
    /// extra goal lookup is needed.
    pub async fn build(
        &self,
        goal_ids: &[Uuid],
        goal_names: &HashMap<Uuid, String>,
        now: DateTime<Utc>,
    ) -> DomainResult<SocialSnapshot> {
        let members = self.groups.members_of_goals(goal_ids).await?;
        let logs = self
            .progress
            .logs_for_goals_since(goal_ids, now - Duration::hours(LOG_WINDOW_HOURS))
            .await?;

        // Membership is needed to interpret a log: "today" is the member's
        // own local date, so index timezones first.
        let mut member_zones: HashMap<(Uuid, Uuid), chrono_tz::Tz> = HashMap::new();
        let mut streaks = HashMap::new();
        for member in &members {
            member_zones.insert((member.goal_id, member.user_id), member.timezone);
            streaks.insert((member.goal_id, member.user_id), member.current_streak);
        }

        let mut logged_today: HashMap<Uuid, std::collections::HashSet<Uuid>> = HashMap::new();
        for log in &logs {
            let Some(tz) = member_zones.get(&(log.goal_id, log.user_id)) else {
                continue;
            };
            let local_today = now.with_timezone(tz).date_naive();
            if log.logged_at.with_timezone(tz).date_naive() == local_today {
                logged_today.entry(log.goal_id).or_default().insert(log.user_id);
            }
        }

        let mut aggregates: HashMap<Uuid, GoalAggregate> = HashMap::new();
        for member in &members {
            let name = goal_names
                .get(&member.goal_id)
                .cloned()
                .unwrap_or_default();
            let entry = aggregates.entry(member.goal_id).or_insert_with(|| GoalAggregate {
                goal_name: name,
                member_count: 0,
                members_logged_today: 0,
                top_streak: None,
            });
            entry.member_count += 1;

            if member.current_streak > 0
                && entry
                    .top_streak
                    .as_ref()
                    .map_or(true, |top| member.current_streak > top.streak_days)
            {
                entry.top_streak = Some(StreakHolder {
                    user_id: member.user_id,
                    display_name: member.display_name.clone(),
                    streak_days: member.current_streak,
                });
            }
        }

        for (goal_id, users) in logged_today {
            if let Some(entry) = aggregates.get_mut(&goal_id) {
                entry.members_logged_today = users.len() as u32;
            }
        }

        Ok(SocialSnapshot { aggregates, streaks })
    }
}
