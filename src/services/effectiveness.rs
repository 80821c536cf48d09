//! Effectiveness back-fill job.
//!
//! Runs daily. A reminder was effective when the user logged progress for
//! that goal strictly after the send instant, on the reminder's recorded
//! local date. Comparing against the recorded local date (not a fixed
//! lookback window) means a 23:40 last-chance answered at 23:55 still counts
//! while a log the next morning does not.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ProgressLog, ReminderRecord, SchedulerConfig};
use crate::domain::ports::{ProgressRepository, ReminderRepository};

#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct EffectivenessSummary {
    pub scanned: usize,
    /// Records left unknown because their local day is still in progress
    pub deferred: usize,
    pub marked_effective: usize,
    pub marked_ineffective: usize,
}

pub struct EffectivenessService {
    reminders: Arc<dyn ReminderRepository>,
    progress: Arc<dyn ProgressRepository>,
    config: SchedulerConfig,
}

impl EffectivenessService {
    pub fn new(
        reminders: Arc<dyn ReminderRepository>,
        progress: Arc<dyn ProgressRepository>,
        config: SchedulerConfig,
    ) -> Self {
        Self { reminders, progress, config }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> DomainResult<EffectivenessSummary> {
        let cutoff = now - Duration::hours(i64::from(self.config.effectiveness_lookback_hours));
        let unresolved = self.reminders.unresolved_since(cutoff).await?;

        let mut summary = EffectivenessSummary {
            scanned: unresolved.len(),
            ..Default::default()
        };
        if unresolved.is_empty() {
            return Ok(summary);
        }

        let user_ids: Vec<Uuid> = unresolved
            .iter()
            .map(|r| r.user_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let earliest = unresolved
            .iter()
            .map(|r| r.sent_at)
            .min()
            .unwrap_or(cutoff);
        let logs = self.progress.logs_for_users_since(&user_ids, earliest).await?;

        let mut logs_by_pair: HashMap<(Uuid, Uuid), Vec<&ProgressLog>> = HashMap::new();
        for log in &logs {
            logs_by_pair.entry((log.user_id, log.goal_id)).or_default().push(log);
        }

        let mut effective = Vec::new();
        let mut ineffective = Vec::new();
        for record in &unresolved {
            // Judge a day only once it is over in the user's own timezone;
            // marking a same-day record ineffective would be premature and
            // the back-fill never revisits a resolved value.
            let local_today = now.with_timezone(&record.timezone).date_naive();
            if record.local_date >= local_today {
                summary.deferred += 1;
                continue;
            }

            if answered_same_day(record, &logs_by_pair) {
                effective.push(record.id);
            } else {
                ineffective.push(record.id);
            }
        }

        summary.marked_effective = effective.len();
        summary.marked_ineffective = ineffective.len();
        self.reminders.set_effectiveness(&effective, &ineffective).await?;

        info!(
            scanned = summary.scanned,
            effective = summary.marked_effective,
            ineffective = summary.marked_ineffective,
            deferred = summary.deferred,
            "effectiveness update complete"
        );
        Ok(summary)
    }
}

fn answered_same_day(
    record: &ReminderRecord,
    logs_by_pair: &HashMap<(Uuid, Uuid), Vec<&ProgressLog>>,
) -> bool {
    let Some(logs) = logs_by_pair.get(&(record.user_id, record.goal_id)) else {
        return false;
    };
    logs.iter().any(|log| {
        log.logged_at > record.sent_at
            && log.logged_at.with_timezone(&record.timezone).date_naive() == record.local_date
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ReminderTier;
    use chrono::TimeZone;

    fn record_at(sent_at: DateTime<Utc>) -> ReminderRecord {
        ReminderRecord::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            ReminderTier::LastChance,
            sent_at,
            chrono_tz::Pacific::Auckland,
            None,
        )
    }

    fn log_for(record: &ReminderRecord, logged_at: DateTime<Utc>) -> ProgressLog {
        ProgressLog {
            id: Uuid::new_v4(),
            goal_id: record.goal_id,
            user_id: record.user_id,
            logged_at,
        }
    }

    #[test]
    fn test_same_local_day_response_counts() {
        // 22:30 Auckland on June 10 is 10:30 UTC
        let sent = Utc.with_ymd_and_hms(2025, 6, 10, 10, 30, 0).unwrap();
        let record = record_at(sent);
        // 23:55 local, still June 10 in Auckland
        let log = log_for(&record, Utc.with_ymd_and_hms(2025, 6, 10, 11, 55, 0).unwrap());

        let mut by_pair = HashMap::new();
        by_pair.insert((record.user_id, record.goal_id), vec![&log]);
        assert!(answered_same_day(&record, &by_pair));
    }

    #[test]
    fn test_next_morning_response_does_not_count() {
        let sent = Utc.with_ymd_and_hms(2025, 6, 10, 10, 30, 0).unwrap();
        let record = record_at(sent);
        // 08:00 local on June 11
        let log = log_for(&record, Utc.with_ymd_and_hms(2025, 6, 10, 20, 0, 0).unwrap());

        let mut by_pair = HashMap::new();
        by_pair.insert((record.user_id, record.goal_id), vec![&log]);
        assert!(!answered_same_day(&record, &by_pair));
    }

    #[test]
    fn test_log_before_reminder_does_not_count() {
        let sent = Utc.with_ymd_and_hms(2025, 6, 10, 10, 30, 0).unwrap();
        let record = record_at(sent);
        let log = log_for(&record, Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap());

        let mut by_pair = HashMap::new();
        by_pair.insert((record.user_id, record.goal_id), vec![&log]);
        assert!(!answered_same_day(&record, &by_pair));
    }

    #[test]
    fn test_other_goal_log_does_not_count() {
        let sent = Utc.with_ymd_and_hms(2025, 6, 10, 10, 30, 0).unwrap();
        let record = record_at(sent);
        let mut other = log_for(&record, Utc.with_ymd_and_hms(2025, 6, 10, 11, 0, 0).unwrap());
        other.goal_id = Uuid::new_v4();

        let mut by_pair = HashMap::new();
        by_pair.insert((other.user_id, other.goal_id), vec![&other]);
        assert!(!answered_same_day(&record, &by_pair));
    }
}
