//! Batch reminder orchestrator.
//!
//! A stateless unit of work invoked from the job endpoint every few minutes.
//! The run selects candidates, issues one bulk fetch per store, evaluates
//! the decision engine per candidate, dispatches positive decisions, and
//! records history. Overlapping runs are safe: the history table's
//! per-(user, goal, local date, tier) unique key makes the append the
//! serialization point, so no locking is needed between invocations.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    Effectiveness, LoggingPattern, PatternDay, ReminderPreference, ReminderRecord, ReminderTier,
    SchedulerConfig,
};
use crate::domain::ports::group_repository::CandidatePair;
use crate::domain::ports::reminder_repository::ReminderOutcome;
use crate::domain::ports::{
    GroupRepository, NotificationDispatcher, PatternRepository, PreferenceRepository,
    ProgressRepository, ReminderRepository,
};
use crate::services::decision_engine::{Decision, DecisionEngine, DecisionInput};
use crate::services::message_composer;
use crate::services::social_context::{SocialContextBuilder, SocialSnapshot};

/// Hours of progress logs fetched to answer "has this user logged today" for
/// any timezone relative to the server clock.
const TODAY_LOG_WINDOW_HOURS: i64 = 48;

/// Counters reported back to the trigger caller.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RunSummary {
    /// Pairs surviving selection, before the already-logged filter
    pub selected: usize,
    /// Pairs dropped because the user already logged in their local today
    pub already_logged: usize,
    /// Pairs the engine evaluated
    pub evaluated: usize,
    pub sent_gentle: u32,
    pub sent_supportive: u32,
    pub sent_last_chance: u32,
    /// Appends that lost the race against an overlapping run
    pub duplicates_suppressed: usize,
    /// Per-candidate failures (append or dispatch); never fatal to the run
    pub failures: usize,
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn total_sent(&self) -> u32 {
        self.sent_gentle + self.sent_supportive + self.sent_last_chance
    }

    fn record_sent(&mut self, tier: ReminderTier) {
        match tier {
            ReminderTier::Gentle => self.sent_gentle += 1,
            ReminderTier::Supportive => self.sent_supportive += 1,
            ReminderTier::LastChance => self.sent_last_chance += 1,
        }
    }
}

/// All bulk-fetched state for one run. Built once, then read-only during the
/// candidate loop; the only mutable piece is the running daily counter.
struct RunContext {
    patterns: HashMap<(Uuid, Uuid, i8), LoggingPattern>,
    preferences: HashMap<(Uuid, Uuid), ReminderPreference>,
    sent_today: HashMap<(Uuid, Uuid), HashSet<ReminderTier>>,
    daily_counts: HashMap<Uuid, u32>,
    suppression: HashMap<(Uuid, Uuid), u32>,
    social: SocialSnapshot,
}

enum CandidateOutcome {
    Sent(ReminderTier),
    DuplicateSuppressed,
    Skipped,
    DispatchFailed(ReminderTier),
}

pub struct ReminderBatchService {
    groups: Arc<dyn GroupRepository>,
    progress: Arc<dyn ProgressRepository>,
    patterns: Arc<dyn PatternRepository>,
    preferences: Arc<dyn PreferenceRepository>,
    reminders: Arc<dyn ReminderRepository>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    social: SocialContextBuilder,
    engine: DecisionEngine,
    config: SchedulerConfig,
}

impl ReminderBatchService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        groups: Arc<dyn GroupRepository>,
        progress: Arc<dyn ProgressRepository>,
        patterns: Arc<dyn PatternRepository>,
        preferences: Arc<dyn PreferenceRepository>,
        reminders: Arc<dyn ReminderRepository>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        config: SchedulerConfig,
    ) -> Self {
        let social = SocialContextBuilder::new(groups.clone(), progress.clone());
        let engine = DecisionEngine::new(config.clone());
        Self {
            groups,
            progress,
            patterns,
            preferences,
            reminders,
            dispatcher,
            social,
            engine,
            config,
        }
    }

    /// Execute one batch run against the clock value `now`.
    pub async fn run(&self, now: DateTime<Utc>) -> DomainResult<RunSummary> {
        let started = std::time::Instant::now();
        let mut summary = RunSummary::default();

        let candidates = self.select_candidates(now, &mut summary).await?;
        summary.evaluated = candidates.len();

        if candidates.is_empty() {
            summary.duration_ms = started.elapsed().as_millis() as u64;
            info!(selected = summary.selected, "reminder batch: nothing to evaluate");
            return Ok(summary);
        }

        let mut context = self.build_run_context(now, &candidates).await?;

        // Sequential per candidate; rows arrive ordered by user, so the
        // running daily counter sees each user's sends in order.
        for candidate in &candidates {
            match self.process_candidate(now, candidate, &mut context).await {
                Ok(CandidateOutcome::Sent(tier)) => summary.record_sent(tier),
                Ok(CandidateOutcome::DuplicateSuppressed) => summary.duplicates_suppressed += 1,
                Ok(CandidateOutcome::Skipped) => {}
                Ok(CandidateOutcome::DispatchFailed(tier)) => {
                    summary.record_sent(tier);
                    summary.failures += 1;
                }
                Err(err) => {
                    warn!(
                        user_id = %candidate.user_id,
                        goal_id = %candidate.goal_id,
                        error = %err,
                        "candidate processing failed"
                    );
                    summary.failures += 1;
                }
            }
        }

        summary.duration_ms = started.elapsed().as_millis() as u64;
        if summary.duration_ms > self.config.run_duration_warn_secs * 1000 {
            warn!(
                duration_ms = summary.duration_ms,
                evaluated = summary.evaluated,
                "reminder batch exceeded duration threshold"
            );
        }
        info!(
            evaluated = summary.evaluated,
            sent = summary.total_sent(),
            failures = summary.failures,
            duration_ms = summary.duration_ms,
            "reminder batch complete"
        );
        Ok(summary)
    }

    /// Select (user, goal) pairs still owing a log for their own local today.
    async fn select_candidates(
        &self,
        now: DateTime<Utc>,
        summary: &mut RunSummary,
    ) -> DomainResult<Vec<CandidatePair>> {
        let selected = self.groups.reminder_candidates().await?;
        summary.selected = selected.len();

        let mut user_zones: HashMap<Uuid, chrono_tz::Tz> = HashMap::new();
        for pair in &selected {
            user_zones.insert(pair.user_id, pair.timezone);
        }
        let user_ids: Vec<Uuid> = user_zones.keys().copied().collect();

        let logs = self
            .progress
            .logs_for_users_since(&user_ids, now - Duration::hours(TODAY_LOG_WINDOW_HOURS))
            .await?;

        // "Today" is the user's local date, never the server's.
        let mut logged_today: HashSet<(Uuid, Uuid)> = HashSet::new();
        for log in &logs {
            let Some(tz) = user_zones.get(&log.user_id) else { continue };
            let local_today = now.with_timezone(tz).date_naive();
            if log.logged_at.with_timezone(tz).date_naive() == local_today {
                logged_today.insert((log.user_id, log.goal_id));
            }
        }

        let candidates: Vec<CandidatePair> = selected
            .into_iter()
            .filter(|p| !logged_today.contains(&(p.user_id, p.goal_id)))
            .collect();
        summary.already_logged = summary.selected - candidates.len();
        Ok(candidates)
    }

    /// Issue every bulk fetch exactly once and assemble the run context.
    async fn build_run_context(
        &self,
        now: DateTime<Utc>,
        candidates: &[CandidatePair],
    ) -> DomainResult<RunContext> {
        let mut goal_names: HashMap<Uuid, String> = HashMap::new();
        let mut local_dates: HashSet<NaiveDate> = HashSet::new();
        let mut local_today: HashMap<Uuid, NaiveDate> = HashMap::new();

        for pair in candidates {
            goal_names.entry(pair.goal_id).or_insert_with(|| pair.goal_name.clone());
            let today = now.with_timezone(&pair.timezone).date_naive();
            local_dates.insert(today);
            local_today.insert(pair.user_id, today);
        }
        let user_ids: Vec<Uuid> = local_today.keys().copied().collect();
        let goal_ids: Vec<Uuid> = goal_names.keys().copied().collect();

        let dates: Vec<NaiveDate> = local_dates.into_iter().collect();
        let earliest = dates
            .iter()
            .min()
            .copied()
            .unwrap_or_else(|| now.date_naive());
        let suppression_since =
            earliest - Duration::days(i64::from(self.config.suppression_lookback_days));

        let (pattern_rows, preference_rows, sent_rows, outcome_rows, social) = futures::try_join!(
            self.patterns.list_for_users(&user_ids),
            self.preferences.list_for_users(&user_ids),
            self.reminders.list_sent_on_dates(&user_ids, &dates),
            self.reminders.outcomes_since(&user_ids, suppression_since),
            self.social.build(&goal_ids, &goal_names, now),
        )?;

        let mut patterns = HashMap::new();
        for pattern in pattern_rows {
            patterns.insert(
                (pattern.user_id, pattern.goal_id, pattern.day.as_i8()),
                pattern,
            );
        }

        let mut preferences = HashMap::new();
        for preference in preference_rows {
            preferences.insert((preference.user_id, preference.goal_id), preference);
        }

        // The date-keyed fetch can return another timezone's "today"; keep
        // only rows matching each user's own local date.
        let mut sent_today: HashMap<(Uuid, Uuid), HashSet<ReminderTier>> = HashMap::new();
        let mut daily_counts: HashMap<Uuid, u32> = HashMap::new();
        for row in sent_rows {
            if local_today.get(&row.user_id) != Some(&row.local_date) {
                continue;
            }
            sent_today
                .entry((row.user_id, row.goal_id))
                .or_default()
                .insert(row.tier);
            *daily_counts.entry(row.user_id).or_default() += 1;
        }

        Ok(RunContext {
            patterns,
            preferences,
            sent_today,
            daily_counts,
            suppression: consecutive_ineffective_days(&outcome_rows),
            social,
        })
    }

    async fn process_candidate(
        &self,
        now: DateTime<Utc>,
        candidate: &CandidatePair,
        context: &mut RunContext,
    ) -> DomainResult<CandidateOutcome> {
        let key = (candidate.user_id, candidate.goal_id);
        let local_weekday = now.with_timezone(&candidate.timezone).weekday();
        let weekday = PatternDay::from_weekday(local_weekday);

        // Day-specific pattern wins over the any-day aggregate.
        let pattern = context
            .patterns
            .get(&(candidate.user_id, candidate.goal_id, weekday.as_i8()))
            .or_else(|| {
                context
                    .patterns
                    .get(&(candidate.user_id, candidate.goal_id, PatternDay::AnyDay.as_i8()))
            });

        let defaults = ReminderPreference::defaults(candidate.user_id, candidate.goal_id);
        let preference = context.preferences.get(&key).unwrap_or(&defaults);

        let empty_tiers = HashSet::new();
        let tiers_sent_today = context.sent_today.get(&key).unwrap_or(&empty_tiers);

        let decision = self.engine.evaluate(&DecisionInput {
            now,
            timezone: candidate.timezone,
            preference,
            pattern,
            tiers_sent_today,
            user_daily_count: context
                .daily_counts
                .get(&candidate.user_id)
                .copied()
                .unwrap_or(0),
            consecutive_ineffective_days: context.suppression.get(&key).copied().unwrap_or(0),
        });

        let tier = match decision {
            Decision::Skip(reason) => {
                debug!(
                    user_id = %candidate.user_id,
                    goal_id = %candidate.goal_id,
                    ?reason,
                    "candidate skipped"
                );
                return Ok(CandidateOutcome::Skipped);
            }
            Decision::Send { tier, .. } => tier,
        };

        let social_context = context.social.context_for(candidate.goal_id, candidate.user_id);
        let record = ReminderRecord::new(
            candidate.user_id,
            candidate.goal_id,
            tier,
            now,
            candidate.timezone,
            social_context.clone(),
        );

        // Append before dispatching: the unique key decides which of two
        // overlapping runs owns this tier, and the loser stays silent.
        if !self.reminders.append(&record).await? {
            return Ok(CandidateOutcome::DuplicateSuppressed);
        }

        *context.daily_counts.entry(candidate.user_id).or_default() += 1;
        context.sent_today.entry(key).or_default().insert(tier);

        let notification = message_composer::compose(
            candidate.user_id,
            candidate.goal_id,
            &candidate.goal_name,
            tier,
            social_context.as_ref(),
        );

        if let Err(err) = self.dispatcher.dispatch(&notification).await {
            warn!(
                user_id = %candidate.user_id,
                goal_id = %candidate.goal_id,
                tier = tier.as_str(),
                error = %err,
                "notification dispatch failed"
            );
            return Ok(CandidateOutcome::DispatchFailed(tier));
        }

        Ok(CandidateOutcome::Sent(tier))
    }
}

/// Count, per (user, goal), how many consecutive recent reminder days were
/// entirely ineffective. Days whose records are still unresolved are skipped
/// at the head (typically today); an unresolved day deeper in the history
/// ends the count rather than inflating it.
fn consecutive_ineffective_days(outcomes: &[ReminderOutcome]) -> HashMap<(Uuid, Uuid), u32> {
    #[derive(Default)]
    struct DayStatus {
        any_effective: bool,
        any_unknown: bool,
    }

    let mut by_pair: HashMap<(Uuid, Uuid), HashMap<NaiveDate, DayStatus>> = HashMap::new();
    for outcome in outcomes {
        let status = by_pair
            .entry((outcome.user_id, outcome.goal_id))
            .or_default()
            .entry(outcome.local_date)
            .or_default();
        match outcome.effectiveness {
            Effectiveness::Effective => status.any_effective = true,
            Effectiveness::Unknown => status.any_unknown = true,
            Effectiveness::Ineffective => {}
        }
    }

    let mut result = HashMap::new();
    for (pair, days) in by_pair {
        let mut dates: Vec<NaiveDate> = days.keys().copied().collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));

        let mut count = 0_u32;
        for date in dates {
            let status = &days[&date];
            if status.any_unknown {
                if count == 0 {
                    continue;
                }
                break;
            }
            if status.any_effective {
                break;
            }
            count += 1;
        }
        result.insert(pair, count);
    }
    result
}
