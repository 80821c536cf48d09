//! Reminder decision engine.
//!
//! A deterministic, side-effect-free function from one candidate's inputs to
//! a send/no-send decision. The engine does no I/O and holds no state, so
//! candidates can be evaluated in any order within a batch run; the only
//! cross-candidate coupling (the per-user daily cap) is fed in through
//! `user_daily_count` by the orchestrator.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use std::collections::HashSet;

use crate::domain::models::{
    Aggressiveness, LoggingPattern, ReminderMode, ReminderPreference, ReminderTier,
    SchedulerConfig,
};

/// Everything the engine may consult for one candidate. All values come from
/// the run context's bulk-fetched maps; nothing here triggers a query.
#[derive(Debug)]
pub struct DecisionInput<'a> {
    pub now: DateTime<Utc>,
    pub timezone: Tz,
    pub preference: &'a ReminderPreference,
    /// Best pattern for the current local weekday (day-specific entry if one
    /// exists, otherwise the any-day aggregate), if any
    pub pattern: Option<&'a LoggingPattern>,
    /// Tiers already recorded for this (user, goal) on the user's local today
    pub tiers_sent_today: &'a HashSet<ReminderTier>,
    /// Reminders sent to this user today across all goals, including ones
    /// sent earlier in the same run
    pub user_daily_count: u32,
    /// Consecutive past days on which every reminder for this goal was
    /// ineffective
    pub consecutive_ineffective_days: u32,
}

/// Why the engine chose to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendReason {
    FixedHour,
    DefaultSchedule,
    PatternSchedule,
}

/// Why the engine stayed silent. Diagnostic only; never user-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    DailyCapReached,
    Disabled,
    QuietHours,
    HardSuppressed,
    SoftSuppressed,
    TierAlreadySent,
    NotYetEligible,
    DayClosed,
    NoFixedHourConfigured,
}

/// The engine's verdict for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Send { tier: ReminderTier, reason: SendReason },
    Skip(SkipReason),
}

impl Decision {
    pub fn tier(&self) -> Option<ReminderTier> {
        match self {
            Self::Send { tier, .. } => Some(*tier),
            Self::Skip(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: SchedulerConfig,
}

impl DecisionEngine {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Evaluate one candidate. Rules are ordered; the first match wins.
    pub fn evaluate(&self, input: &DecisionInput) -> Decision {
        let cfg = &self.config;

        if input.user_daily_count >= cfg.daily_cap {
            return Decision::Skip(SkipReason::DailyCapReached);
        }

        let pref = input.preference;
        if !pref.enabled || pref.mode == ReminderMode::Disabled {
            return Decision::Skip(SkipReason::Disabled);
        }

        let local = input.now.with_timezone(&input.timezone);
        let local_hour = local.hour() as u8;
        let hour_frac = f64::from(local.hour()) + f64::from(local.minute()) / 60.0;

        if let Some(quiet) = &pref.quiet_hours {
            if quiet.contains(local_hour) {
                return Decision::Skip(SkipReason::QuietHours);
            }
        }

        if input.consecutive_ineffective_days >= cfg.hard_suppression_days {
            return Decision::Skip(SkipReason::HardSuppressed);
        }
        let soft_suppressed = input.consecutive_ineffective_days >= cfg.soft_suppression_days;

        match pref.mode {
            ReminderMode::Fixed => self.evaluate_fixed(input, local_hour, soft_suppressed),
            ReminderMode::Smart => self.evaluate_smart(input, hour_frac, soft_suppressed),
            ReminderMode::Disabled => unreachable!("handled above"),
        }
    }

    /// Fixed mode sends a single gentle reminder at the user's chosen hour.
    /// It never escalates, so soft suppression silences it entirely.
    fn evaluate_fixed(
        &self,
        input: &DecisionInput,
        local_hour: u8,
        soft_suppressed: bool,
    ) -> Decision {
        if soft_suppressed {
            return Decision::Skip(SkipReason::SoftSuppressed);
        }

        let Some(fixed_hour) = input.preference.fixed_hour else {
            return Decision::Skip(SkipReason::NoFixedHourConfigured);
        };

        if local_hour != fixed_hour {
            return Decision::Skip(SkipReason::NotYetEligible);
        }
        if !input.tiers_sent_today.is_empty() {
            return Decision::Skip(SkipReason::TierAlreadySent);
        }

        Decision::Send { tier: ReminderTier::Gentle, reason: SendReason::FixedHour }
    }

    fn evaluate_smart(
        &self,
        input: &DecisionInput,
        hour_frac: f64,
        soft_suppressed: bool,
    ) -> Decision {
        let cfg = &self.config;
        let last_chance_start = f64::from(cfg.last_chance_start_hour);
        let last_chance_end = f64::from(cfg.last_chance_end_hour);

        if hour_frac >= last_chance_end {
            return Decision::Skip(SkipReason::DayClosed);
        }

        let usable_pattern = input
            .pattern
            .filter(|p| p.is_usable(cfg.min_confidence));

        let (gentle_start, supportive_start, reason) = match usable_pattern {
            Some(pattern) => {
                let window_end = f64::from(pattern.window_end_hour);
                let gap = match input.preference.aggressiveness {
                    Aggressiveness::Persistent => f64::from(cfg.persistent_gap_hours),
                    _ => f64::from(cfg.supportive_gap_hours),
                };
                // A window closing very late would push supportive past the
                // last-chance start; clamp so the escalation order holds.
                let supportive = (window_end + gap).min(last_chance_start);
                let gentle = window_end + f64::from(cfg.grace_hours);
                (gentle, supportive, SendReason::PatternSchedule)
            }
            None => (
                f64::from(cfg.fallback_gentle_hour),
                f64::from(cfg.fallback_supportive_hour),
                SendReason::DefaultSchedule,
            ),
        };

        // Highest tier whose eligibility time has passed. Tiers escalate and
        // never step back down, so a higher already-sent tier masks the ones
        // below it.
        let only_last_chance =
            soft_suppressed || input.preference.aggressiveness == Aggressiveness::Gentle;

        let candidate = if hour_frac >= last_chance_start {
            Some(ReminderTier::LastChance)
        } else if only_last_chance {
            None
        } else if hour_frac >= supportive_start {
            Some(ReminderTier::Supportive)
        } else if hour_frac >= gentle_start {
            Some(ReminderTier::Gentle)
        } else {
            None
        };

        let Some(tier) = candidate else {
            // Distinguish "suppression swallowed a lower tier" from plain
            // not-yet: an aggressiveness of Gentle is a user choice, not a
            // suppression outcome.
            return Decision::Skip(if soft_suppressed && hour_frac >= gentle_start.min(supportive_start) {
                SkipReason::SoftSuppressed
            } else {
                SkipReason::NotYetEligible
            });
        };

        if input.tiers_sent_today.contains(&tier) {
            return Decision::Skip(SkipReason::TierAlreadySent);
        }

        Decision::Send { tier, reason }
    }
}
