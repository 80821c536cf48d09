//! Reminder domain model.
//!
//! A reminder record is created once at send time and never deleted. It is
//! both an audit trail and an anti-gaming measure: deleting progress history
//! must not free up reminder quota. Only the effectiveness field is ever
//! mutated afterwards, by the effectiveness updater.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::social::SocialContext;

/// Escalation tier of a reminder.
///
/// Tiers escalate over the day and never de-escalate: once a higher tier has
/// fired for a goal, lower tiers stay silent until the next local date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderTier {
    /// First nudge after the user's usual logging window has passed
    Gentle,
    /// Follow-up with social framing
    Supportive,
    /// Final late-evening reminder before the day closes
    LastChance,
}

impl ReminderTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gentle => "gentle",
            Self::Supportive => "supportive",
            Self::LastChance => "last_chance",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "gentle" => Some(Self::Gentle),
            "supportive" => Some(Self::Supportive),
            "last_chance" => Some(Self::LastChance),
            _ => None,
        }
    }
}

/// Whether a reminder preceded a same-day progress log.
///
/// Unknown until the effectiveness updater has evaluated the record; the
/// updater only ever moves Unknown to Effective or Ineffective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effectiveness {
    Unknown,
    Effective,
    Ineffective,
}

impl Effectiveness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Effective => "effective",
            Self::Ineffective => "ineffective",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "unknown" => Some(Self::Unknown),
            "effective" => Some(Self::Effective),
            "ineffective" => Some(Self::Ineffective),
            _ => None,
        }
    }
}

/// A reminder that was actually dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderRecord {
    /// Unique identifier
    pub id: Uuid,
    /// Recipient user
    pub user_id: Uuid,
    /// Goal the reminder is about
    pub goal_id: Uuid,
    /// Escalation tier that fired
    pub tier: ReminderTier,
    /// Absolute send instant
    pub sent_at: DateTime<Utc>,
    /// The user's local calendar date at send time. All same-day comparisons
    /// (tier gating, effectiveness) use this date, never the server date.
    pub local_date: NaiveDate,
    /// The user's timezone at send time
    pub timezone: Tz,
    /// Filled in later by the effectiveness updater
    pub effectiveness: Effectiveness,
    /// Snapshot of the social context used to compose the message
    pub social_context: Option<SocialContext>,
}

impl ReminderRecord {
    /// Create a record for a reminder dispatched now.
    pub fn new(
        user_id: Uuid,
        goal_id: Uuid,
        tier: ReminderTier,
        sent_at: DateTime<Utc>,
        timezone: Tz,
        social_context: Option<SocialContext>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            goal_id,
            tier,
            sent_at,
            local_date: sent_at.with_timezone(&timezone).date_naive(),
            timezone,
            effectiveness: Effectiveness::Unknown,
            social_context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_tier_ordering_escalates() {
        assert!(ReminderTier::Gentle < ReminderTier::Supportive);
        assert!(ReminderTier::Supportive < ReminderTier::LastChance);
    }

    #[test]
    fn test_tier_round_trip() {
        for tier in [ReminderTier::Gentle, ReminderTier::Supportive, ReminderTier::LastChance] {
            assert_eq!(ReminderTier::from_str(tier.as_str()), Some(tier));
        }
        assert!(ReminderTier::from_str("urgent").is_none());
    }

    #[test]
    fn test_local_date_uses_user_timezone() {
        // 2025-06-01 11:30 UTC is already 2025-06-01 23:30 in Auckland (UTC+12)
        let sent_at = Utc.with_ymd_and_hms(2025, 6, 1, 11, 30, 0).unwrap();
        let record = ReminderRecord::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            ReminderTier::LastChance,
            sent_at,
            chrono_tz::Pacific::Auckland,
            None,
        );
        assert_eq!(record.local_date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());

        // ...while 12:30 UTC has crossed into the next Auckland date
        let sent_at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap();
        let record = ReminderRecord::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            ReminderTier::LastChance,
            sent_at,
            chrono_tz::Pacific::Auckland,
            None,
        );
        assert_eq!(record.local_date, NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
    }
}
