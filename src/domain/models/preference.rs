//! Reminder-preference domain model.
//!
//! A preference row is keyed by (user, goal) and mutated only by explicit
//! user edits with upsert semantics. Absence of a row is not an error: the
//! documented defaults apply (enabled, smart, balanced, no quiet hours).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How reminder times are chosen for a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderMode {
    /// Schedule from the learned logging pattern, falling back to the
    /// default schedule when no usable pattern exists
    Smart,
    /// Send a single gentle reminder at a user-chosen local hour
    Fixed,
    /// Never send for this goal
    Disabled,
}

impl Default for ReminderMode {
    fn default() -> Self {
        Self::Smart
    }
}

impl ReminderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Smart => "smart",
            Self::Fixed => "fixed",
            Self::Disabled => "disabled",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "smart" => Some(Self::Smart),
            "fixed" => Some(Self::Fixed),
            "disabled" => Some(Self::Disabled),
            _ => None,
        }
    }
}

/// How hard the scheduler pushes when the user has not logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggressiveness {
    /// Only ever send the late-evening last-chance reminder
    Gentle,
    Balanced,
    /// Escalate to the supportive tier sooner
    Persistent,
}

impl Default for Aggressiveness {
    fn default() -> Self {
        Self::Balanced
    }
}

impl Aggressiveness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gentle => "gentle",
            Self::Balanced => "balanced",
            Self::Persistent => "persistent",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "gentle" => Some(Self::Gentle),
            "balanced" => Some(Self::Balanced),
            "persistent" => Some(Self::Persistent),
            _ => None,
        }
    }
}

/// A daily do-not-disturb range in local hours.
///
/// The range is half-open [start, end) and may wrap past midnight, e.g.
/// start 22 / end 7 silences 22:00-06:59.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    pub start_hour: u8,
    pub end_hour: u8,
}

impl QuietHours {
    pub fn contains(&self, local_hour: u8) -> bool {
        if self.start_hour <= self.end_hour {
            local_hour >= self.start_hour && local_hour < self.end_hour
        } else {
            local_hour >= self.start_hour || local_hour < self.end_hour
        }
    }
}

/// Per-(user, goal) reminder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderPreference {
    pub user_id: Uuid,
    pub goal_id: Uuid,
    pub enabled: bool,
    pub mode: ReminderMode,
    /// Local hour for Fixed mode; ignored under other modes
    pub fixed_hour: Option<u8>,
    pub aggressiveness: Aggressiveness,
    pub quiet_hours: Option<QuietHours>,
}

impl ReminderPreference {
    /// The documented defaults that apply when no row exists.
    pub fn defaults(user_id: Uuid, goal_id: Uuid) -> Self {
        Self {
            user_id,
            goal_id,
            enabled: true,
            mode: ReminderMode::default(),
            fixed_hour: None,
            aggressiveness: Aggressiveness::default(),
            quiet_hours: None,
        }
    }

    /// Apply a partial update, leaving unspecified fields untouched.
    pub fn apply(&mut self, update: &PreferenceUpdate) {
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(mode) = update.mode {
            self.mode = mode;
        }
        if let Some(fixed_hour) = update.fixed_hour {
            self.fixed_hour = fixed_hour;
        }
        if let Some(aggressiveness) = update.aggressiveness {
            self.aggressiveness = aggressiveness;
        }
        if let Some(quiet_hours) = update.quiet_hours {
            self.quiet_hours = quiet_hours;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(hour) = self.fixed_hour {
            if hour > 23 {
                return Err(format!("fixed_hour must be 0-23, got {hour}"));
            }
        }
        if let Some(quiet) = &self.quiet_hours {
            if quiet.start_hour > 23 || quiet.end_hour > 23 {
                return Err(format!(
                    "quiet hours must be 0-23, got {}-{}",
                    quiet.start_hour, quiet.end_hour
                ));
            }
        }
        Ok(())
    }
}

/// Partial preference edit. `None` means "leave unchanged"; the inner
/// `Option` on optional fields allows explicitly clearing them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceUpdate {
    pub enabled: Option<bool>,
    pub mode: Option<ReminderMode>,
    pub fixed_hour: Option<Option<u8>>,
    pub aggressiveness: Option<Aggressiveness>,
    pub quiet_hours: Option<Option<QuietHours>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_hours_overnight_wrap() {
        let quiet = QuietHours { start_hour: 22, end_hour: 7 };
        assert!(quiet.contains(23));
        assert!(quiet.contains(5));
        assert!(quiet.contains(22));
        assert!(!quiet.contains(12));
        assert!(!quiet.contains(7));
    }

    #[test]
    fn test_quiet_hours_same_day_range() {
        let quiet = QuietHours { start_hour: 13, end_hour: 15 };
        assert!(quiet.contains(13));
        assert!(quiet.contains(14));
        assert!(!quiet.contains(15));
        assert!(!quiet.contains(9));
    }

    #[test]
    fn test_apply_partial_update_retains_other_fields() {
        let mut pref = ReminderPreference::defaults(Uuid::new_v4(), Uuid::new_v4());
        pref.apply(&PreferenceUpdate {
            aggressiveness: Some(Aggressiveness::Persistent),
            ..Default::default()
        });
        assert_eq!(pref.aggressiveness, Aggressiveness::Persistent);
        assert_eq!(pref.mode, ReminderMode::Smart);
        assert!(pref.enabled);

        pref.apply(&PreferenceUpdate {
            mode: Some(ReminderMode::Fixed),
            fixed_hour: Some(Some(8)),
            ..Default::default()
        });
        assert_eq!(pref.mode, ReminderMode::Fixed);
        assert_eq!(pref.fixed_hour, Some(8));
        assert_eq!(pref.aggressiveness, Aggressiveness::Persistent);
    }

    #[test]
    fn test_validate_rejects_out_of_range_hours() {
        let mut pref = ReminderPreference::defaults(Uuid::new_v4(), Uuid::new_v4());
        pref.fixed_hour = Some(24);
        assert!(pref.validate().is_err());

        pref.fixed_hour = Some(9);
        pref.quiet_hours = Some(QuietHours { start_hour: 22, end_hour: 25 });
        assert!(pref.validate().is_err());
    }
}
