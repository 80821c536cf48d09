//! Logging-pattern domain model.
//!
//! A pattern describes when a user usually logs progress for a goal, as a
//! local-time window plus a derived confidence score. Patterns are replaced
//! wholesale on recalculation, never incrementally merged.

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Day-of-week key for a pattern.
///
/// `AnyDay` is the aggregate computed from all samples; day-specific entries
/// exist only when that weekday's own samples qualify on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternDay {
    AnyDay,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl PatternDay {
    /// Storage encoding: -1 for the any-day sentinel, 0-6 for Monday-Sunday.
    pub fn as_i8(&self) -> i8 {
        match self {
            Self::AnyDay => -1,
            Self::Monday => 0,
            Self::Tuesday => 1,
            Self::Wednesday => 2,
            Self::Thursday => 3,
            Self::Friday => 4,
            Self::Saturday => 5,
            Self::Sunday => 6,
        }
    }

    pub fn from_i8(v: i8) -> Option<Self> {
        match v {
            -1 => Some(Self::AnyDay),
            0 => Some(Self::Monday),
            1 => Some(Self::Tuesday),
            2 => Some(Self::Wednesday),
            3 => Some(Self::Thursday),
            4 => Some(Self::Friday),
            5 => Some(Self::Saturday),
            6 => Some(Self::Sunday),
            _ => None,
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
            Weekday::Sun => Self::Sunday,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnyDay => "any_day",
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }
}

/// A detected per-(user, goal, day) logging-time pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingPattern {
    pub user_id: Uuid,
    pub goal_id: Uuid,
    pub day: PatternDay,
    /// Local hour the usual logging window opens (0-23)
    pub window_start_hour: u8,
    /// Local hour the usual logging window closes (0-23). May be numerically
    /// smaller than the start when the window wraps past midnight.
    pub window_end_hour: u8,
    /// Derived reliability score in [0, 1]; never user-set
    pub confidence: f64,
    /// Number of log samples the pattern was computed from
    pub sample_count: u32,
    pub calculated_at: DateTime<Utc>,
}

impl LoggingPattern {
    /// Whether the pattern is reliable enough for smart scheduling.
    pub fn is_usable(&self, min_confidence: f64) -> bool {
        self.confidence >= min_confidence
    }

    /// One-line human-readable rendering for the preference API.
    pub fn summary(&self) -> String {
        let when = match self.day {
            PatternDay::AnyDay => String::from("usually logs"),
            day => format!("on {}s usually logs", capitalize(day.as_str())),
        };
        format!(
            "{} between {:02}:00 and {:02}:59",
            when, self.window_start_hour, self.window_end_hour
        )
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_day_encoding_round_trip() {
        for v in -1..=6 {
            let day = PatternDay::from_i8(v).unwrap();
            assert_eq!(day.as_i8(), v);
        }
        assert!(PatternDay::from_i8(7).is_none());
        assert!(PatternDay::from_i8(-2).is_none());
    }

    #[test]
    fn test_summary_formats() {
        let pattern = LoggingPattern {
            user_id: Uuid::new_v4(),
            goal_id: Uuid::new_v4(),
            day: PatternDay::AnyDay,
            window_start_hour: 7,
            window_end_hour: 9,
            confidence: 0.8,
            sample_count: 12,
            calculated_at: Utc::now(),
        };
        assert_eq!(pattern.summary(), "usually logs between 07:00 and 09:59");

        let monday = LoggingPattern { day: PatternDay::Monday, ..pattern };
        assert_eq!(monday.summary(), "on Mondays usually logs between 07:00 and 09:59");
    }
}
