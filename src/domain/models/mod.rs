//! Domain models for the reminder scheduling system.

pub mod config;
pub mod habit;
pub mod pattern;
pub mod preference;
pub mod reminder;
pub mod social;

pub use config::{
    Config, DatabaseConfig, HttpConfig, LoggingConfig, PushConfig, SchedulerConfig,
};
pub use habit::{Goal, GoalCadence, MembershipStatus, ProgressLog, User};
pub use pattern::{LoggingPattern, PatternDay};
pub use preference::{
    Aggressiveness, PreferenceUpdate, QuietHours, ReminderMode, ReminderPreference,
};
pub use reminder::{Effectiveness, ReminderRecord, ReminderTier};
pub use social::{SocialContext, StreakHolder};
