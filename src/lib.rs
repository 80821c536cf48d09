//! Pursue Reminders - Adaptive reminder scheduling backend
//!
//! The service learns each user's per-goal logging pattern with circular
//! statistics, decides whether and at what escalation tier to notify, mixes
//! in live group context, and adapts its aggressiveness from observed
//! effectiveness. All of it runs batch-wise across timezones with one bulk
//! fetch per store per run.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure models, errors, and port traits
//! - **Service Layer** (`services`): Pattern calculation, decision engine,
//!   social aggregation, batch orchestration, effectiveness back-fill
//! - **Adapter Layer** (`adapters`): SQLite repositories and the push
//!   gateway dispatcher
//! - **Infrastructure Layer** (`infrastructure`): Config, logging, HTTP

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Aggressiveness, Config, Effectiveness, LoggingPattern, PatternDay, PreferenceUpdate,
    QuietHours, ReminderMode, ReminderPreference, ReminderRecord, ReminderTier, SocialContext,
};
pub use domain::ports::{
    GroupRepository, NotificationDispatcher, PatternRepository, PreferenceRepository,
    ProgressRepository, ReminderRepository,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    Decision, DecisionEngine, DecisionInput, EffectivenessService, PatternCalculator,
    PatternOutcome, PatternService, ReminderBatchService, RunSummary,
};
