//! Port trait definitions (hexagonal architecture).
//!
//! Async trait interfaces the adapters implement:
//! - Repositories over patterns, preferences, reminder history, progress
//!   logs, and group membership
//! - The outbound notification dispatcher
//!
//! These contracts keep the domain and services independent of storage and
//! transport concerns.

pub mod group_repository;
pub mod notifier;
pub mod pattern_repository;
pub mod preference_repository;
pub mod progress_repository;
pub mod reminder_repository;

pub use group_repository::{CandidatePair, GroupRepository, MemberRow};
pub use notifier::{Notification, NotificationDispatcher};
pub use pattern_repository::PatternRepository;
pub use preference_repository::PreferenceRepository;
pub use progress_repository::ProgressRepository;
pub use reminder_repository::{
    ReminderOutcome, ReminderRepository, SentReminder,
};
