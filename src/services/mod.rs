//! Business-logic services for the reminder scheduler.

pub mod decision_engine;
pub mod effectiveness;
pub mod message_composer;
pub mod pattern_calculator;
pub mod pattern_service;
pub mod reminder_batch;
pub mod social_context;

pub use decision_engine::{Decision, DecisionEngine, DecisionInput, SendReason, SkipReason};
pub use effectiveness::{EffectivenessService, EffectivenessSummary};
pub use pattern_calculator::{PatternCalculator, PatternOutcome};
pub use pattern_service::{PatternService, SweepSummary};
pub use reminder_batch::{ReminderBatchService, RunSummary};
pub use social_context::{SocialContextBuilder, SocialSnapshot};
