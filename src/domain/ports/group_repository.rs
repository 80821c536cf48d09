//! Group / membership read port.

use async_trait::async_trait;
use chrono_tz::Tz;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Goal, User};

/// A (user, goal) pair eligible for reminder evaluation, before the
/// has-logged-today filter. Carries everything the per-candidate path needs
/// so the orchestrator never fetches inside its loop.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePair {
    pub user_id: Uuid,
    pub goal_id: Uuid,
    pub timezone: Tz,
    pub goal_name: String,
}

/// One approved member of a goal's group, for social aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberRow {
    pub goal_id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub timezone: Tz,
    pub current_streak: u32,
}

/// Read interface over users, goals, and group memberships.
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// All pairs with an active user, an active daily-cadence goal, an
    /// approved membership, and reminders not disabled for the pair.
    async fn reminder_candidates(&self) -> DomainResult<Vec<CandidatePair>>;

    /// Approved members of the given goals, with streaks. One bulk query
    /// for the social context builder.
    async fn members_of_goals(&self, goal_ids: &[Uuid]) -> DomainResult<Vec<MemberRow>>;

    async fn get_user(&self, user_id: Uuid) -> DomainResult<Option<User>>;

    async fn get_goal(&self, goal_id: Uuid) -> DomainResult<Option<Goal>>;

    /// Goals the user holds an approved membership in.
    async fn goals_for_user(&self, user_id: Uuid) -> DomainResult<Vec<Goal>>;
}
