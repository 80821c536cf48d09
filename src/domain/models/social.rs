//! Social context snapshot attached to outgoing reminders.
//!
//! Computed per batch run from bulk-loaded group data; never persisted on its
//! own, only as a JSON snapshot inside the reminder record that used it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The current top performer in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakHolder {
    pub user_id: Uuid,
    pub display_name: String,
    /// Consecutive days logged
    pub streak_days: u32,
}

/// Per-goal group-completion snapshot for one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialContext {
    pub goal_id: Uuid,
    pub goal_name: String,
    /// Approved members only; pending members are invisible to reminders
    pub member_count: u32,
    /// Members who have already logged in their own current local period
    pub members_logged_today: u32,
    /// members_logged_today / member_count, 0.0 for empty groups
    pub completion_fraction: f64,
    pub top_streak: Option<StreakHolder>,
    /// The addressee's own current streak in days
    pub own_streak: u32,
}

impl SocialContext {
    /// True when at least one other member has logged and the addressee can
    /// be nudged with group progress.
    pub fn has_group_momentum(&self) -> bool {
        self.members_logged_today > 0 && self.member_count > 1
    }
}
