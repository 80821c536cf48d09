//! Preference store port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::ReminderPreference;

/// Repository interface for reminder-preference persistence.
///
/// Absence of a row is not an error; callers substitute
/// [`ReminderPreference::defaults`].
#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    /// Get the stored preference for one (user, goal), if any.
    async fn get(&self, user_id: Uuid, goal_id: Uuid) -> DomainResult<Option<ReminderPreference>>;

    /// All stored preferences for one user.
    async fn list_for_user(&self, user_id: Uuid) -> DomainResult<Vec<ReminderPreference>>;

    /// Bulk fetch for a batch run: all stored preferences for the given users.
    async fn list_for_users(&self, user_ids: &[Uuid]) -> DomainResult<Vec<ReminderPreference>>;

    /// Insert or fully replace the row for (user, goal).
    async fn upsert(&self, preference: &ReminderPreference) -> DomainResult<()>;
}
