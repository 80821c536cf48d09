//! Shared HTTP application state.

use std::sync::Arc;

use crate::domain::ports::{GroupRepository, PatternRepository, PreferenceRepository};
use crate::services::{EffectivenessService, PatternService, ReminderBatchService};

/// Everything the handlers need, cheaply cloneable per request.
#[derive(Clone)]
pub struct AppState {
    pub batch: Arc<ReminderBatchService>,
    pub pattern_service: Arc<PatternService>,
    pub effectiveness: Arc<EffectivenessService>,
    pub preferences: Arc<dyn PreferenceRepository>,
    pub patterns: Arc<dyn PatternRepository>,
    pub groups: Arc<dyn GroupRepository>,
    /// Bearer token every caller must present
    pub auth_token: Arc<str>,
}
