//! Core habit-tracking records the scheduler reads.
//!
//! These rows are owned and mutated by the wider application (signup, group
//! CRUD, progress logging). The scheduler only ever reads them, except for
//! progress logs consulted at pattern-recalculation milestones.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How often a goal expects progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalCadence {
    Daily,
    Weekly,
}

impl GoalCadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            _ => None,
        }
    }
}

/// Membership state in a shared goal's group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Pending,
    Approved,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            _ => None,
        }
    }
}

/// A registered user, with the stored timezone every "today" comparison uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    /// IANA timezone, e.g. "Pacific/Auckland"
    pub timezone: Tz,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A shared habit goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub name: String,
    pub cadence: GoalCadence,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A single progress entry for a goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressLog {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub user_id: Uuid,
    pub logged_at: DateTime<Utc>,
}
