//! Notification message composition.
//!
//! Pure text assembly from tier and social context. Copy here is what ships
//! to devices; keep it short, concrete, and free of guilt-tripping.

use serde_json::json;
use uuid::Uuid;

use crate::domain::models::{ReminderTier, SocialContext};
use crate::domain::ports::Notification;

/// Compose the outgoing notification for a positive decision.
pub fn compose(
    recipient: Uuid,
    goal_id: Uuid,
    goal_name: &str,
    tier: ReminderTier,
    context: Option<&SocialContext>,
) -> Notification {
    let title = match tier {
        ReminderTier::Gentle => format!("Time for {goal_name}?"),
        ReminderTier::Supportive => format!("Keep {goal_name} going"),
        ReminderTier::LastChance => format!("Last call for {goal_name}"),
    };

    let mut lines: Vec<String> = Vec::new();
    match tier {
        ReminderTier::Gentle => {
            lines.push("A quick log keeps the habit alive.".to_string());
        }
        ReminderTier::Supportive => {
            lines.push("Still time today. You've got this.".to_string());
        }
        ReminderTier::LastChance => {
            lines.push("The day's almost over. One minute is enough.".to_string());
        }
    }

    if let Some(ctx) = context {
        if ctx.has_group_momentum() {
            lines.push(format!(
                "{} of {} in {} have logged today.",
                ctx.members_logged_today, ctx.member_count, ctx.goal_name
            ));
        }
        if let Some(top) = &ctx.top_streak {
            lines.push(format!(
                "{} is on a {}-day streak.",
                top.display_name, top.streak_days
            ));
        }
        if ctx.own_streak >= 2 {
            lines.push(format!("Don't break your {}-day streak.", ctx.own_streak));
        }
    }

    Notification {
        recipient,
        title,
        body: lines.join(" "),
        metadata: json!({
            "goal_id": goal_id,
            "tier": tier.as_str(),
        }),
    }
}
