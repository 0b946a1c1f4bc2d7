//! Reminder request/response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use dolphive::Reminder;

/// Set reminder request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetReminderRequest {
    pub user_id: String,
    /// Channel the reminder is delivered to
    pub channel_id: String,
    pub message: String,
    pub trigger_time: DateTime<Utc>,
}

/// List reminders query
#[derive(Debug, Deserialize, IntoParams)]
pub struct ReminderQuery {
    pub user_id: String,
}

/// Reminder response
#[derive(Debug, Serialize, ToSchema)]
pub struct ReminderResponse {
    pub id: String,
    pub user_id: String,
    pub channel_id: String,
    pub message: String,
    pub trigger_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Reminder> for ReminderResponse {
    fn from(reminder: Reminder) -> Self {
        Self {
            id: reminder.id,
            user_id: reminder.user_id,
            channel_id: reminder.channel_id,
            message: reminder.message,
            trigger_time: reminder.trigger_time,
            created_at: reminder.created_at,
        }
    }
}

/// Cancel reminder response
#[derive(Debug, Serialize, ToSchema)]
pub struct CancelReminderResponse {
    pub id: String,
    pub cancelled: bool,
}
