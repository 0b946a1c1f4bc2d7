//! Reminder - A one-shot message delivered at a trigger time

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A queued reminder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    /// `{unix_millis}_{6 base36 chars}`
    pub id: String,
    pub user_id: String,
    /// Channel the reminder was set from; delivery falls back to a DM
    pub channel_id: String,
    pub message: String,
    pub trigger_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.trigger_time <= now
    }
}

/// Stored shape of `memory/{scope}/.reminders.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderQueue {
    #[serde(default)]
    pub reminders: Vec<Reminder>,
}

/// Stored shape of the private-scope registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectScopeRegistry {
    #[serde(default)]
    pub scopes: Vec<String>,
}
