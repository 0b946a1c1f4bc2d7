//! ReminderNotifier implementation for Discord

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use dolphive::{DomainError, Reminder, ReminderNotifier};

use crate::client::DiscordClient;

/// Text posted to the reminder's channel
pub fn channel_text(reminder: &Reminder) -> String {
    format!("⏰ <@{}> Reminder: {}", reminder.user_id, reminder.message)
}

/// Text sent when falling back to a direct message
pub fn direct_text(reminder: &Reminder) -> String {
    format!("⏰ Reminder: {}", reminder.message)
}

fn parse_id(kind: &str, value: &str) -> Result<u64, DomainError> {
    value
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or_else(|| DomainError::Validation(format!("Invalid Discord {} id: '{}'", kind, value)))
}

/// Delivers reminders to their channel, falling back to a DM
pub struct DiscordNotifier {
    client: Arc<DiscordClient>,
}

impl DiscordNotifier {
    pub fn new(client: Arc<DiscordClient>) -> Self {
        Self { client }
    }

    async fn send_direct(&self, reminder: &Reminder) -> Result<(), DomainError> {
        let user_id = parse_id("user", &reminder.user_id)?;
        self.client
            .send_direct_message(user_id, &direct_text(reminder))
            .await
            .map(|_| ())
            .map_err(|e| DomainError::Delivery(format!("Discord DM failed: {}", e)))
    }
}

#[async_trait]
impl ReminderNotifier for DiscordNotifier {
    async fn notify(&self, reminder: &Reminder) -> Result<(), DomainError> {
        let channel_result = match parse_id("channel", &reminder.channel_id) {
            Ok(channel_id) => self
                .client
                .send_message(channel_id, &channel_text(reminder))
                .await
                .map(|_| ())
                .map_err(|e| DomainError::Delivery(format!("Discord channel send failed: {}", e))),
            Err(e) => Err(e),
        };

        match channel_result {
            Ok(()) => Ok(()),
            Err(e) if self.client.config().dm_fallback => {
                warn!(id = %reminder.id, "Channel delivery failed, trying DM: {}", e);
                self.send_direct(reminder).await
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reminder() -> Reminder {
        Reminder {
            id: "1_abcdef".into(),
            user_id: "42".into(),
            channel_id: "7".into(),
            message: "stretch".into(),
            trigger_time: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_message_texts() {
        assert_eq!(channel_text(&reminder()), "⏰ <@42> Reminder: stretch");
        assert_eq!(direct_text(&reminder()), "⏰ Reminder: stretch");
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("user", "42").unwrap(), 42);
        assert!(parse_id("user", "0").is_err());
        assert!(parse_id("channel", "abc").is_err());
    }
}
