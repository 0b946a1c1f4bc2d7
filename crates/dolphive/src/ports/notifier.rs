//! Reminder Notifier Port
//!
//! Delivery channel for due reminders (chat message, DM, ...).

use async_trait::async_trait;

use crate::domain::entities::Reminder;
use crate::domain::errors::DomainError;

/// Delivers a due reminder to its owner
#[async_trait]
pub trait ReminderNotifier: Send + Sync {
    /// Deliver `reminder`. Delivery is attempted once; the caller dequeues
    /// the reminder whatever the outcome.
    async fn notify(&self, reminder: &Reminder) -> Result<(), DomainError>;
}
