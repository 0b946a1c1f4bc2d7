//! Reminder Scheduler - Periodic due-check
//!
//! Fires due reminders through the configured notifier at a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;

use dolphive::{ContentStore, ReminderNotifier};

use super::reminder_service::ReminderService;

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between due-checks
    pub interval: Duration,
    /// Enable/disable scheduler
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            enabled: true,
        }
    }
}

/// Reminder scheduler
pub struct ReminderScheduler<S: ContentStore + ?Sized> {
    reminders: Arc<ReminderService<S>>,
    notifier: Arc<dyn ReminderNotifier>,
    config: SchedulerConfig,
}

impl<S: ContentStore + ?Sized + 'static> ReminderScheduler<S> {
    /// Creates a new scheduler
    pub fn new(
        reminders: Arc<ReminderService<S>>,
        notifier: Arc<dyn ReminderNotifier>,
        config: Option<SchedulerConfig>,
    ) -> Self {
        Self {
            reminders,
            notifier,
            config: config.unwrap_or_default(),
        }
    }

    /// Start the scheduler (runs in background)
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the scheduler loop
    async fn run(self) {
        if !self.config.enabled {
            tracing::info!("⏰ Reminder scheduler disabled");
            return;
        }

        tracing::info!(
            "⏰ Reminder scheduler started (interval: {:?})",
            self.config.interval
        );

        let mut ticker = interval(self.config.interval);

        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    async fn tick(&self) {
        match self.reminders.fire_due(self.notifier.as_ref(), Utc::now()).await {
            Ok(report) if report.total() == 0 => {}
            Ok(report) => tracing::info!(
                "⏰ Scheduler: Reminder cycle completed ({} delivered, {} failed)",
                report.delivered,
                report.failed
            ),
            Err(e) => tracing::warn!("⏰ Scheduler: Reminder cycle failed: {}", e),
        }
    }
}
