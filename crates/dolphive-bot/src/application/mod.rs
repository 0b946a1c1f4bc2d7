//! Application Layer (Use Cases)
//!
//! Orchestrates domain operations over the content store and the
//! reminder notifier.

mod index_service;
mod memory_service;
mod reminder_service;
mod scheduler;
mod scope_lock;

pub use index_service::{IndexConfig, IndexService};
pub use memory_service::MemoryService;
pub use reminder_service::{NewReminder, ReminderService};
pub use scheduler::{ReminderScheduler, SchedulerConfig};
pub use scope_lock::ScopeLocks;
