//! HTTP Data Models
//!
//! - Memory: save/edit/delete/search requests and responses
//! - Reminder: scheduling requests and queued reminders
//! - Health: liveness and API usage

mod health;
mod memory;
mod reminder;

pub use health::*;
pub use memory::*;
pub use reminder::*;
