//! Domain Entities
//!
//! Pure domain models without infrastructure dependencies.
//! - Memory: a note, schedule or task stored as Markdown with front-matter
//! - Index: the per-scope manifest accelerating search
//! - Reminder: a queued one-shot notification

mod index;
mod memory;
mod reminder;

pub use index::*;
pub use memory::*;
pub use reminder::*;
