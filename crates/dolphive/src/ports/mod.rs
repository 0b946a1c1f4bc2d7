//! Ports (Interfaces)
//!
//! Abstract interfaces that define how the domain layer
//! interacts with external systems (file storage, chat delivery).
//!
//! Implementations of these traits live in the server crate.

pub mod content_store;
pub mod notifier;

// Re-exports
pub use content_store::*;
pub use notifier::*;
