//! Value Objects
//!
//! Immutable objects defined by their attributes rather than identity.

mod memory_category;
mod planning;
mod scope;

pub use memory_category::*;
pub use planning::*;
pub use scope::*;
