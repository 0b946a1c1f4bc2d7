//! Domain Services
//!
//! Pure functions over domain entities: the Markdown codec and the
//! storage path scheme.

mod markdown;
pub mod paths;
