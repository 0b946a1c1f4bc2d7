//! Infrastructure Adapters
//!
//! Implementations of domain ports for external systems.

pub mod github;
pub mod memory_store;

// Re-exports
pub use github::{ApiCallCounter, GitHubConfig, GitHubContentStore, RepositoryTemplate};
pub use memory_store::InMemoryContentStore;
