//! GitHub Contents API adapter
//!
//! - `client` - [`ContentStore`](dolphive::ContentStore) implementation
//! - `revision_cache` - ETag-validated read cache
//! - `retry` - backoff policy wrapped around every request
//! - `error` - HTTP response classification

mod client;
mod error;
mod retry;
mod revision_cache;

pub use client::{ApiCallCounter, GitHubConfig, GitHubContentStore, RepositoryTemplate};
