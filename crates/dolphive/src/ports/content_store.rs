//! Content Store Port
//!
//! Abstract interface over a version-controlled file-content API
//! (GitHub Contents API in production). Every mutation produces a new
//! revision; the revision token returned on read is the precondition for
//! update and delete.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content store errors, classified for the retry policy
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Stale revision on update/delete, or path already taken on create
    #[error("Conflict on {path}: {message}")]
    Conflict { path: String, message: String },

    /// The store rejected the request as invalid (GitHub 422)
    #[error("Unprocessable request for {path}: {message}")]
    Unprocessable { path: String, message: String },

    #[error("Rate limited{}", format_retry_after(.retry_after))]
    RateLimited {
        retry_after: Option<Duration>,
        /// Secondary (abuse) rate limiting rather than quota exhaustion
        secondary: bool,
    },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    /// Any other HTTP failure (authorization, validation, ...)
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

fn format_retry_after(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(", retry after {}s", d.as_secs_f64()),
        None => String::new(),
    }
}

impl StoreError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, StoreError::RateLimited { .. })
    }

    /// Server-side, rate-limit and transient network failures
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::RateLimited { .. } | StoreError::Network(_) => true,
            StoreError::Server { status, .. } => (500..600).contains(status),
            _ => false,
        }
    }

    /// Explicit resume delay supplied by the server
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            StoreError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Errors that mean "pick another path and create again"
    pub fn is_path_collision(&self) -> bool {
        matches!(
            self,
            StoreError::Conflict { .. } | StoreError::Unprocessable { .. }
        )
    }

    /// Authorization failures (bad token, missing repository permission)
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, StoreError::Api { status: 401 | 403, .. })
    }
}

/// A file read from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub content: String,
    /// Revision token (blob sha)
    pub sha: String,
}

/// Result of a create/update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub path: String,
    /// Revision token of the written file
    pub sha: String,
    /// Sha of the commit that carried the change; empty when the write was
    /// confirmed by reading the file back
    pub commit_sha: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// A directory entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub path: String,
    pub sha: String,
    pub size: u64,
    pub kind: EntryKind,
}

impl FileInfo {
    pub fn is_markdown(&self) -> bool {
        self.kind == EntryKind::File && self.name.ends_with(".md")
    }
}

/// Content store interface
///
/// Read paths report absence as `Ok(None)` / an empty listing rather than
/// `StoreError::NotFound`; every other failure propagates.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Read a file, `None` when it does not exist
    async fn get_file(&self, path: &str) -> Result<Option<StoredFile>, StoreError>;

    /// Create a file; fails with `Conflict` when the path is taken
    async fn create_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<CommitInfo, StoreError>;

    /// Replace a file; fails with `Conflict` when `sha` is stale
    async fn update_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: &str,
    ) -> Result<CommitInfo, StoreError>;

    async fn delete_file(&self, path: &str, message: &str, sha: &str) -> Result<(), StoreError>;

    /// Immediate children of a directory (files and sub-directories),
    /// empty when the directory does not exist
    async fn list_contents(&self, dir: &str) -> Result<Vec<FileInfo>, StoreError>;

    /// Files (not sub-directories) directly inside `dir`
    async fn list_files(&self, dir: &str) -> Result<Vec<FileInfo>, StoreError> {
        Ok(self
            .list_contents(dir)
            .await?
            .into_iter()
            .filter(|f| f.kind == EntryKind::File)
            .collect())
    }

    /// Files of several directories, concatenated in order
    async fn list_files_in(&self, dirs: &[String]) -> Result<Vec<FileInfo>, StoreError> {
        let mut files = Vec::new();
        for dir in dirs {
            files.extend(self.list_files(dir).await?);
        }
        Ok(files)
    }
}
