//! Memory request/response DTOs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use dolphive::{CreateMemoryInput, Frontmatter, MemoryUpdate, MemoryView, SavedMemory};

/// Save memory request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveMemoryRequest {
    /// Structured memory (category, title, tags, summary, content and
    /// category-specific fields)
    #[schema(value_type = Object)]
    pub input: CreateMemoryInput,
    /// Creator recorded as `author_id`
    pub author_id: Option<String>,
}

/// Edit memory request
#[derive(Debug, Deserialize, ToSchema)]
pub struct EditMemoryRequest {
    pub path: String,
    /// Any of title, summary, tags, content
    #[schema(value_type = Object)]
    pub updates: MemoryUpdate,
}

/// Query addressing one memory file
#[derive(Debug, Deserialize, IntoParams)]
pub struct MemoryPathQuery {
    /// Storage path, e.g. `memory/{scope}/tasks/2025-01-01-....md`
    pub path: String,
}

/// Search query
#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Case-insensitive keyword
    pub q: String,
    /// Comma-separated category filter (default: all)
    pub categories: Option<String>,
}

/// Recent memories query
#[derive(Debug, Deserialize, IntoParams)]
pub struct RecentQuery {
    /// Maximum number of memories (default: 10)
    pub limit: Option<usize>,
}

/// Memory response
#[derive(Debug, Serialize, ToSchema)]
pub struct MemoryResponse {
    pub path: String,
    #[schema(value_type = Object)]
    pub frontmatter: Frontmatter,
    /// Empty when served from the index
    pub content: String,
}

impl From<MemoryView> for MemoryResponse {
    fn from(view: MemoryView) -> Self {
        Self {
            path: view.path,
            frontmatter: view.frontmatter,
            content: view.content,
        }
    }
}

/// Saved memory response
#[derive(Debug, Serialize, ToSchema)]
pub struct SavedMemoryResponse {
    pub path: String,
    /// Revision token of the created file
    pub sha: String,
    #[schema(value_type = Object)]
    pub frontmatter: Frontmatter,
}

impl From<SavedMemory> for SavedMemoryResponse {
    fn from(saved: SavedMemory) -> Self {
        Self {
            path: saved.path,
            sha: saved.sha,
            frontmatter: saved.frontmatter,
        }
    }
}

/// Front-matter lookup response
#[derive(Debug, Serialize, ToSchema)]
pub struct FrontmatterResponse {
    pub path: String,
    #[schema(value_type = Option<Object>)]
    pub frontmatter: Option<Frontmatter>,
}

/// Delete response
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteMemoryResponse {
    pub path: String,
    pub deleted: bool,
}
