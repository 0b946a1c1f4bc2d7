//! Markdown codec for memory files
//!
//! ```text
//! ---
//! title: Buy milk
//! date: 2026-10-17
//! tags:
//! - errand
//! source: discord
//! type: tasks
//! summary: grocery
//! ---
//!
//! - [ ] milk
//! ```

use crate::domain::entities::{Frontmatter, MemoryRecord};
use crate::domain::errors::DomainError;

const DELIMITER: &str = "---";

impl MemoryRecord {
    pub fn new(frontmatter: Frontmatter, content: impl Into<String>) -> Self {
        Self {
            frontmatter,
            content: content.into(),
        }
    }

    /// Render as front-matter block, blank line, body
    pub fn render(&self) -> Result<String, DomainError> {
        let yaml = serde_yaml::to_string(&self.frontmatter)
            .map_err(|e| DomainError::Repository(format!("Failed to render front-matter: {}", e)))?;
        Ok(format!(
            "{DELIMITER}\n{}\n{DELIMITER}\n\n{}",
            yaml.trim_end(),
            self.content
        ))
    }

    /// Parse a memory file. The body is trimmed.
    pub fn parse(markdown: &str) -> Result<Self, DomainError> {
        let normalized = markdown.replace("\r\n", "\n");
        let (yaml, body) = split_frontmatter(&normalized).ok_or_else(|| {
            DomainError::Repository("Missing front-matter block".to_string())
        })?;

        let frontmatter: Frontmatter = serde_yaml::from_str(yaml)
            .map_err(|e| DomainError::Repository(format!("Invalid front-matter: {}", e)))?;

        Ok(Self {
            frontmatter,
            content: body.trim().to_string(),
        })
    }
}

/// Split `---\n{yaml}\n---\n{body}` into its two halves
fn split_frontmatter(markdown: &str) -> Option<(&str, &str)> {
    let rest = markdown.strip_prefix("---\n")?;

    // Empty front-matter block
    if let Some(body) = rest.strip_prefix("---\n") {
        return Some(("", body));
    }

    let end = rest.find("\n---\n").map(|i| (i, i + "\n---\n".len())).or_else(|| {
        rest.strip_suffix("\n---")
            .map(|yaml| (yaml.len(), rest.len()))
    })?;

    Some((&rest[..end.0], &rest[end.1..]))
}
