//! Memory Index - Per-scope manifest of every memory file
//!
//! Denormalized projection of the front-matter, enough to answer search and
//! listing without reading file bodies.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::entities::memory::{searchable_text, Frontmatter, MemoryKind, MemoryView, Source};
use crate::domain::value_objects::MemoryCategory;

/// Current manifest schema version. A manifest carrying any other version is
/// discarded and rebuilt.
pub const INDEX_VERSION: u32 = 2;

/// One manifest row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub path: String,
    pub category: MemoryCategory,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub source: Source,
}

impl IndexEntry {
    pub fn from_frontmatter(path: impl Into<String>, fm: &Frontmatter) -> Self {
        Self {
            path: path.into(),
            category: fm.category(),
            title: fm.title.clone(),
            tags: fm.tags.clone(),
            date: fm.date,
            summary: fm.summary.clone(),
            source: fm.source,
        }
    }

    /// Case-insensitive substring match over title, summary and tags.
    /// `query_lower` must already be lowercased.
    pub fn matches(&self, query_lower: &str) -> bool {
        searchable_text(&self.title, &self.summary, &self.tags).contains(query_lower)
    }

    /// View built from the manifest alone (no body)
    pub fn to_view(&self) -> MemoryView {
        MemoryView {
            path: self.path.clone(),
            frontmatter: Frontmatter {
                title: self.title.clone(),
                date: self.date,
                tags: self.tags.clone(),
                source: self.source,
                summary: self.summary.clone(),
                author_id: None,
                kind: MemoryKind::bare(self.category),
            },
            content: String::new(),
        }
    }
}

/// Fields an edit may change in a manifest row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexEntryPatch {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl IndexEntryPatch {
    pub fn apply(&self, entry: &mut IndexEntry) {
        if let Some(title) = &self.title {
            entry.title = title.clone();
        }
        if let Some(summary) = &self.summary {
            entry.summary = summary.clone();
        }
        if let Some(tags) = &self.tags {
            entry.tags = tags.clone();
        }
    }
}

/// Per-scope manifest, stored as `memory/{scope}/.index.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub version: u32,
    pub entries: Vec<IndexEntry>,
}

impl Default for IndexManifest {
    fn default() -> Self {
        Self {
            version: INDEX_VERSION,
            entries: Vec::new(),
        }
    }
}

/// Why a stored manifest could not be adopted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestRejection {
    Corrupt(String),
    VersionMismatch { found: Option<u64> },
}

impl IndexManifest {
    pub fn with_entries(entries: Vec<IndexEntry>) -> Self {
        Self {
            version: INDEX_VERSION,
            entries,
        }
    }

    /// Parse a stored manifest. The version is checked before the entries
    /// are interpreted, so an older schema is never partially trusted.
    pub fn parse(json: &str) -> Result<Self, ManifestRejection> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ManifestRejection::Corrupt(e.to_string()))?;

        let version = value.get("version").and_then(|v| v.as_u64());
        if version != Some(u64::from(INDEX_VERSION)) {
            return Err(ManifestRejection::VersionMismatch { found: version });
        }

        serde_json::from_value(value).map_err(|e| ManifestRejection::Corrupt(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.iter().any(|e| e.path == path)
    }

    /// Append, replacing any existing row for the same path
    pub fn upsert(&mut self, entry: IndexEntry) {
        match self.entries.iter_mut().find(|e| e.path == entry.path) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Remove the row for `path`; returns whether one existed
    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.path != path);
        self.entries.len() != before
    }

    /// Patch the row for `path`; returns whether one existed
    pub fn patch(&mut self, path: &str, patch: &IndexEntryPatch) -> bool {
        match self.entries.iter_mut().find(|e| e.path == path) {
            Some(entry) => {
                patch.apply(entry);
                true
            }
            None => false,
        }
    }
}
