//! Memory - A note, schedule or task extracted from a conversation
//!
//! Pure domain entity without infrastructure dependencies. Category-specific
//! data lives in [`MemoryKind`]; the flat front-matter shape (optional keys
//! omitted when empty) only exists at the serialization boundary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{MemoryCategory, Priority, Recurrence, TaskStatus};

/// Producing channel of a memory
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Discord,
}

/// Schedule block of a `schedule` memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleDetails {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub recurring: Option<Recurrence>,
}

/// Task block of a `tasks` memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDetails {
    pub status: Option<TaskStatus>,
    pub due_date: Option<String>,
    pub priority: Option<Priority>,
}

/// Category together with the fields only that category carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryKind {
    Daily,
    Ideas,
    Research,
    Images { drive_url: Option<String> },
    Logs,
    Schedule(ScheduleDetails),
    Tasks(TaskDetails),
}

impl MemoryKind {
    /// Kind with no category-specific data
    pub fn bare(category: MemoryCategory) -> Self {
        match category {
            MemoryCategory::Daily => MemoryKind::Daily,
            MemoryCategory::Ideas => MemoryKind::Ideas,
            MemoryCategory::Research => MemoryKind::Research,
            MemoryCategory::Images => MemoryKind::Images { drive_url: None },
            MemoryCategory::Logs => MemoryKind::Logs,
            MemoryCategory::Schedule => MemoryKind::Schedule(ScheduleDetails::default()),
            MemoryCategory::Tasks => MemoryKind::Tasks(TaskDetails::default()),
        }
    }

    pub fn category(&self) -> MemoryCategory {
        match self {
            MemoryKind::Daily => MemoryCategory::Daily,
            MemoryKind::Ideas => MemoryCategory::Ideas,
            MemoryKind::Research => MemoryCategory::Research,
            MemoryKind::Images { .. } => MemoryCategory::Images,
            MemoryKind::Logs => MemoryCategory::Logs,
            MemoryKind::Schedule(_) => MemoryCategory::Schedule,
            MemoryKind::Tasks(_) => MemoryCategory::Tasks,
        }
    }
}

/// Front-matter of a memory file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "FrontmatterDoc", try_from = "FrontmatterDoc")]
pub struct Frontmatter {
    pub title: String,
    /// Creation date, never edited
    pub date: NaiveDate,
    pub tags: Vec<String>,
    pub source: Source,
    pub summary: String,
    /// Creator; governs edit/delete authorization in the chat layer
    pub author_id: Option<String>,
    pub kind: MemoryKind,
}

impl Frontmatter {
    /// Build the front-matter for a new memory, keeping only the optional
    /// fields that belong to the input's category
    pub fn from_input(input: &CreateMemoryInput, date: NaiveDate, author_id: Option<&str>) -> Self {
        let kind = match input.category {
            MemoryCategory::Images => MemoryKind::Images {
                drive_url: non_empty(input.drive_url.clone()),
            },
            MemoryCategory::Schedule => MemoryKind::Schedule(ScheduleDetails {
                start_date: non_empty(input.start_date.clone()),
                end_date: non_empty(input.end_date.clone()),
                start_time: non_empty(input.start_time.clone()),
                end_time: non_empty(input.end_time.clone()),
                location: non_empty(input.location.clone()),
                recurring: input.recurring,
            }),
            MemoryCategory::Tasks => MemoryKind::Tasks(TaskDetails {
                status: input.status,
                due_date: non_empty(input.due_date.clone()),
                priority: input.priority,
            }),
            other => MemoryKind::bare(other),
        };

        Self {
            title: input.title.clone(),
            date,
            tags: input.tags.clone(),
            source: Source::Discord,
            summary: input.summary.clone(),
            author_id: non_empty(author_id.map(str::to_string)),
            kind,
        }
    }

    pub fn category(&self) -> MemoryCategory {
        self.kind.category()
    }

    /// Text matched by keyword search: title, summary and tags
    pub fn searchable_text(&self) -> String {
        searchable_text(&self.title, &self.summary, &self.tags)
    }
}

pub(crate) fn searchable_text(title: &str, summary: &str, tags: &[String]) -> String {
    let mut parts = vec![title, summary];
    parts.extend(tags.iter().map(String::as_str));
    parts.join(" ").to_lowercase()
}

/// A memory file: front-matter plus Markdown body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub frontmatter: Frontmatter,
    pub content: String,
}

/// A memory as returned to callers, addressed by its storage path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryView {
    pub path: String,
    pub frontmatter: Frontmatter,
    /// Body; empty when the view was served from the index
    pub content: String,
}

/// Result of saving a memory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedMemory {
    pub path: String,
    /// Revision token of the created file
    pub sha: String,
    pub frontmatter: Frontmatter,
}

/// Structured input for a new memory (produced by the LLM layer)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemoryInput {
    pub category: MemoryCategory,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring: Option<Recurrence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

/// Partial update applied by an edit; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl MemoryUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.summary.is_none() && self.tags.is_none() && self.content.is_none()
    }

    /// Apply to a stored record
    pub fn apply(&self, record: &mut MemoryRecord) {
        if let Some(title) = &self.title {
            record.frontmatter.title = title.clone();
        }
        if let Some(summary) = &self.summary {
            record.frontmatter.summary = summary.clone();
        }
        if let Some(tags) = &self.tags {
            record.frontmatter.tags = tags.clone();
        }
        if let Some(content) = &self.content {
            record.content = content.clone();
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================
// Flat front-matter shape
// ============================================

/// Scalar that may have been written unquoted (`author_id: 1234`)
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LooseString {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<LooseString> for String {
    fn from(value: LooseString) -> Self {
        match value {
            LooseString::Str(s) => s,
            LooseString::Int(i) => i.to_string(),
            LooseString::Float(f) => f.to_string(),
            LooseString::Bool(b) => b.to_string(),
        }
    }
}

/// `tags` written as a list or as a single scalar
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LooseTags {
    List(Vec<LooseString>),
    One(LooseString),
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<LooseTags>::deserialize(deserializer)? {
        Some(LooseTags::List(items)) => items.into_iter().map(String::from).collect(),
        Some(LooseTags::One(item)) => vec![String::from(item)],
        None => Vec::new(),
    })
}

fn deserialize_loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<LooseString>::deserialize(deserializer)?.map(String::from))
}

/// Field order is the on-disk key order
#[derive(Serialize, Deserialize)]
struct FrontmatterDoc {
    title: String,
    date: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_tags")]
    tags: Vec<String>,
    #[serde(default)]
    source: Source,
    #[serde(rename = "type")]
    category: MemoryCategory,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_loose_string"
    )]
    author_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    drive_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recurring: Option<Recurrence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    priority: Option<Priority>,
    #[serde(default)]
    summary: String,
}

impl From<Frontmatter> for FrontmatterDoc {
    fn from(fm: Frontmatter) -> Self {
        let mut doc = FrontmatterDoc {
            title: fm.title,
            date: fm.date,
            tags: fm.tags,
            source: fm.source,
            category: fm.kind.category(),
            author_id: non_empty(fm.author_id),
            drive_url: None,
            start_date: None,
            end_date: None,
            start_time: None,
            end_time: None,
            location: None,
            recurring: None,
            status: None,
            due_date: None,
            priority: None,
            summary: fm.summary,
        };

        match fm.kind {
            MemoryKind::Images { drive_url } => doc.drive_url = non_empty(drive_url),
            MemoryKind::Schedule(s) => {
                doc.start_date = non_empty(s.start_date);
                doc.end_date = non_empty(s.end_date);
                doc.start_time = non_empty(s.start_time);
                doc.end_time = non_empty(s.end_time);
                doc.location = non_empty(s.location);
                doc.recurring = s.recurring;
            }
            MemoryKind::Tasks(t) => {
                doc.status = t.status;
                doc.due_date = non_empty(t.due_date);
                doc.priority = t.priority;
            }
            MemoryKind::Daily | MemoryKind::Ideas | MemoryKind::Research | MemoryKind::Logs => {}
        }

        doc
    }
}

impl TryFrom<FrontmatterDoc> for Frontmatter {
    type Error = String;

    fn try_from(doc: FrontmatterDoc) -> Result<Self, Self::Error> {
        let kind = match doc.category {
            MemoryCategory::Images => MemoryKind::Images {
                drive_url: non_empty(doc.drive_url),
            },
            MemoryCategory::Schedule => MemoryKind::Schedule(ScheduleDetails {
                start_date: non_empty(doc.start_date),
                end_date: non_empty(doc.end_date),
                start_time: non_empty(doc.start_time),
                end_time: non_empty(doc.end_time),
                location: non_empty(doc.location),
                recurring: doc.recurring,
            }),
            MemoryCategory::Tasks => MemoryKind::Tasks(TaskDetails {
                status: doc.status,
                due_date: non_empty(doc.due_date),
                priority: doc.priority,
            }),
            other => MemoryKind::bare(other),
        };

        Ok(Frontmatter {
            title: doc.title,
            date: doc.date,
            tags: doc.tags,
            source: doc.source,
            summary: doc.summary,
            author_id: non_empty(doc.author_id),
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(category: MemoryCategory) -> CreateMemoryInput {
        CreateMemoryInput {
            category,
            title: "Dentist".into(),
            tags: vec!["health".into()],
            summary: "Checkup".into(),
            content: "Bring insurance card".into(),
            start_date: Some("2026-10-20".into()),
            start_time: Some("".into()),
            status: Some(TaskStatus::Todo),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_input_keeps_only_category_fields() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let fm = Frontmatter::from_input(&input(MemoryCategory::Schedule), date, Some("42"));

        match &fm.kind {
            MemoryKind::Schedule(s) => {
                assert_eq!(s.start_date.as_deref(), Some("2026-10-20"));
                assert_eq!(s.start_time, None);
            }
            other => panic!("Expected schedule kind, got {:?}", other),
        }
        assert_eq!(fm.author_id.as_deref(), Some("42"));

        let ideas = Frontmatter::from_input(&input(MemoryCategory::Ideas), date, None);
        assert_eq!(ideas.kind, MemoryKind::Ideas);
        assert_eq!(ideas.author_id, None);
    }

    #[test]
    fn test_update_applies_only_given_fields() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let mut record = MemoryRecord {
            frontmatter: Frontmatter::from_input(&input(MemoryCategory::Tasks), date, None),
            content: "old".into(),
        };
        let update = MemoryUpdate {
            tags: Some(vec!["errand".into(), "urgent".into()]),
            ..Default::default()
        };
        assert!(!update.is_empty());
        update.apply(&mut record);

        assert_eq!(record.frontmatter.title, "Dentist");
        assert_eq!(record.frontmatter.tags, vec!["errand", "urgent"]);
        assert_eq!(record.content, "old");
        assert_eq!(record.frontmatter.date, date);
    }

    #[test]
    fn test_input_deserializes_camel_case() {
        let json = serde_json::json!({
            "category": "tasks",
            "title": "Buy milk",
            "tags": ["errand"],
            "summary": "grocery",
            "content": "- [ ] milk",
            "dueDate": "2026-10-18",
            "priority": "high"
        });
        let input: CreateMemoryInput = serde_json::from_value(json).unwrap();
        assert_eq!(input.category, MemoryCategory::Tasks);
        assert_eq!(input.due_date.as_deref(), Some("2026-10-18"));
        assert_eq!(input.priority, Some(Priority::High));
    }
}
