//! Storage layout
//!
//! - `memory/{scope}/{category}/{YYYY-MM-DD}-{uuid-v7}.md` - one record per file
//! - `memory/{scope}/.index.json` - search manifest
//! - `memory/{scope}/.reminders.json` - reminder queue
//! - `memory/{category}/...` - legacy, pre-scope layout (read only)
//!
//! UUIDv7 ids are time ordered and monotonic within the process, so sorting
//! file names lexicographically sorts records chronologically.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::value_objects::{MemoryCategory, ScopeId};

pub const MEMORY_ROOT: &str = "memory";

/// Registry of private scopes that have reminders
pub const DIRECT_REMINDER_SCOPES_PATH: &str = "memory/.dm_reminder_scopes.json";

pub fn scope_root(scope: &ScopeId) -> String {
    format!("{}/{}", MEMORY_ROOT, scope)
}

pub fn category_dir(scope: &ScopeId, category: MemoryCategory) -> String {
    format!("{}/{}", scope_root(scope), category)
}

pub fn category_dirs(scope: &ScopeId, categories: &[MemoryCategory]) -> Vec<String> {
    categories.iter().map(|c| category_dir(scope, *c)).collect()
}

pub fn legacy_category_dir(category: MemoryCategory) -> String {
    format!("{}/{}", MEMORY_ROOT, category)
}

pub fn legacy_category_dirs(categories: &[MemoryCategory]) -> Vec<String> {
    categories.iter().map(|c| legacy_category_dir(*c)).collect()
}

pub fn index_path(scope: &ScopeId) -> String {
    format!("{}/.index.json", scope_root(scope))
}

pub fn reminders_path(scope: &ScopeId) -> String {
    format!("{}/.reminders.json", scope_root(scope))
}

/// Fresh record path; every call yields a new id
pub fn new_memory_path(scope: &ScopeId, category: MemoryCategory, date: NaiveDate) -> String {
    format!(
        "{}/{}-{}.md",
        category_dir(scope, category),
        date.format("%Y-%m-%d"),
        Uuid::now_v7()
    )
}

/// Whether `path` is a record file belonging to `scope`
pub fn belongs_to_scope(path: &str, scope: &ScopeId) -> bool {
    path.strip_prefix(&scope_root(scope))
        .and_then(|rest| rest.strip_prefix('/'))
        .and_then(|rest| rest.split_once('/'))
        .map(|(category, file)| {
            category.parse::<MemoryCategory>().is_ok() && !file.contains('/') && file.ends_with(".md")
        })
        .unwrap_or(false)
}

/// Whether `path` is a record file in the legacy layout
pub fn is_legacy_path(path: &str) -> bool {
    path.strip_prefix(MEMORY_ROOT)
        .and_then(|rest| rest.strip_prefix('/'))
        .and_then(|rest| rest.split_once('/'))
        .map(|(category, file)| {
            category.parse::<MemoryCategory>().is_ok() && !file.contains('/') && file.ends_with(".md")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> ScopeId {
        ScopeId::new("g1").unwrap()
    }

    #[test]
    fn test_layout() {
        let s = scope();
        assert_eq!(category_dir(&s, MemoryCategory::Tasks), "memory/g1/tasks");
        assert_eq!(legacy_category_dir(MemoryCategory::Tasks), "memory/tasks");
        assert_eq!(index_path(&s), "memory/g1/.index.json");
        assert_eq!(reminders_path(&s), "memory/g1/.reminders.json");
    }

    #[test]
    fn test_new_paths_are_unique_and_ordered() {
        let s = scope();
        let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let paths: Vec<String> = (0..50)
            .map(|_| new_memory_path(&s, MemoryCategory::Tasks, date))
            .collect();

        assert!(paths[0].starts_with("memory/g1/tasks/2026-10-17-"));
        assert!(paths[0].ends_with(".md"));

        let mut sorted = paths.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, paths);
    }

    #[test]
    fn test_path_membership() {
        let s = scope();
        assert!(belongs_to_scope("memory/g1/tasks/2026-10-17-x.md", &s));
        assert!(!belongs_to_scope("memory/g1/.index.json", &s));
        assert!(!belongs_to_scope("memory/g10/tasks/a.md", &s));
        assert!(!belongs_to_scope("memory/tasks/a.md", &s));

        assert!(is_legacy_path("memory/tasks/2024-01-01-x.md"));
        assert!(!is_legacy_path("memory/g1/tasks/2024-01-01-x.md"));
    }
}
