//! Memory Application Service (Use Case)
//!
//! Facade the chat layer talks to: save, edit, delete, search, list and
//! recent. Record files are the source of truth; the per-scope manifest
//! kept by [`IndexService`] is updated after the fact and may trail the
//! file set by one background append.
//!
//! Records written before scopes existed (`memory/{category}/...`) are
//! still read by search, list and recent, never written.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tokio::time::Instant;

use dolphive::paths;
use dolphive::{
    ContentStore, CreateMemoryInput, DomainError, FileInfo, Frontmatter, IndexEntry,
    IndexEntryPatch, MemoryCategory, MemoryRecord, MemoryUpdate, MemoryView, SavedMemory,
    ScopeId,
};

use super::index_service::IndexService;

/// Create attempts, each at a freshly generated path
const MAX_CREATE_ATTEMPTS: usize = 3;
/// Attempts of the background index append
const MAX_INDEX_ATTEMPTS: usize = 3;

/// Application service for memory operations
pub struct MemoryService<S: ContentStore + ?Sized> {
    store: Arc<S>,
    index: Arc<IndexService<S>>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: ContentStore + ?Sized + 'static> MemoryService<S> {
    pub fn new(store: Arc<S>, index: Arc<IndexService<S>>) -> Self {
        Self {
            store,
            index,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn index(&self) -> &IndexService<S> {
        &self.index
    }

    fn pending(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write a new record and queue its index entry
    pub async fn save(
        &self,
        input: &CreateMemoryInput,
        scope: &ScopeId,
        author_id: Option<&str>,
    ) -> Result<SavedMemory, DomainError> {
        if input.title.trim().is_empty() {
            return Err(DomainError::Validation("Memory title must not be empty".into()));
        }

        let started = Instant::now();
        let today = chrono::Local::now().date_naive();
        let frontmatter = Frontmatter::from_input(input, today, author_id);
        let markdown = MemoryRecord::new(frontmatter.clone(), input.content.clone()).render()?;
        let message = format!("Add {}: {}", frontmatter.category(), frontmatter.title);

        let mut attempt = 0;
        let (path, commit) = loop {
            attempt += 1;
            let path = paths::new_memory_path(scope, frontmatter.category(), today);

            match self.store.create_file(&path, &markdown, &message).await {
                Ok(commit) => break (path, commit),
                Err(e) if e.is_path_collision() && attempt < MAX_CREATE_ATTEMPTS => {
                    tracing::warn!(path = %path, attempt, "Path collision, regenerating: {}", e);
                }
                Err(e) if e.is_path_collision() => {
                    return Err(DomainError::Conflict(format!(
                        "Failed to create memory after {} attempts: {}",
                        MAX_CREATE_ATTEMPTS, e
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        };

        self.index.invalidate(scope);
        self.spawn_index_append(scope.clone(), IndexEntry::from_frontmatter(&path, &frontmatter));

        tracing::debug!(
            scope = %scope,
            path = %path,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Saved memory"
        );

        Ok(SavedMemory {
            path,
            sha: commit.sha,
            frontmatter,
        })
    }

    fn spawn_index_append(&self, scope: ScopeId, entry: IndexEntry) {
        let index = Arc::clone(&self.index);
        let handle = tokio::spawn(async move {
            for attempt in 1..=MAX_INDEX_ATTEMPTS {
                match index.append(&scope, entry.clone()).await {
                    Ok(()) => return,
                    Err(e) if attempt < MAX_INDEX_ATTEMPTS => {
                        tracing::warn!(
                            scope = %scope,
                            path = %entry.path,
                            attempt,
                            "Index append failed, retrying: {}",
                            e
                        );
                        index.invalidate(&scope);
                    }
                    Err(e) => {
                        tracing::error!(
                            scope = %scope,
                            path = %entry.path,
                            "Index append failed, entry left for the next rebuild: {}",
                            e
                        );
                    }
                }
            }
        });

        let mut pending = self.pending();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Wait for every queued index update to finish
    pub async fn settle(&self) {
        loop {
            let handles = std::mem::take(&mut *self.pending());
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::error!("Index update task panicked: {}", e);
                }
            }
        }
    }

    /// Apply a partial update to an existing record
    pub async fn edit(
        &self,
        scope: &ScopeId,
        path: &str,
        update: &MemoryUpdate,
    ) -> Result<MemoryView, DomainError> {
        ensure_addressable(scope, path)?;

        let stored = self
            .store
            .get_file(path)
            .await?
            .ok_or_else(|| DomainError::not_found("Memory", path))?;
        let mut record = MemoryRecord::parse(&stored.content)?;
        update.apply(&mut record);

        let message = format!("Edit memory: {}", record.frontmatter.title);
        self.store
            .update_file(path, &record.render()?, &message, &stored.sha)
            .await?;

        if update.title.is_some() || update.summary.is_some() || update.tags.is_some() {
            let patch = IndexEntryPatch {
                title: update.title.clone(),
                summary: update.summary.clone(),
                tags: update.tags.clone(),
            };
            self.index.patch(scope, path, &patch).await?;
        }
        self.index.invalidate(scope);

        tracing::debug!(scope = %scope, path = %path, "Edited memory");

        Ok(MemoryView {
            path: path.to_string(),
            frontmatter: record.frontmatter,
            content: record.content,
        })
    }

    pub async fn delete(&self, scope: &ScopeId, path: &str) -> Result<(), DomainError> {
        ensure_addressable(scope, path)?;

        let stored = self
            .store
            .get_file(path)
            .await?
            .ok_or_else(|| DomainError::not_found("Memory", path))?;

        self.store
            .delete_file(path, &format!("Delete memory: {}", path), &stored.sha)
            .await?;

        self.index.remove(scope, path).await?;
        self.index.invalidate(scope);

        tracing::debug!(scope = %scope, path = %path, "Deleted memory");
        Ok(())
    }

    /// Parsed front-matter of a record, `None` when absent or unparseable
    pub async fn get_frontmatter(
        &self,
        scope: &ScopeId,
        path: &str,
    ) -> Result<Option<Frontmatter>, DomainError> {
        ensure_addressable(scope, path)?;

        Ok(self
            .read_record(path)
            .await?
            .map(|view| view.frontmatter))
    }

    /// Case-insensitive substring search over title, summary and tags
    pub async fn search(
        &self,
        query: &str,
        scope: &ScopeId,
        categories: Option<&[MemoryCategory]>,
    ) -> Result<Vec<MemoryView>, DomainError> {
        let started = Instant::now();
        let categories = categories
            .filter(|c| !c.is_empty())
            .unwrap_or(&MemoryCategory::ALL);
        let query = query.trim().to_lowercase();

        let snapshot = self.index.get_index(scope).await?;
        let manifest = snapshot.manifest;

        let mut results: Vec<MemoryView> = manifest
            .entries
            .iter()
            .filter(|e| categories.contains(&e.category) && e.matches(&query))
            .map(|e| e.to_view())
            .collect();

        // Legacy records are not indexed; read them one by one
        let legacy = self
            .store
            .list_files_in(&paths::legacy_category_dirs(categories))
            .await?;
        for file in legacy.iter().filter(|f| f.is_markdown()) {
            if manifest.contains(&file.path) {
                continue;
            }
            if let Some(view) = self.read_record(&file.path).await? {
                if view.frontmatter.searchable_text().contains(&query) {
                    results.push(view);
                }
            }
        }

        tracing::debug!(
            scope = %scope,
            results = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Searched memories"
        );
        Ok(results)
    }

    /// Every record of one category, scoped and legacy, newest first
    pub async fn list(
        &self,
        category: MemoryCategory,
        scope: &ScopeId,
    ) -> Result<Vec<MemoryView>, DomainError> {
        let dirs = vec![
            paths::category_dir(scope, category),
            paths::legacy_category_dir(category),
        ];
        let mut files = dedup_markdown(self.store.list_files_in(&dirs).await?);
        newest_first(&mut files);
        self.read_records(&files).await
    }

    /// The `limit` newest records across all categories
    pub async fn recent(&self, scope: &ScopeId, limit: usize) -> Result<Vec<MemoryView>, DomainError> {
        let mut dirs = paths::category_dirs(scope, &MemoryCategory::ALL);
        dirs.extend(paths::legacy_category_dirs(&MemoryCategory::ALL));

        let mut files = dedup_markdown(self.store.list_files_in(&dirs).await?);
        newest_first(&mut files);
        files.truncate(limit);

        self.read_records(&files).await
    }

    async fn read_records(&self, files: &[FileInfo]) -> Result<Vec<MemoryView>, DomainError> {
        let mut views = Vec::with_capacity(files.len());
        for file in files {
            if let Some(view) = self.read_record(&file.path).await? {
                views.push(view);
            }
        }
        Ok(views)
    }

    /// Read and parse one record; absent or unparseable files yield `None`
    async fn read_record(&self, path: &str) -> Result<Option<MemoryView>, DomainError> {
        let Some(stored) = self.store.get_file(path).await? else {
            return Ok(None);
        };

        match MemoryRecord::parse(&stored.content) {
            Ok(record) => Ok(Some(MemoryView {
                path: path.to_string(),
                frontmatter: record.frontmatter,
                content: record.content,
            })),
            Err(e) => {
                tracing::warn!(path = %path, "Skipping unparseable memory: {}", e);
                Ok(None)
            }
        }
    }
}

/// `{date}-{uuid v7}` names sort chronologically
fn newest_first(files: &mut [FileInfo]) {
    files.sort_by(|a, b| b.name.cmp(&a.name));
}

/// Edits and deletes may only touch records of the caller's scope or the
/// shared legacy layout
fn ensure_addressable(scope: &ScopeId, path: &str) -> Result<(), DomainError> {
    if paths::belongs_to_scope(path, scope) || paths::is_legacy_path(path) {
        Ok(())
    } else {
        Err(DomainError::Validation(format!(
            "Path '{}' is not a memory of scope '{}'",
            path, scope
        )))
    }
}

fn dedup_markdown(files: Vec<FileInfo>) -> Vec<FileInfo> {
    let mut seen = HashSet::new();
    files
        .into_iter()
        .filter(|f| f.is_markdown() && seen.insert(f.path.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store::StoreOp;
    use crate::adapters::InMemoryContentStore;
    use crate::application::index_service::IndexConfig;
    use crate::application::scope_lock::ScopeLocks;
    use chrono::NaiveDate;
    use dolphive::{StoreError, TaskStatus};
    use std::time::Duration;

    struct Fixture {
        store: Arc<InMemoryContentStore>,
        memories: MemoryService<InMemoryContentStore>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryContentStore::new());
        let index = Arc::new(IndexService::new(
            Arc::clone(&store),
            ScopeLocks::new(),
            IndexConfig::default(),
        ));
        Fixture {
            memories: MemoryService::new(Arc::clone(&store), index),
            store,
        }
    }

    fn g1() -> ScopeId {
        ScopeId::new("g1").unwrap()
    }

    fn buy_milk() -> CreateMemoryInput {
        CreateMemoryInput {
            category: MemoryCategory::Tasks,
            title: "Buy milk".into(),
            summary: "grocery".into(),
            tags: vec!["errand".into()],
            content: "- [ ] milk".into(),
            status: Some(TaskStatus::Todo),
            ..Default::default()
        }
    }

    fn legacy_markdown(title: &str, tags: &[&str]) -> String {
        let input = CreateMemoryInput {
            category: MemoryCategory::Ideas,
            title: title.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            summary: "old".into(),
            ..Default::default()
        };
        let fm = Frontmatter::from_input(&input, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(), None);
        MemoryRecord::new(fm, "legacy body").render().unwrap()
    }

    #[tokio::test]
    async fn test_save_writes_markdown_and_eventually_indexes() {
        let f = fixture();
        let saved = f.memories.save(&buy_milk(), &g1(), Some("42")).await.unwrap();

        let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
        let prefix = format!("memory/g1/tasks/{}-", today);
        assert!(saved.path.starts_with(&prefix), "{}", saved.path);
        assert!(saved.path.ends_with(".md"));

        let file = f.store.read_raw(&saved.path).unwrap();
        assert!(file.contains("type: tasks"));
        assert!(file.contains("author_id: '42'") || file.contains("author_id: \"42\""));
        assert!(file.ends_with("- [ ] milk"));

        f.memories.settle().await;
        let index = f.memories.index().get_index(&g1()).await.unwrap();
        assert_eq!(index.manifest.entries.len(), 1);
        assert_eq!(index.manifest.entries[0].title, "Buy milk");
        assert_eq!(index.manifest.entries[0].path, saved.path);
    }

    #[tokio::test]
    async fn test_sequential_saves_get_unique_paths_and_index_rows() {
        let f = fixture();
        let mut paths = HashSet::new();
        for _ in 0..5 {
            let saved = f.memories.save(&buy_milk(), &g1(), None).await.unwrap();
            paths.insert(saved.path);
        }
        assert_eq!(paths.len(), 5);

        f.memories.settle().await;
        let index = f.memories.index().get_index(&g1()).await.unwrap();
        assert_eq!(index.manifest.entries.len(), 5);
        let indexed: HashSet<_> = index.manifest.entries.iter().map(|e| e.path.clone()).collect();
        assert_eq!(indexed, paths);
    }

    #[tokio::test]
    async fn test_save_regenerates_path_on_collision() {
        let f = fixture();
        let collision = StoreError::Unprocessable {
            path: "x".into(),
            message: "sha wasn't supplied".into(),
        };
        f.store.fail_next(StoreOp::Create, collision.clone());
        f.store.fail_next(StoreOp::Create, collision);

        f.memories.save(&buy_milk(), &g1(), None).await.unwrap();
        assert_eq!(f.store.calls(StoreOp::Create), 3);
    }

    #[tokio::test]
    async fn test_save_gives_up_after_three_collisions() {
        let f = fixture();
        for _ in 0..3 {
            f.store.fail_next(
                StoreOp::Create,
                StoreError::Conflict {
                    path: "x".into(),
                    message: "exists".into(),
                },
            );
        }

        let err = f.memories.save(&buy_milk(), &g1(), None).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ref m) if m.contains("after 3 attempts")));
        assert!(f.store.paths().is_empty());
    }

    #[tokio::test]
    async fn test_save_propagates_other_failures() {
        let f = fixture();
        f.store.fail_next(
            StoreOp::Create,
            StoreError::Api {
                status: 401,
                message: "Bad credentials".into(),
            },
        );

        let err = f.memories.save(&buy_milk(), &g1(), None).await.unwrap_err();
        assert!(err.user_message().contains("permissions"));
        assert_eq!(f.store.calls(StoreOp::Create), 1);
    }

    #[tokio::test]
    async fn test_failed_background_append_is_retried() {
        let f = fixture();
        f.memories.index().get_index(&g1()).await.unwrap();
        f.store.fail_next(StoreOp::Get, StoreError::Network("reset".into()));

        let saved = f.memories.save(&buy_milk(), &g1(), None).await.unwrap();
        f.memories.settle().await;

        let index = f.memories.index().get_index(&g1()).await.unwrap();
        assert!(index.manifest.contains(&saved.path));
    }

    #[tokio::test]
    async fn test_exhausted_background_append_is_swallowed() {
        let f = fixture();
        for _ in 0..MAX_INDEX_ATTEMPTS {
            f.store.fail_next(StoreOp::Get, StoreError::Network("reset".into()));
        }

        let saved = f.memories.save(&buy_milk(), &g1(), None).await;
        assert!(saved.is_ok());
        f.memories.settle().await;

        // The file exists; the manifest is rebuilt on demand once it is missing
        let index = f.memories.index().get_index(&g1()).await.unwrap();
        assert_eq!(index.manifest.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_edit_then_search_finds_new_tag() {
        let f = fixture();
        let saved = f.memories.save(&buy_milk(), &g1(), None).await.unwrap();
        f.memories.settle().await;

        let update = MemoryUpdate {
            tags: Some(vec!["errand".into(), "urgent".into()]),
            ..Default::default()
        };
        let view = f.memories.edit(&g1(), &saved.path, &update).await.unwrap();
        assert_eq!(view.frontmatter.tags, vec!["errand", "urgent"]);
        assert_eq!(view.frontmatter.title, "Buy milk");
        assert_eq!(view.content, "- [ ] milk");

        let results = f.memories.search("urgent", &g1(), None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].path, saved.path);

        let stored = MemoryRecord::parse(&f.store.read_raw(&saved.path).unwrap()).unwrap();
        assert_eq!(stored.frontmatter.tags, vec!["errand", "urgent"]);
        assert_eq!(stored.frontmatter.date, saved.frontmatter.date);
    }

    #[tokio::test]
    async fn test_edit_missing_memory_is_not_found() {
        let f = fixture();
        let err = f
            .memories
            .edit(&g1(), "memory/g1/tasks/2026-01-01-nope.md", &MemoryUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_edit_rejects_foreign_scope() {
        let f = fixture();
        let err = f
            .memories
            .edit(&g1(), "memory/g2/tasks/a.md", &MemoryUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_edits_keep_both_patches() {
        let f = fixture();
        let a = f.memories.save(&buy_milk(), &g1(), None).await.unwrap();
        let b = f.memories.save(&buy_milk(), &g1(), None).await.unwrap();
        f.memories.settle().await;

        f.store.set_latency(Duration::from_millis(5));
        let edit_a = MemoryUpdate {
            title: Some("Buy oat milk".into()),
            ..Default::default()
        };
        let edit_b = MemoryUpdate {
            tags: Some(vec!["weekly".into()]),
            ..Default::default()
        };
        let scope = g1();
        let (ra, rb) = tokio::join!(
            f.memories.edit(&scope, &a.path, &edit_a),
            f.memories.edit(&scope, &b.path, &edit_b)
        );
        ra.unwrap();
        rb.unwrap();

        f.memories.index().invalidate(&scope);
        let manifest = f.memories.index().get_index(&scope).await.unwrap().manifest;
        let row_a = manifest.entries.iter().find(|e| e.path == a.path).unwrap();
        let row_b = manifest.entries.iter().find(|e| e.path == b.path).unwrap();
        assert_eq!(row_a.title, "Buy oat milk");
        assert_eq!(row_b.tags, vec!["weekly"]);
    }

    #[tokio::test]
    async fn test_delete_removes_file_and_index_row() {
        let f = fixture();
        let saved = f.memories.save(&buy_milk(), &g1(), None).await.unwrap();
        f.memories.settle().await;

        f.memories.delete(&g1(), &saved.path).await.unwrap();

        assert!(f.memories.search("Buy milk", &g1(), None).await.unwrap().is_empty());
        assert_eq!(f.store.get_file(&saved.path).await.unwrap(), None);

        let err = f.memories.delete(&g1(), &saved.path).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_search_filters_by_category() {
        let f = fixture();
        f.memories.save(&buy_milk(), &g1(), None).await.unwrap();
        f.memories.settle().await;

        let tasks = f
            .memories
            .search("milk", &g1(), Some(&[MemoryCategory::Tasks][..]))
            .await
            .unwrap();
        assert_eq!(tasks.len(), 1);

        let ideas = f
            .memories
            .search("milk", &g1(), Some(&[MemoryCategory::Ideas][..]))
            .await
            .unwrap();
        assert!(ideas.is_empty());

        let upper = f.memories.search("GROCERY", &g1(), Some(&[][..])).await.unwrap();
        assert_eq!(upper.len(), 1);
    }

    #[tokio::test]
    async fn test_legacy_records_are_found_once() {
        let f = fixture();
        let legacy_path = "memory/ideas/2024-01-05-legacy.md";
        f.store.put_raw(legacy_path, &legacy_markdown("Old podcast idea", &["audio"]));

        let found = f.memories.search("podcast", &g1(), None).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, legacy_path);
        assert_eq!(found[0].content, "legacy body");

        let listed = f.memories.list(MemoryCategory::Ideas, &g1()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].path, legacy_path);

        // Once indexed, the manifest row wins and the scan skips it
        let fm = MemoryRecord::parse(&f.store.read_raw(legacy_path).unwrap())
            .unwrap()
            .frontmatter;
        f.memories
            .index()
            .append(&g1(), IndexEntry::from_frontmatter(legacy_path, &fm))
            .await
            .unwrap();
        let found = f.memories.search("podcast", &g1(), None).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_list_skips_unparseable_files() {
        let f = fixture();
        f.memories.save(&buy_milk(), &g1(), None).await.unwrap();
        f.store.put_raw("memory/g1/tasks/2026-01-01-broken.md", "no front-matter");
        f.store.put_raw("memory/g1/tasks/notes.txt", "ignored");

        let listed = f.memories.list(MemoryCategory::Tasks, &g1()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].frontmatter.title, "Buy milk");
    }

    #[tokio::test]
    async fn test_recent_is_newest_first_across_layouts() {
        let f = fixture();
        f.store.put_raw("memory/ideas/2024-01-05-legacy.md", &legacy_markdown("Old", &[]));
        let first = f.memories.save(&buy_milk(), &g1(), None).await.unwrap();
        let mut second_input = buy_milk();
        second_input.category = MemoryCategory::Daily;
        second_input.title = "Diary".into();
        let second = f.memories.save(&second_input, &g1(), None).await.unwrap();

        let recent = f.memories.recent(&g1(), 2).await.unwrap();
        let paths: Vec<_> = recent.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec![second.path.as_str(), first.path.as_str()]);

        let all = f.memories.recent(&g1(), 10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].path, "memory/ideas/2024-01-05-legacy.md");
    }

    #[tokio::test]
    async fn test_list_is_newest_first_across_layouts() {
        let f = fixture();
        f.store.put_raw("memory/tasks/2024-01-05-legacy.md", &legacy_markdown("Old", &[]));
        let first = f.memories.save(&buy_milk(), &g1(), None).await.unwrap();
        let second = f.memories.save(&buy_milk(), &g1(), None).await.unwrap();

        let listed = f.memories.list(MemoryCategory::Tasks, &g1()).await.unwrap();
        let paths: Vec<_> = listed.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                second.path.as_str(),
                first.path.as_str(),
                "memory/tasks/2024-01-05-legacy.md"
            ]
        );
    }

    #[tokio::test]
    async fn test_get_frontmatter() {
        let f = fixture();
        let saved = f.memories.save(&buy_milk(), &g1(), Some("42")).await.unwrap();

        let fm = f.memories.get_frontmatter(&g1(), &saved.path).await.unwrap().unwrap();
        assert_eq!(fm.author_id.as_deref(), Some("42"));
        assert!(f
            .memories
            .get_frontmatter(&g1(), "memory/g1/tasks/2026-01-01-gone.md")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let f = fixture();
        f.memories.save(&buy_milk(), &g1(), None).await.unwrap();
        f.memories.settle().await;

        let dm = ScopeId::direct("42").unwrap();
        assert!(f.memories.search("milk", &dm, None).await.unwrap().is_empty());
        assert!(f.memories.recent(&dm, 10).await.unwrap().is_empty());
    }
}
