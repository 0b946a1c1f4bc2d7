//! Index Application Service
//!
//! Owns the per-scope search manifest (`memory/{scope}/.index.json`):
//! cached reads with a short TTL, rebuilds from a full directory scan when
//! the stored manifest is missing, corrupt or from another schema version,
//! and serialized read-modify-write mutations per scope.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use dolphive::paths;
use dolphive::{
    ContentStore, DomainError, EntryKind, IndexEntry, IndexEntryPatch, IndexManifest,
    ManifestRejection, MemoryCategory, MemoryRecord, ScopeId,
};

use super::scope_lock::ScopeLocks;

pub const INDEX_COMMIT_MESSAGE: &str = "Update memory index";

/// Index tunables
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// How long a manifest read is served from memory
    pub cache_ttl: Duration,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(60),
        }
    }
}

/// A manifest together with the revision it was read at (`None` when it
/// has never been persisted)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSnapshot {
    pub manifest: IndexManifest,
    pub sha: Option<String>,
}

struct CachedIndex {
    snapshot: IndexSnapshot,
    cached_at: Instant,
}

/// Application service for the per-scope manifest
pub struct IndexService<S: ContentStore + ?Sized> {
    store: Arc<S>,
    locks: ScopeLocks,
    cache: Mutex<HashMap<ScopeId, CachedIndex>>,
    config: IndexConfig,
}

impl<S: ContentStore + ?Sized> IndexService<S> {
    pub fn new(store: Arc<S>, locks: ScopeLocks, config: IndexConfig) -> Self {
        Self {
            store,
            locks,
            cache: Mutex::new(HashMap::new()),
            config,
        }
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<ScopeId, CachedIndex>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cached(&self, scope: &ScopeId) -> Option<IndexSnapshot> {
        self.cache()
            .get(scope)
            .filter(|c| c.cached_at.elapsed() < self.config.cache_ttl)
            .map(|c| c.snapshot.clone())
    }

    fn remember(&self, scope: &ScopeId, snapshot: IndexSnapshot) {
        self.cache().insert(
            scope.clone(),
            CachedIndex {
                snapshot,
                cached_at: Instant::now(),
            },
        );
    }

    /// Drop the cached manifest so the next read goes to the store
    pub fn invalidate(&self, scope: &ScopeId) {
        self.cache().remove(scope);
    }

    /// Current manifest for `scope`
    pub async fn get_index(&self, scope: &ScopeId) -> Result<IndexSnapshot, DomainError> {
        if let Some(snapshot) = self.cached(scope) {
            return Ok(snapshot);
        }

        let snapshot = self.load(scope).await?;
        self.remember(scope, snapshot.clone());
        Ok(snapshot)
    }

    /// Read the stored manifest, rebuilding it when it cannot be adopted
    async fn load(&self, scope: &ScopeId) -> Result<IndexSnapshot, DomainError> {
        let path = paths::index_path(scope);

        let stale_sha = match self.store.get_file(&path).await? {
            Some(file) => match IndexManifest::parse(&file.content) {
                Ok(manifest) => {
                    return Ok(IndexSnapshot {
                        manifest,
                        sha: Some(file.sha),
                    })
                }
                Err(ManifestRejection::VersionMismatch { found }) => {
                    tracing::info!(
                        scope = %scope,
                        found = ?found,
                        "Index schema version changed, rebuilding"
                    );
                    Some(file.sha)
                }
                Err(ManifestRejection::Corrupt(reason)) => {
                    tracing::warn!(scope = %scope, "Index is corrupt ({}), rebuilding", reason);
                    Some(file.sha)
                }
            },
            None => None,
        };

        if !self.has_records(scope).await? {
            return Ok(IndexSnapshot {
                manifest: IndexManifest::default(),
                sha: stale_sha,
            });
        }

        self.rebuild(scope, stale_sha).await
    }

    /// Does the scope have any category directory at all?
    async fn has_records(&self, scope: &ScopeId) -> Result<bool, DomainError> {
        let children = self.store.list_contents(&paths::scope_root(scope)).await?;
        Ok(children
            .iter()
            .any(|c| c.kind == EntryKind::Dir && c.name.parse::<MemoryCategory>().is_ok()))
    }

    /// Re-derive the manifest from every record file of the scope and
    /// persist it
    pub async fn rebuild(
        &self,
        scope: &ScopeId,
        known_sha: Option<String>,
    ) -> Result<IndexSnapshot, DomainError> {
        let started = Instant::now();
        let dirs = paths::category_dirs(scope, &MemoryCategory::ALL);
        let files = self.store.list_files_in(&dirs).await?;

        let mut entries = Vec::new();
        for file in files.iter().filter(|f| f.is_markdown()) {
            let Some(stored) = self.store.get_file(&file.path).await? else {
                continue;
            };
            match MemoryRecord::parse(&stored.content) {
                Ok(record) => entries.push(IndexEntry::from_frontmatter(&file.path, &record.frontmatter)),
                Err(e) => tracing::warn!(path = %file.path, "Skipping unparseable memory: {}", e),
            }
        }

        let manifest = IndexManifest::with_entries(entries);
        let sha = self.save(scope, &manifest, known_sha).await?;

        tracing::info!(
            scope = %scope,
            entries = manifest.entries.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Rebuilt memory index"
        );

        Ok(IndexSnapshot {
            manifest,
            sha: Some(sha),
        })
    }

    /// Persist `manifest`, returning the new revision. Uses `known_sha`
    /// when given, otherwise checks for an existing file.
    async fn save(
        &self,
        scope: &ScopeId,
        manifest: &IndexManifest,
        known_sha: Option<String>,
    ) -> Result<String, DomainError> {
        let path = paths::index_path(scope);
        let content = manifest
            .to_json()
            .map_err(|e| DomainError::Repository(format!("Failed to serialize index: {}", e)))?;

        let sha = match known_sha {
            Some(sha) => Some(sha),
            None => self.store.get_file(&path).await?.map(|f| f.sha),
        };

        let commit = match sha {
            Some(sha) => {
                self.store
                    .update_file(&path, &content, INDEX_COMMIT_MESSAGE, &sha)
                    .await?
            }
            None => {
                self.store
                    .create_file(&path, &content, INDEX_COMMIT_MESSAGE)
                    .await?
            }
        };

        self.remember(
            scope,
            IndexSnapshot {
                manifest: manifest.clone(),
                sha: Some(commit.sha.clone()),
            },
        );
        Ok(commit.sha)
    }

    /// Run `mutate` against a freshly read manifest under the scope lock,
    /// saving only when it reports a change
    async fn mutate<F>(&self, scope: &ScopeId, mutate: F) -> Result<bool, DomainError>
    where
        F: FnOnce(&mut IndexManifest) -> bool,
    {
        let _guard = self.locks.lock(format!("index:{}", scope)).await;

        let IndexSnapshot { mut manifest, sha } = self.load(scope).await?;
        if !mutate(&mut manifest) {
            self.remember(scope, IndexSnapshot { manifest, sha });
            return Ok(false);
        }

        self.save(scope, &manifest, sha).await?;
        Ok(true)
    }

    /// Add (or replace) the row for a new record
    pub async fn append(&self, scope: &ScopeId, entry: IndexEntry) -> Result<(), DomainError> {
        let path = entry.path.clone();
        self.mutate(scope, move |manifest| {
            manifest.upsert(entry);
            true
        })
        .await?;

        tracing::debug!(scope = %scope, path = %path, "Appended index entry");
        Ok(())
    }

    /// Remove the row for `path`; returns whether one existed
    pub async fn remove(&self, scope: &ScopeId, path: &str) -> Result<bool, DomainError> {
        self.mutate(scope, |manifest| manifest.remove(path)).await
    }

    /// Patch the denormalized fields of the row for `path`
    pub async fn patch(
        &self,
        scope: &ScopeId,
        path: &str,
        patch: &IndexEntryPatch,
    ) -> Result<bool, DomainError> {
        self.mutate(scope, |manifest| manifest.patch(path, patch)).await
    }
}
