//! In-memory content store
//!
//! Keeps files in a map with GitHub-like semantics: opaque revision tokens,
//! stale-revision conflicts, create-on-existing rejection, absent reads and
//! listings of immediate children. Used for local runs
//! (`STORAGE_BACKEND=memory`) and throughout the test suite, where failures
//! and latency can be injected.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use dolphive::{CommitInfo, ContentStore, EntryKind, FileInfo, StoreError, StoredFile};

/// Operation a failure can be injected into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Get,
    Create,
    Update,
    Delete,
    List,
}

#[derive(Default)]
struct State {
    files: BTreeMap<String, StoredFile>,
    revision: u64,
    failures: HashMap<StoreOp, VecDeque<StoreError>>,
    calls: HashMap<StoreOp, usize>,
    latency: Duration,
}

impl State {
    fn next_revision(&mut self) -> String {
        self.revision += 1;
        format!("{:040x}", self.revision)
    }

    /// Count the call and pop an injected failure, if any
    fn enter(&mut self, op: StoreOp) -> Result<(), StoreError> {
        *self.calls.entry(op).or_default() += 1;
        match self.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn commit(&mut self, path: &str, sha: String) -> CommitInfo {
        let commit_sha = self.next_revision();
        CommitInfo {
            path: path.to_string(),
            sha,
            commit_sha,
            commit_url: None,
        }
    }
}

#[derive(Default)]
pub struct InMemoryContentStore {
    state: Mutex<State>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next call of `op` fail with `err`. Failures queue up.
    pub fn fail_next(&self, op: StoreOp, err: StoreError) {
        self.state().failures.entry(op).or_default().push_back(err);
    }

    /// Delay applied to every call
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = latency;
    }

    /// Write a file directly, bypassing the create/update contract
    pub fn put_raw(&self, path: &str, content: &str) -> String {
        let mut state = self.state();
        let sha = state.next_revision();
        state.files.insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                sha: sha.clone(),
            },
        );
        sha
    }

    pub fn read_raw(&self, path: &str) -> Option<String> {
        self.state().files.get(path).map(|f| f.content.clone())
    }

    pub fn paths(&self) -> Vec<String> {
        self.state().files.keys().cloned().collect()
    }

    pub fn calls(&self, op: StoreOp) -> usize {
        self.state().calls.get(&op).copied().unwrap_or(0)
    }

    async fn delay(&self) {
        let latency = self.state().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn get_file(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        self.delay().await;
        let mut state = self.state();
        state.enter(StoreOp::Get)?;
        Ok(state.files.get(path).cloned())
    }

    async fn create_file(
        &self,
        path: &str,
        content: &str,
        _message: &str,
    ) -> Result<CommitInfo, StoreError> {
        self.delay().await;
        let mut state = self.state();
        state.enter(StoreOp::Create)?;

        if state.files.contains_key(path) {
            return Err(StoreError::Conflict {
                path: path.to_string(),
                message: "File already exists".to_string(),
            });
        }

        let sha = state.next_revision();
        state.files.insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                sha: sha.clone(),
            },
        );
        Ok(state.commit(path, sha))
    }

    async fn update_file(
        &self,
        path: &str,
        content: &str,
        _message: &str,
        sha: &str,
    ) -> Result<CommitInfo, StoreError> {
        self.delay().await;
        let mut state = self.state();
        state.enter(StoreOp::Update)?;

        let current = state
            .files
            .get(path)
            .map(|f| f.sha.clone())
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        if current != sha {
            return Err(StoreError::Conflict {
                path: path.to_string(),
                message: format!("{} does not match {}", path, sha),
            });
        }

        let new_sha = state.next_revision();
        state.files.insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                sha: new_sha.clone(),
            },
        );
        Ok(state.commit(path, new_sha))
    }

    async fn delete_file(&self, path: &str, _message: &str, sha: &str) -> Result<(), StoreError> {
        self.delay().await;
        let mut state = self.state();
        state.enter(StoreOp::Delete)?;

        match state.files.get(path) {
            None => Err(StoreError::NotFound(path.to_string())),
            Some(file) if file.sha != sha => Err(StoreError::Conflict {
                path: path.to_string(),
                message: format!("{} does not match {}", path, sha),
            }),
            Some(_) => {
                state.files.remove(path);
                Ok(())
            }
        }
    }

    async fn list_contents(&self, dir: &str) -> Result<Vec<FileInfo>, StoreError> {
        self.delay().await;
        let mut state = self.state();
        state.enter(StoreOp::List)?;

        let prefix = format!("{}/", dir.trim_end_matches('/'));
        let mut entries = Vec::new();
        let mut dirs = BTreeSet::new();

        for (path, file) in state.files.range(prefix.clone()..) {
            let Some(rest) = path.strip_prefix(&prefix) else {
                break;
            };
            match rest.split_once('/') {
                Some((sub, _)) => {
                    dirs.insert(sub.to_string());
                }
                None => entries.push(FileInfo {
                    name: rest.to_string(),
                    path: path.clone(),
                    sha: file.sha.clone(),
                    size: file.content.len() as u64,
                    kind: EntryKind::File,
                }),
            }
        }

        entries.extend(dirs.into_iter().map(|name| FileInfo {
            path: format!("{}{}", prefix, name),
            name,
            sha: String::new(),
            size: 0,
            kind: EntryKind::Dir,
        }));
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
