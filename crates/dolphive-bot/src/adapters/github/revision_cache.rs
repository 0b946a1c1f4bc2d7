//! Revision Cache
//!
//! Per-path ETag cache for conditional reads. An entry younger than the
//! staleness window supplies an `If-None-Match` validator; a `304` answer
//! confirms the cached payload and restarts its window. Older entries are
//! dropped and the path is fetched unconditionally.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

pub const DEFAULT_STALENESS: Duration = Duration::from_secs(5 * 60);

struct CachedRevision<T> {
    etag: String,
    value: T,
    checked_at: Instant,
}

pub struct RevisionCache<T> {
    entries: Mutex<HashMap<String, CachedRevision<T>>>,
    staleness: Duration,
}

impl<T: Clone> RevisionCache<T> {
    pub fn new(staleness: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            staleness,
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, CachedRevision<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validator to send with the next read of `key`, if the cached entry
    /// is still inside its window
    pub fn validator(&self, key: &str) -> Option<String> {
        let mut entries = self.entries();
        match entries.get(key) {
            Some(entry) if entry.checked_at.elapsed() < self.staleness => Some(entry.etag.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// The store answered "not modified": hand back the cached payload
    pub fn confirm(&self, key: &str) -> Option<T> {
        let mut entries = self.entries();
        entries.get_mut(key).map(|entry| {
            entry.checked_at = Instant::now();
            entry.value.clone()
        })
    }

    pub fn store(&self, key: &str, etag: String, value: T) {
        self.entries().insert(
            key.to_string(),
            CachedRevision {
                etag,
                value,
                checked_at: Instant::now(),
            },
        );
    }

    pub fn purge(&self, key: &str) {
        self.entries().remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl<T: Clone> Default for RevisionCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_STALENESS)
    }
}
