//! Per-scope mutual exclusion
//!
//! A registry of async mutexes keyed by string (`index:{scope}`,
//! `reminders:{scope}`). Waiters on one key queue in FIFO order; distinct
//! keys never block each other. An entry is dropped from the registry as
//! soon as its last holder and waiter are gone.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = HashMap<String, Arc<AsyncMutex<()>>>;

#[derive(Clone, Default)]
pub struct ScopeLocks {
    locks: Arc<Mutex<LockMap>>,
}

impl ScopeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(locks: &Mutex<LockMap>) -> MutexGuard<'_, LockMap> {
        locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for exclusive access to `key`
    pub async fn lock(&self, key: impl Into<String>) -> ScopeGuard {
        let key = key.into();
        let mutex = Self::map(&self.locks).entry(key.clone()).or_default().clone();
        // Bound before the wait so a cancelled waiter still releases its entry
        let registration = Registration {
            key,
            locks: Arc::clone(&self.locks),
        };
        let guard = mutex.lock_owned().await;

        ScopeGuard {
            _guard: guard,
            _registration: registration,
        }
    }

    /// Number of keys currently held or waited on
    pub fn active(&self) -> usize {
        Self::map(&self.locks).len()
    }
}

/// Claim on a registry entry; the entry goes once no holder or waiter
/// references its mutex
struct Registration {
    key: String,
    locks: Arc<Mutex<LockMap>>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut map = ScopeLocks::map(&self.locks);
        let idle = map
            .get(&self.key)
            .map(|mutex| Arc::strong_count(mutex) == 1)
            .unwrap_or(false);
        if idle {
            map.remove(&self.key);
        }
    }
}

/// Held lock; releasing it wakes the next waiter on the same key
pub struct ScopeGuard {
    // Dropped in order: the mutex is released before the entry is checked
    _guard: OwnedMutexGuard<()>,
    _registration: Registration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_same_key_is_serialized() {
        let locks = ScopeLocks::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut tasks = Vec::new();
        for i in 0..3 {
            let locks = locks.clone();
            let order = Arc::clone(&order);
            tasks.push(tokio::spawn(async move {
                let _guard = locks.lock("index:g1").await;
                order.lock().unwrap().push(format!("start {}", i));
                tokio::time::sleep(Duration::from_millis(10)).await;
                order.lock().unwrap().push(format!("end {}", i));
            }));
            tokio::task::yield_now().await;
        }
        for task in tasks {
            task.await.unwrap();
        }

        let order = order.lock().unwrap();
        for pair in order.chunks(2) {
            let start = pair[0].strip_prefix("start ").unwrap();
            let end = pair[1].strip_prefix("end ").unwrap();
            assert_eq!(start, end, "overlapping critical sections: {:?}", order);
        }
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_run_concurrently() {
        let locks = ScopeLocks::new();
        let _g1 = locks.lock("index:g1").await;

        let other = tokio::time::timeout(Duration::from_millis(5), locks.lock("index:g2")).await;
        assert!(other.is_ok());

        let same = tokio::time::timeout(Duration::from_millis(5), locks.lock("index:g1")).await;
        assert!(same.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_dropped_after_release_leaves_no_entry() {
        let locks = ScopeLocks::new();
        let held = locks.lock("index:g1").await;

        let mut waiter = Box::pin(locks.lock("index:g1"));
        let pending = tokio::time::timeout(Duration::from_millis(5), &mut waiter).await;
        assert!(pending.is_err());

        // The holder hands over to a waiter that never resumes
        drop(held);
        assert_eq!(locks.active(), 1);
        drop(waiter);
        assert_eq!(locks.active(), 0);

        let again = tokio::time::timeout(Duration::from_millis(5), locks.lock("index:g1")).await;
        assert!(again.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_waiter_leaves_no_entry() {
        let locks = ScopeLocks::new();
        let held = locks.lock("reminders:dm-42").await;
        let waiter = tokio::time::timeout(Duration::from_millis(5), locks.lock("reminders:dm-42")).await;
        assert!(waiter.is_err());

        drop(held);
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_registry_entry_removed_after_release() {
        let locks = ScopeLocks::new();
        {
            let _guard = locks.lock("reminders:g1").await;
            assert_eq!(locks.active(), 1);
        }
        assert_eq!(locks.active(), 0);
    }
}
