//! Reminder Application Service (Use Case)
//!
//! One JSON queue per scope (`memory/{scope}/.reminders.json`) plus a
//! registry of private scopes so their queues are found at start-up.
//! Loaded queues are kept in memory for the due-check; every mutation
//! re-reads the stored queue under the scope lock before writing it back.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{de::DeserializeOwned, Serialize};

use dolphive::paths;
use dolphive::{
    ContentStore, DirectScopeRegistry, DomainError, Reminder, ReminderNotifier, ReminderQueue,
    ScopeId,
};

use super::scope_lock::ScopeLocks;

/// Upper bound on deliveries per due-check
pub const MAX_FIRE_PER_TICK: usize = 10;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const REGISTRY_LOCK: &str = "reminders:.dm_scopes";

/// Request to schedule a reminder
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub user_id: String,
    pub channel_id: String,
    pub message: String,
    pub trigger_time: DateTime<Utc>,
}

/// Outcome of one due-check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FireReport {
    pub delivered: usize,
    pub failed: usize,
}

impl FireReport {
    pub fn total(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Application service for reminders
pub struct ReminderService<S: ContentStore + ?Sized> {
    store: Arc<S>,
    locks: ScopeLocks,
    queues: Mutex<HashMap<ScopeId, Vec<Reminder>>>,
}

impl<S: ContentStore + ?Sized> ReminderService<S> {
    pub fn new(store: Arc<S>, locks: ScopeLocks) -> Self {
        Self {
            store,
            locks,
            queues: Mutex::new(HashMap::new()),
        }
    }

    fn queues(&self) -> MutexGuard<'_, HashMap<ScopeId, Vec<Reminder>>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_key(scope: &ScopeId) -> String {
        format!("reminders:{}", scope)
    }

    /// Load the queues of `guild_scopes` and of every registered private
    /// scope. Returns the number of pending reminders.
    pub async fn load_all(&self, guild_scopes: &[ScopeId]) -> Result<usize, DomainError> {
        let (registry, _) = self
            .read_json::<DirectScopeRegistry>(paths::DIRECT_REMINDER_SCOPES_PATH)
            .await?;

        let mut scopes: Vec<ScopeId> = guild_scopes.to_vec();
        for id in registry.scopes {
            match ScopeId::new(id.as_str()) {
                Ok(scope) if !scopes.contains(&scope) => scopes.push(scope),
                Ok(_) => {}
                Err(e) => tracing::warn!("Ignoring registered scope '{}': {}", id, e),
            }
        }

        let mut pending = 0;
        for scope in &scopes {
            pending += self.reload(scope).await?.len();
        }

        tracing::info!(scopes = scopes.len(), pending, "Loaded reminder queues");
        Ok(pending)
    }

    /// Schedule a reminder
    pub async fn set_reminder(
        &self,
        scope: &ScopeId,
        request: NewReminder,
    ) -> Result<Reminder, DomainError> {
        if request.message.trim().is_empty() {
            return Err(DomainError::Validation("Reminder message must not be empty".into()));
        }

        if scope.is_direct() {
            self.register_direct_scope(scope).await?;
        }

        let now = Utc::now();
        let reminder = Reminder {
            id: new_reminder_id(now),
            user_id: request.user_id,
            channel_id: request.channel_id,
            message: request.message,
            trigger_time: request.trigger_time,
            created_at: now,
        };

        let _guard = self.locks.lock(Self::lock_key(scope)).await;
        let (mut queue, sha) = self.read_queue(scope).await?;
        queue.reminders.push(reminder.clone());
        self.write_queue(scope, queue, sha).await?;

        tracing::info!(scope = %scope, id = %reminder.id, trigger_time = %reminder.trigger_time, "Reminder set");
        Ok(reminder)
    }

    /// Pending reminders of one user
    pub async fn list_reminders(
        &self,
        scope: &ScopeId,
        user_id: &str,
    ) -> Result<Vec<Reminder>, DomainError> {
        let cached = self.queues().get(scope).cloned();
        let reminders = match cached {
            Some(reminders) => reminders,
            None => self.reload(scope).await?,
        };

        Ok(reminders.into_iter().filter(|r| r.user_id == user_id).collect())
    }

    /// Remove a reminder; returns whether it existed
    pub async fn cancel_reminder(&self, scope: &ScopeId, id: &str) -> Result<bool, DomainError> {
        let _guard = self.locks.lock(Self::lock_key(scope)).await;
        let (mut queue, sha) = self.read_queue(scope).await?;

        let before = queue.reminders.len();
        queue.reminders.retain(|r| r.id != id);
        if queue.reminders.len() == before {
            self.queues().insert(scope.clone(), queue.reminders);
            return Ok(false);
        }

        self.write_queue(scope, queue, sha).await?;
        tracing::info!(scope = %scope, id = %id, "Reminder cancelled");
        Ok(true)
    }

    /// Deliver due reminders, at most [`MAX_FIRE_PER_TICK`] per call.
    /// Delivered and failed reminders alike leave the queue.
    pub async fn fire_due(
        &self,
        notifier: &dyn ReminderNotifier,
        now: DateTime<Utc>,
    ) -> Result<FireReport, DomainError> {
        let mut due_scopes: Vec<ScopeId> = self
            .queues()
            .iter()
            .filter(|(_, reminders)| reminders.iter().any(|r| r.is_due(now)))
            .map(|(scope, _)| scope.clone())
            .collect();
        due_scopes.sort();

        let mut report = FireReport::default();
        for scope in due_scopes {
            let budget = MAX_FIRE_PER_TICK - report.total();
            if budget == 0 {
                break;
            }

            let _guard = self.locks.lock(Self::lock_key(&scope)).await;
            let (mut queue, sha) = self.read_queue(&scope).await?;

            let due: Vec<Reminder> = queue
                .reminders
                .iter()
                .filter(|r| r.is_due(now))
                .take(budget)
                .cloned()
                .collect();
            if due.is_empty() {
                self.queues().insert(scope.clone(), queue.reminders);
                continue;
            }

            for reminder in &due {
                match notifier.notify(reminder).await {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        tracing::error!(scope = %scope, id = %reminder.id, "Failed to deliver reminder: {}", e);
                        report.failed += 1;
                    }
                }
            }

            queue.reminders.retain(|r| !due.iter().any(|d| d.id == r.id));
            self.write_queue(&scope, queue, sha).await?;
        }

        Ok(report)
    }

    async fn register_direct_scope(&self, scope: &ScopeId) -> Result<(), DomainError> {
        let _guard = self.locks.lock(REGISTRY_LOCK).await;
        let (mut registry, sha) = self
            .read_json::<DirectScopeRegistry>(paths::DIRECT_REMINDER_SCOPES_PATH)
            .await?;

        if registry.scopes.iter().any(|s| s == scope.as_str()) {
            return Ok(());
        }

        registry.scopes.push(scope.to_string());
        self.write_json(
            paths::DIRECT_REMINDER_SCOPES_PATH,
            &registry,
            sha,
            "Update DM reminder scopes",
        )
        .await
    }

    async fn reload(&self, scope: &ScopeId) -> Result<Vec<Reminder>, DomainError> {
        let (queue, _) = self.read_queue(scope).await?;
        self.queues().insert(scope.clone(), queue.reminders.clone());
        Ok(queue.reminders)
    }

    async fn read_queue(&self, scope: &ScopeId) -> Result<(ReminderQueue, Option<String>), DomainError> {
        self.read_json(&paths::reminders_path(scope)).await
    }

    async fn write_queue(
        &self,
        scope: &ScopeId,
        queue: ReminderQueue,
        sha: Option<String>,
    ) -> Result<(), DomainError> {
        self.write_json(&paths::reminders_path(scope), &queue, sha, "Update reminders")
            .await?;
        self.queues().insert(scope.clone(), queue.reminders);
        Ok(())
    }

    /// Read a JSON document; absent or unreadable documents are empty
    async fn read_json<T>(&self, path: &str) -> Result<(T, Option<String>), DomainError>
    where
        T: DeserializeOwned + Default,
    {
        let Some(file) = self.store.get_file(path).await? else {
            return Ok((T::default(), None));
        };

        match serde_json::from_str(&file.content) {
            Ok(value) => Ok((value, Some(file.sha))),
            Err(e) => {
                tracing::warn!(path = %path, "Discarding unreadable JSON: {}", e);
                Ok((T::default(), Some(file.sha)))
            }
        }
    }

    async fn write_json<T: Serialize + Sync>(
        &self,
        path: &str,
        value: &T,
        sha: Option<String>,
        message: &str,
    ) -> Result<(), DomainError> {
        let content = serde_json::to_string_pretty(value)
            .map_err(|e| DomainError::Repository(format!("Failed to serialize {}: {}", path, e)))?;

        match sha {
            Some(sha) => {
                self.store.update_file(path, &content, message, &sha).await?;
            }
            None => {
                self.store.create_file(path, &content, message).await?;
            }
        }
        Ok(())
    }
}

/// `{unix_millis}_{6 base36 chars}`
fn new_reminder_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("{}_{}", now.timestamp_millis(), suffix)
}
