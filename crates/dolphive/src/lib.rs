//! Dolphive Domain Library
//!
//! Core domain types and interfaces for the Dolphive memory store: Markdown
//! memory records kept in a Git repository, a per-scope search manifest, and
//! scheduled reminders.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain/`): Pure business entities and logic
//!   - `entities/`: Core domain models (MemoryRecord, IndexManifest, Reminder)
//!   - `value_objects/`: Immutable value types (MemoryCategory, ScopeId)
//!   - `services/`: Markdown codec and storage path scheme
//!   - `errors/`: Domain-specific error types
//!
//! - **Ports** (`ports/`): Abstract interfaces (traits)
//!   - `content_store`: Versioned file storage
//!   - `notifier`: Reminder delivery
//!
//! # Usage
//!
//! ```rust,ignore
//! use dolphive::domain::{MemoryRecord, ScopeId};
//! use dolphive::ports::ContentStore;
//! ```

pub mod domain;
pub mod ports;

// Re-export commonly used types
pub use domain::services::paths;
pub use domain::{
    CreateMemoryInput, DirectScopeRegistry, DomainError, Frontmatter, IndexEntry,
    IndexEntryPatch, IndexManifest, ManifestRejection, MemoryCategory, MemoryKind,
    MemoryRecord, MemoryUpdate, MemoryView, Priority, Recurrence, Reminder, ReminderQueue,
    SavedMemory, ScheduleDetails, ScopeId, Source, TaskDetails, TaskStatus, INDEX_VERSION,
};
pub use ports::{
    // Storage
    CommitInfo,
    ContentStore,
    EntryKind,
    FileInfo,
    // Delivery
    ReminderNotifier,
    StoreError,
    StoredFile,
};
