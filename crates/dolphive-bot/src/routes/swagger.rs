//! OpenAPI Documentation
//!
//! Centralized API documentation using utoipa.

use utoipa::OpenApi;

use crate::models::{
    CancelReminderResponse,
    DeleteMemoryResponse,
    EditMemoryRequest,
    FrontmatterResponse,
    HealthResponse,
    MemoryResponse,
    // Reminder models
    ReminderResponse,
    // Memory models
    SaveMemoryRequest,
    SavedMemoryResponse,
    SetReminderRequest,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Memory endpoints
        super::memory::save_memory,
        super::memory::edit_memory,
        super::memory::delete_memory,
        super::memory::search_memories,
        super::memory::list_memories,
        super::memory::recent_memories,
        super::memory::get_frontmatter,
        // Reminder endpoints
        super::reminder::set_reminder,
        super::reminder::list_reminders,
        super::reminder::cancel_reminder,
    ),
    info(
        title = "Dolphive API",
        version = "0.3.0",
        description = "GitHub-backed memory store for the Discord memory bot.\n\nRecords are Markdown files with YAML front-matter, one index manifest per scope.",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Current server"),
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Memory", description = "Memory records - save, edit, delete, search"),
        (name = "Reminder", description = "Reminder queue per scope"),
    ),
    components(
        schemas(
            // Memory
            SaveMemoryRequest,
            EditMemoryRequest,
            MemoryResponse,
            SavedMemoryResponse,
            FrontmatterResponse,
            DeleteMemoryResponse,
            // Reminder
            SetReminderRequest,
            ReminderResponse,
            CancelReminderResponse,
            // Health
            HealthResponse,
        )
    ),
)]
pub struct ApiDoc;
