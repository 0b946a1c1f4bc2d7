//! Memory Routes - Record storage per scope
//!
//! HTTP handlers that delegate to MemoryService for business logic.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use dolphive::MemoryCategory;

use super::{api_error, parse_scope, ApiError};
use crate::models::{
    DeleteMemoryResponse, EditMemoryRequest, FrontmatterResponse, MemoryPathQuery, MemoryResponse,
    RecentQuery, SaveMemoryRequest, SavedMemoryResponse, SearchQuery,
};
use crate::AppState;

const DEFAULT_RECENT_LIMIT: usize = 10;

fn parse_category(value: &str) -> Result<MemoryCategory, ApiError> {
    value.parse().map_err(|e: String| (StatusCode::BAD_REQUEST, e))
}

fn views(views: Vec<dolphive::MemoryView>) -> Json<Vec<MemoryResponse>> {
    Json(views.into_iter().map(MemoryResponse::from).collect())
}

/// Save a new memory
#[utoipa::path(
    post,
    path = "/memories/{scope}",
    params(("scope" = String, Path, description = "Guild id or dm-{user_id}")),
    request_body = SaveMemoryRequest,
    responses(
        (status = 200, description = "Memory saved", body = SavedMemoryResponse),
        (status = 400, description = "Invalid input"),
        (status = 429, description = "Storage rate limited"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Memory"
)]
pub async fn save_memory(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    Json(payload): Json<SaveMemoryRequest>,
) -> Result<Json<SavedMemoryResponse>, ApiError> {
    let scope = parse_scope(&scope)?;
    let saved = state
        .memories
        .save(&payload.input, &scope, payload.author_id.as_deref())
        .await
        .map_err(api_error)?;

    Ok(Json(saved.into()))
}

/// Edit an existing memory
#[utoipa::path(
    patch,
    path = "/memories/{scope}",
    params(("scope" = String, Path, description = "Guild id or dm-{user_id}")),
    request_body = EditMemoryRequest,
    responses(
        (status = 200, description = "Memory updated", body = MemoryResponse),
        (status = 400, description = "Path outside the scope"),
        (status = 404, description = "Memory not found"),
        (status = 409, description = "Concurrent modification"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Memory"
)]
pub async fn edit_memory(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    Json(payload): Json<EditMemoryRequest>,
) -> Result<Json<MemoryResponse>, ApiError> {
    let scope = parse_scope(&scope)?;
    let view = state
        .memories
        .edit(&scope, &payload.path, &payload.updates)
        .await
        .map_err(api_error)?;

    Ok(Json(view.into()))
}

/// Delete a memory
#[utoipa::path(
    delete,
    path = "/memories/{scope}",
    params(
        ("scope" = String, Path, description = "Guild id or dm-{user_id}"),
        MemoryPathQuery
    ),
    responses(
        (status = 200, description = "Memory deleted", body = DeleteMemoryResponse),
        (status = 404, description = "Memory not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Memory"
)]
pub async fn delete_memory(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    Query(query): Query<MemoryPathQuery>,
) -> Result<Json<DeleteMemoryResponse>, ApiError> {
    let scope = parse_scope(&scope)?;
    state
        .memories
        .delete(&scope, &query.path)
        .await
        .map_err(api_error)?;

    Ok(Json(DeleteMemoryResponse {
        path: query.path,
        deleted: true,
    }))
}

/// Keyword search over title, summary and tags
#[utoipa::path(
    get,
    path = "/memories/{scope}/search",
    params(
        ("scope" = String, Path, description = "Guild id or dm-{user_id}"),
        SearchQuery
    ),
    responses(
        (status = 200, description = "Matching memories", body = Vec<MemoryResponse>),
        (status = 400, description = "Unknown category"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Memory"
)]
pub async fn search_memories(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<MemoryResponse>>, ApiError> {
    let scope = parse_scope(&scope)?;
    let categories = query
        .categories
        .as_deref()
        .map(|list| {
            list.split(',')
                .filter(|c| !c.trim().is_empty())
                .map(parse_category)
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;

    let results = state
        .memories
        .search(&query.q, &scope, categories.as_deref())
        .await
        .map_err(api_error)?;

    Ok(views(results))
}

/// All memories of one category, newest first
#[utoipa::path(
    get,
    path = "/memories/{scope}/category/{category}",
    params(
        ("scope" = String, Path, description = "Guild id or dm-{user_id}"),
        ("category" = String, Path, description = "daily, ideas, research, images, logs, schedule or tasks")
    ),
    responses(
        (status = 200, description = "Memories of the category", body = Vec<MemoryResponse>),
        (status = 400, description = "Unknown category"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Memory"
)]
pub async fn list_memories(
    State(state): State<AppState>,
    Path((scope, category)): Path<(String, String)>,
) -> Result<Json<Vec<MemoryResponse>>, ApiError> {
    let scope = parse_scope(&scope)?;
    let category = parse_category(&category)?;

    let results = state
        .memories
        .list(category, &scope)
        .await
        .map_err(api_error)?;

    Ok(views(results))
}

/// Most recent memories across categories
#[utoipa::path(
    get,
    path = "/memories/{scope}/recent",
    params(
        ("scope" = String, Path, description = "Guild id or dm-{user_id}"),
        RecentQuery
    ),
    responses(
        (status = 200, description = "Recent memories", body = Vec<MemoryResponse>),
        (status = 500, description = "Internal server error")
    ),
    tag = "Memory"
)]
pub async fn recent_memories(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<MemoryResponse>>, ApiError> {
    let scope = parse_scope(&scope)?;
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);

    let results = state
        .memories
        .recent(&scope, limit)
        .await
        .map_err(api_error)?;

    Ok(views(results))
}

/// Front-matter of one memory (used for author checks)
#[utoipa::path(
    get,
    path = "/memories/{scope}/frontmatter",
    params(
        ("scope" = String, Path, description = "Guild id or dm-{user_id}"),
        MemoryPathQuery
    ),
    responses(
        (status = 200, description = "Front-matter, null when the file is absent", body = FrontmatterResponse),
        (status = 400, description = "Path outside the scope"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Memory"
)]
pub async fn get_frontmatter(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    Query(query): Query<MemoryPathQuery>,
) -> Result<Json<FrontmatterResponse>, ApiError> {
    let scope = parse_scope(&scope)?;
    let frontmatter = state
        .memories
        .get_frontmatter(&scope, &query.path)
        .await
        .map_err(api_error)?;

    Ok(Json(FrontmatterResponse {
        path: query.path,
        frontmatter,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/memories/:scope",
            post(save_memory).patch(edit_memory).delete(delete_memory),
        )
        .route("/memories/:scope/search", get(search_memories))
        .route("/memories/:scope/category/:category", get(list_memories))
        .route("/memories/:scope/recent", get(recent_memories))
        .route("/memories/:scope/frontmatter", get(get_frontmatter))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, empty, json, send};
    use axum::http::StatusCode;
    use serde_json::json;

    fn task(title: &str) -> serde_json::Value {
        json!({
            "input": {
                "category": "tasks",
                "title": title,
                "tags": ["home"],
                "summary": "chores",
                "content": "details",
                "status": "todo"
            },
            "author_id": "42"
        })
    }

    #[tokio::test]
    async fn test_save_then_search_and_list() {
        let (app, state, _) = app();

        let (status, saved) = send(&app, json("POST", "/memories/g1", task("Buy milk"))).await;
        assert_eq!(status, StatusCode::OK);
        let path = saved["path"].as_str().unwrap().to_string();
        assert!(path.starts_with("memory/g1/tasks/"));
        assert_eq!(saved["frontmatter"]["author_id"], "42");
        state.memories.settle().await;

        let (status, found) = send(&app, empty("GET", "/memories/g1/search?q=milk&categories=tasks")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["path"], path.as_str());

        let (_, none) = send(&app, empty("GET", "/memories/g1/search?q=milk&categories=ideas")).await;
        assert!(none.as_array().unwrap().is_empty());

        let (status, listed) = send(&app, empty("GET", "/memories/g1/category/tasks")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed[0]["content"], "details");

        let (_, recent) = send(&app, empty("GET", "/memories/g1/recent?limit=5")).await;
        assert_eq!(recent.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_edit_frontmatter_and_delete() {
        let (app, state, _) = app();
        let (_, saved) = send(&app, json("POST", "/memories/g1", task("Buy milk"))).await;
        let path = saved["path"].as_str().unwrap().to_string();
        state.memories.settle().await;

        let (status, edited) = send(
            &app,
            json("PATCH", "/memories/g1", json!({ "path": path, "updates": { "title": "Buy oat milk" } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(edited["frontmatter"]["title"], "Buy oat milk");

        let uri = format!("/memories/g1/frontmatter?path={}", path);
        let (_, fm) = send(&app, empty("GET", &uri)).await;
        assert_eq!(fm["frontmatter"]["author_id"], "42");

        let uri = format!("/memories/g1?path={}", path);
        let (status, _) = send(&app, empty("DELETE", &uri)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, empty("DELETE", &uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, fm) = send(&app, empty("GET", &format!("/memories/g1/frontmatter?path={}", path))).await;
        assert!(fm["frontmatter"].is_null());
    }

    #[tokio::test]
    async fn test_bad_requests() {
        let (app, _, _) = app();

        let (status, _) = send(&app, json("POST", "/memories/g1", task(" "))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, empty("GET", "/memories/g1/category/diary")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, empty("GET", "/memories/tasks/recent")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            json("PATCH", "/memories/g1", json!({ "path": "memory/g2/ideas/x.md", "updates": {} })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
