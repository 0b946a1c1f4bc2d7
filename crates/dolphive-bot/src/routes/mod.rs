//! Dolphive API Routes
//!
//! - /memories/:scope - Memory records (save, edit, delete, search, list)
//! - /reminders/:scope - Reminder queue (set, list, cancel)

use axum::http::StatusCode;

use dolphive::{DomainError, ScopeId};

pub mod memory;
pub mod reminder;
pub mod swagger;

/// Handler error: status plus user-facing message
pub type ApiError = (StatusCode, String);

/// Map a domain failure onto an HTTP status
pub fn api_error(err: DomainError) -> ApiError {
    let status = match &err {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        e if e.is_rate_limited() => StatusCode::TOO_MANY_REQUESTS,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!("Request failed: {}", err);
    }
    (status, err.user_message())
}

/// Validate the `:scope` path segment
pub fn parse_scope(scope: &str) -> Result<ScopeId, ApiError> {
    ScopeId::new(scope).map_err(api_error)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::{body::Body, http::Request, Router};
    use tower::ServiceExt;

    use crate::adapters::{ApiCallCounter, InMemoryContentStore};
    use crate::application::IndexConfig;
    use crate::auth::ApiKey;
    use crate::config::StorageBackend;
    use crate::AppState;

    pub fn app() -> (Router, AppState, Arc<InMemoryContentStore>) {
        let store = Arc::new(InMemoryContentStore::new());
        let state = AppState::from_store(
            store.clone(),
            Arc::new(ApiCallCounter::default()),
            StorageBackend::Memory,
            IndexConfig::default(),
        );
        (crate::build_router(state.clone(), ApiKey::default()), state, store)
    }

    pub async fn send(app: &Router, request: Request<Body>) -> (axum::http::StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    pub fn json(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn empty(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dolphive::StoreError;
    use std::time::Duration;

    #[test]
    fn test_error_mapping() {
        assert_eq!(api_error(DomainError::not_found("Memory", "x")).0, StatusCode::NOT_FOUND);
        assert_eq!(api_error(DomainError::Validation("x".into())).0, StatusCode::BAD_REQUEST);
        assert_eq!(api_error(DomainError::Conflict("x".into())).0, StatusCode::CONFLICT);

        let limited: DomainError = StoreError::RateLimited {
            retry_after: Some(Duration::from_secs(5)),
            secondary: false,
        }
        .into();
        let (status, message) = api_error(limited);
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert!(message.contains("5 seconds"));

        let server: DomainError = StoreError::Server {
            status: 502,
            message: "bad gateway".into(),
        }
        .into();
        assert_eq!(api_error(server).0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_scope_segment_validated() {
        assert!(parse_scope("g1").is_ok());
        assert_eq!(parse_scope("tasks").unwrap_err().0, StatusCode::BAD_REQUEST);
    }
}
