//! Reminder Routes - Per-scope reminder queue
//!
//! HTTP handlers that delegate to ReminderService.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, post},
    Json, Router,
};

use super::{api_error, parse_scope, ApiError};
use crate::application::NewReminder;
use crate::models::{CancelReminderResponse, ReminderQuery, ReminderResponse, SetReminderRequest};
use crate::AppState;

/// Schedule a reminder
#[utoipa::path(
    post,
    path = "/reminders/{scope}",
    params(("scope" = String, Path, description = "Guild id or dm-{user_id}")),
    request_body = SetReminderRequest,
    responses(
        (status = 200, description = "Reminder scheduled", body = ReminderResponse),
        (status = 400, description = "Invalid reminder"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Reminder"
)]
pub async fn set_reminder(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    Json(payload): Json<SetReminderRequest>,
) -> Result<Json<ReminderResponse>, ApiError> {
    let scope = parse_scope(&scope)?;
    let reminder = state
        .reminders
        .set_reminder(
            &scope,
            NewReminder {
                user_id: payload.user_id,
                channel_id: payload.channel_id,
                message: payload.message,
                trigger_time: payload.trigger_time,
            },
        )
        .await
        .map_err(api_error)?;

    Ok(Json(reminder.into()))
}

/// Pending reminders of a user
#[utoipa::path(
    get,
    path = "/reminders/{scope}",
    params(
        ("scope" = String, Path, description = "Guild id or dm-{user_id}"),
        ReminderQuery
    ),
    responses(
        (status = 200, description = "Pending reminders", body = Vec<ReminderResponse>),
        (status = 500, description = "Internal server error")
    ),
    tag = "Reminder"
)]
pub async fn list_reminders(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    Query(query): Query<ReminderQuery>,
) -> Result<Json<Vec<ReminderResponse>>, ApiError> {
    let scope = parse_scope(&scope)?;
    let reminders = state
        .reminders
        .list_reminders(&scope, &query.user_id)
        .await
        .map_err(api_error)?;

    Ok(Json(reminders.into_iter().map(ReminderResponse::from).collect()))
}

/// Cancel a reminder
#[utoipa::path(
    delete,
    path = "/reminders/{scope}/{id}",
    params(
        ("scope" = String, Path, description = "Guild id or dm-{user_id}"),
        ("id" = String, Path, description = "Reminder ID")
    ),
    responses(
        (status = 200, description = "Whether the reminder existed", body = CancelReminderResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Reminder"
)]
pub async fn cancel_reminder(
    State(state): State<AppState>,
    Path((scope, id)): Path<(String, String)>,
) -> Result<Json<CancelReminderResponse>, ApiError> {
    let scope = parse_scope(&scope)?;
    let cancelled = state
        .reminders
        .cancel_reminder(&scope, &id)
        .await
        .map_err(api_error)?;

    Ok(Json(CancelReminderResponse { id, cancelled }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reminders/:scope", post(set_reminder).get(list_reminders))
        .route("/reminders/:scope/:id", delete(cancel_reminder))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, empty, json, send};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_list_cancel() {
        let (app, _, store) = app();

        let (status, set) = send(
            &app,
            json(
                "POST",
                "/reminders/dm-42",
                json!({
                    "user_id": "42",
                    "channel_id": "7",
                    "message": "stretch",
                    "trigger_time": "2030-01-01T09:00:00Z"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = set["id"].as_str().unwrap().to_string();
        assert!(store.read_raw("memory/.dm_reminder_scopes.json").is_some());

        let (_, listed) = send(&app, empty("GET", "/reminders/dm-42?user_id=42")).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["message"], "stretch");

        let (_, other) = send(&app, empty("GET", "/reminders/dm-42?user_id=7")).await;
        assert!(other.as_array().unwrap().is_empty());

        let uri = format!("/reminders/dm-42/{}", id);
        let (_, cancelled) = send(&app, empty("DELETE", &uri)).await;
        assert_eq!(cancelled["cancelled"], true);
        let (_, again) = send(&app, empty("DELETE", &uri)).await;
        assert_eq!(again["cancelled"], false);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let (app, _, _) = app();
        let (status, _) = send(
            &app,
            json(
                "POST",
                "/reminders/g1",
                json!({
                    "user_id": "42",
                    "channel_id": "7",
                    "message": "",
                    "trigger_time": "2030-01-01T09:00:00Z"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
