//! Notification feed: /api/notifications

use axum::{
    extract::{rejection::QueryRejection, Extension, Path, Query},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::api::state::AppState;
use crate::database::{Notification, NotificationFilter};
use crate::error::AppError;

const NOTIFICATION_NOT_FOUND: &str = "Notification not found";

pub async fn fetch_notifications(
    Extension(state): Extension<AppState>,
    filter: Result<Query<NotificationFilter>, QueryRejection>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let Query(filter) = filter.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let notifications = state.notifications.list(&filter).await?;

    debug!(?filter, count = notifications.len(), "Fetched notifications");
    Ok(Json(notifications))
}

pub async fn mark_read(
    Extension(state): Extension<AppState>,
    Path(notification_id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    if !state.notifications.mark_read(notification_id).await? {
        return Err(AppError::NotFound(NOTIFICATION_NOT_FOUND.into()));
    }
    Ok(Json(json!({ "message": "Notification marked as read" })))
}

pub async fn mark_all_read(Extension(state): Extension<AppState>) -> Result<Json<Value>, AppError> {
    let updated = state.notifications.mark_all_read().await?;
    debug!(updated, "Marked all notifications as read");
    Ok(Json(json!({ "message": "All notifications marked as read" })))
}

pub async fn archive(
    Extension(state): Extension<AppState>,
    Path(notification_id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    if !state.notifications.archive(notification_id).await? {
        return Err(AppError::NotFound(NOTIFICATION_NOT_FOUND.into()));
    }
    Ok(Json(json!({ "message": "Notification archived" })))
}
