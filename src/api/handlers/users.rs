//! User management: /api/users
//!
//! Every route here sits behind the bearer-token guard. Updates and status
//! changes leave a `user_management` notification attributed to the caller.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{duplicate_as_conflict, json_body};
use crate::api::state::AppState;
use crate::auth::password::hash_password_blocking;
use crate::auth::Claims;
use crate::database::notification_repository::CATEGORY_USER_MANAGEMENT;
use crate::database::{NewNotification, NewUser, NotificationPriority, UpdateUser, UserRecord};
use crate::error::AppError;

const USER_NOT_FOUND: &str = "User not found";

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    /// Left unchanged when absent or empty.
    pub password: Option<String>,
    pub role_id: i32,
    pub status: bool,
}

pub async fn list_users(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<UserRecord>>, AppError> {
    Ok(Json(state.users.list_users().await?))
}

pub async fn create_user(
    Extension(state): Extension<AppState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserRecord>), AppError> {
    let request = json_body(body)?;
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".into(),
        ));
    }

    let new_user = NewUser {
        username: request.username,
        email: request.email,
        password_hash: hash_password_blocking(request.password).await?,
        role_id: request.role_id,
    };

    let user_id = state
        .users
        .insert_user(&new_user)
        .await
        .map_err(duplicate_as_conflict)?;
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.into()))?;

    info!("Created user {} ({})", user.username, user.user_id);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserRecord>, AppError> {
    let request = json_body(body)?;

    let password_hash = match request.password.filter(|p| !p.is_empty()) {
        Some(password) => Some(hash_password_blocking(password).await?),
        None => None,
    };

    let update = UpdateUser {
        user_id: request.user_id,
        username: request.username,
        email: request.email,
        role_id: request.role_id,
        status: request.status,
        password_hash,
    };

    let user = state
        .users
        .update_user(&update)
        .await
        .map_err(duplicate_as_conflict)?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.into()))?;

    notify(
        &state,
        NewNotification {
            user_id: claims.sub,
            action_type: "USER_UPDATED",
            description: format!("User {} was updated", user.username),
            target_id: user.user_id,
            target_type: "user",
            priority: NotificationPriority::Medium,
            category: CATEGORY_USER_MANAGEMENT,
        },
    )
    .await?;

    Ok(Json(user))
}

pub async fn delete_user(
    Extension(state): Extension<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if state.users.delete_user(id).await? {
        info!("Deleted user {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(USER_NOT_FOUND.into()))
    }
}

pub async fn toggle_user_status(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<UserRecord>, AppError> {
    let status = requested_status(&json_body(body)?)?;

    let user = state
        .users
        .set_status(id, status)
        .await?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.into()))?;

    notify(
        &state,
        NewNotification {
            user_id: claims.sub,
            action_type: "USER_STATUS_CHANGED",
            description: format!(
                "User {}'s status was changed to {}",
                user.username,
                if status { "active" } else { "inactive" }
            ),
            target_id: user.user_id,
            target_type: "user",
            priority: NotificationPriority::High,
            category: CATEGORY_USER_MANAGEMENT,
        },
    )
    .await?;

    Ok(Json(user))
}

/// `status` must be a JSON boolean; strings like `"true"` are refused.
fn requested_status(body: &Value) -> Result<bool, AppError> {
    body.get("status")
        .and_then(Value::as_bool)
        .ok_or_else(|| AppError::BadRequest("Status must be a boolean value".into()))
}

async fn notify(state: &AppState, notification: NewNotification) -> Result<(), AppError> {
    let id = state.notifications.create(&notification).await?;
    info!(
        notification_id = id,
        action = notification.action_type,
        target = notification.target_id,
        "Notification recorded"
    );
    Ok(())
}
