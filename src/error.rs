//! HTTP-facing error type
//!
//! Every handler returns `Result<_, AppError>`. Domain errors convert into it
//! via `From`, and `IntoResponse` maps each variant onto a status code and a
//! JSON body of the form `{"error": "...", "message": "..."}`. Both keys carry
//! the same text; the auth screens read `message`, the rest read `error`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::emissions::ValidationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Your account has been temporarily suspended. Please contact the administrator.")]
    AccountInactive,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(rename = "isInactive", skip_serializing_if = "Option::is_none")]
    is_inactive: Option<bool>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            // Duplicate usernames surface as a plain client error.
            AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::AccountInactive => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Auth(e) if e.is_client_error() => StatusCode::UNAUTHORIZED,
            AppError::Auth(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() {
            error!("Request failed: {:#}", self);
            "Something went wrong!".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: message.clone(),
            message,
            is_inactive: matches!(self, AppError::AccountInactive).then_some(true),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(
            AppError::Validation(ValidationError::MissingMineType).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized("nope".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::AccountInactive.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::NotFound("User not found".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Auth(AuthError::MissingToken).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn server_errors_hide_details() {
        let err = AppError::Internal(anyhow::anyhow!("connection refused on 10.0.0.3"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
