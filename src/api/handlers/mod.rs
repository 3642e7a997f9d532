//! Request handlers, one module per resource.

pub mod auth;
pub mod calculate;
pub mod emissions;
pub mod health;
pub mod notifications;
pub mod users;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use tracing::warn;

use crate::database::unique_violation;
use crate::error::AppError;

/// Unwrap a JSON body, turning a malformed or mistyped body into a 400 with
/// the rejection's message.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Map a unique violation on `users` to the matching 400, leaving every other
/// failure as an internal error.
pub(crate) fn duplicate_as_conflict(err: anyhow::Error) -> AppError {
    match unique_violation(&err) {
        Some(constraint) => {
            warn!("Duplicate user rejected ({})", constraint);
            if constraint.contains("username") {
                AppError::Conflict("Username already exists".into())
            } else {
                AppError::Conflict("Email already exists".into())
            }
        }
        None => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn other_database_errors_stay_internal() {
        let err = duplicate_as_conflict(anyhow::anyhow!("connection reset"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
