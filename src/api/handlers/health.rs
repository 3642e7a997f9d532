//! GET /api/health, GET /api/health/db

use axum::{extract::Extension, Json};
use serde_json::{json, Value};

use crate::api::state::AppState;
use crate::database::server_time;
use crate::error::AppError;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn database_health(
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, AppError> {
    let time = server_time(&state.pool).await?;
    Ok(Json(json!({ "success": true, "time": time })))
}
