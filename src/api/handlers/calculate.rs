//! POST /api/calculate-emissions (also mounted at /api/calculate/emissions)

use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};
use tracing::debug;

use super::json_body;
use crate::api::state::AppState;
use crate::emissions::{EmissionRequest, EmissionResult};
use crate::error::AppError;

pub async fn calculate_emissions(
    Extension(state): Extension<AppState>,
    body: Result<Json<EmissionRequest>, JsonRejection>,
) -> Result<Json<EmissionResult>, AppError> {
    let request = json_body(body)?;
    let result = state.calculator.calculate_request(&request)?;

    debug!(
        mine_type = request.mine_type.as_deref().unwrap_or_default(),
        total = result.total_emission,
        gap = result.gap,
        "Calculated emissions"
    );
    Ok(Json(result))
}
