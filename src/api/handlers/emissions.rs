//! Dashboard aggregates: /api/emissions

use axum::{extract::Extension, Json};
use serde::Serialize;

use crate::api::state::AppState;
use crate::database::{EmissionTotals, MonthlyEmission};
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalEmissionsResponse {
    /// Two decimal places, as text.
    pub total_emissions: String,
    pub growth_percentage: f64,
}

impl From<&EmissionTotals> for TotalEmissionsResponse {
    fn from(totals: &EmissionTotals) -> Self {
        Self {
            total_emissions: format!("{:.2}", totals.total()),
            growth_percentage: totals.growth_percentage(),
        }
    }
}

pub async fn monthly(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<MonthlyEmission>>, AppError> {
    Ok(Json(state.emissions.monthly_totals().await?))
}

pub async fn total(
    Extension(state): Extension<AppState>,
) -> Result<Json<TotalEmissionsResponse>, AppError> {
    let totals = state.emissions.totals().await?;
    Ok(Json(TotalEmissionsResponse::from(&totals)))
}
