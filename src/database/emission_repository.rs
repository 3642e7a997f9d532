//! Emission history aggregates for the dashboard.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MonthlyEmission {
    pub project_id: i32,
    /// First instant of the month.
    pub month: DateTime<Utc>,
    pub total_emissions: Option<Decimal>,
}

/// All-time total and the total for the previous calendar month.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct EmissionTotals {
    pub total_emissions: Option<Decimal>,
    pub last_month_emissions: Option<Decimal>,
}

impl EmissionTotals {
    pub fn total(&self) -> Decimal {
        self.total_emissions.unwrap_or_default()
    }

    /// Change of the all-time total relative to last month, in percent,
    /// rounded to two places. Zero when last month has no emissions.
    pub fn growth_percentage(&self) -> f64 {
        growth_percentage(self.total(), self.last_month_emissions)
    }
}

pub fn growth_percentage(total: Decimal, last_month: Option<Decimal>) -> f64 {
    match last_month {
        Some(last) if !last.is_zero() => ((total - last) / last * Decimal::ONE_HUNDRED)
            .round_dp(2)
            .to_f64()
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

#[derive(Clone)]
pub struct EmissionRepository {
    pool: PgPool,
}

impl EmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn monthly_totals(&self) -> Result<Vec<MonthlyEmission>> {
        sqlx::query_as::<_, MonthlyEmission>(
            r#"
            SELECT project_id,
                   DATE_TRUNC('month', recorded_at) AS month,
                   SUM(emission_value) AS total_emissions
            FROM emissions
            GROUP BY project_id, DATE_TRUNC('month', recorded_at)
            ORDER BY month, project_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch monthly emissions")
    }

    pub async fn totals(&self) -> Result<EmissionTotals> {
        sqlx::query_as::<_, EmissionTotals>(
            r#"
            SELECT
                (SELECT SUM(emission_value) FROM emissions) AS total_emissions,
                (SELECT SUM(emission_value)
                 FROM emissions
                 WHERE recorded_at >= DATE_TRUNC('month', NOW()) - INTERVAL '1 month'
                   AND recorded_at < DATE_TRUNC('month', NOW())) AS last_month_emissions
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to fetch total emissions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn growth_against_last_month() {
        assert_eq!(growth_percentage(dec("150"), Some(dec("100"))), 50.0);
        assert_eq!(growth_percentage(dec("100"), Some(dec("300"))), -66.67);
    }

    #[test]
    fn growth_is_zero_without_a_baseline() {
        assert_eq!(growth_percentage(dec("150"), None), 0.0);
        assert_eq!(growth_percentage(dec("150"), Some(Decimal::ZERO)), 0.0);
    }

    #[test]
    fn empty_table_totals_to_zero() {
        let totals = EmissionTotals::default();
        assert_eq!(totals.total(), Decimal::ZERO);
        assert_eq!(format!("{:.2}", totals.total()), "0.00");
        assert_eq!(totals.growth_percentage(), 0.0);
    }
}
