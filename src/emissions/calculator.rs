//! Emission formulas and orchestration
//!
//! The formulas are plain functions of their inputs. [`EmissionCalculator`]
//! owns a handle to the reference tables, picks the formula for the mine
//! type, adds the normalized excavation and transportation emissions, and
//! derives the gap against the regional carbon sink.
//!
//! Unit conventions:
//! - excavation and transportation emissions arrive in kg and are divided by
//!   [`KG_PER_TONNE`]
//! - CO2-equivalent is `gap × GWP_METHANE` (100-year GWP of methane, AR5)

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::factors::{post_mining_emission_factor, Factors};
use super::reference_data::ReferenceData;
use super::validation::{
    EmissionInput, EmissionRequest, MineInput, ValidationError, ABANDONED, SURFACE, UNDERGROUND,
};

pub const GWP_METHANE: f64 = 28.0;
pub const KG_PER_TONNE: f64 = 1000.0;

pub fn underground_emissions(raw_coal_production: f64, factors: Factors) -> f64 {
    raw_coal_production * factors.emission_factor * factors.conversion_factor
}

pub fn post_mining_emissions(
    underground_coal_production: f64,
    post_mining_emission_factor: f64,
    conversion_factor: f64,
) -> f64 {
    underground_coal_production * post_mining_emission_factor * conversion_factor
}

pub fn surface_emissions(surface_coal_production: f64, factors: Factors) -> f64 {
    surface_coal_production * factors.emission_factor * factors.conversion_factor
}

pub fn abandoned_emissions(
    number_of_abandoned_mines: f64,
    fraction_of_gassy_mines: f64,
    factors: Factors,
) -> f64 {
    number_of_abandoned_mines
        * fraction_of_gassy_mines
        * factors.emission_factor
        * factors.conversion_factor
}

pub fn adjusted_emissions(
    mining_emissions: f64,
    post_mining_emissions: f64,
    methane_recovered: f64,
) -> f64 {
    (mining_emissions + post_mining_emissions) - methane_recovered
}

pub fn normalize_to_tonnes(kg: f64) -> f64 {
    kg / KG_PER_TONNE
}

/// Response body of the calculate endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmissionResult {
    #[serde(rename = "TotalEmission")]
    pub total_emission: f64,
    #[serde(rename = "carbonSink")]
    pub carbon_sink: f64,
    pub gap: f64,
    #[serde(rename = "co2Equivalent")]
    pub co2_equivalent: f64,
}

#[derive(Debug, Clone)]
pub struct EmissionCalculator {
    reference: Arc<ReferenceData>,
}

impl EmissionCalculator {
    pub fn new(reference: Arc<ReferenceData>) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Mine-level total before excavation and transportation are added.
    pub fn mining_emissions(&self, mine: &MineInput) -> f64 {
        match mine {
            MineInput::Underground {
                raw_coal_production,
                depth_of_mining,
                post_mining_production,
                methane_recovered,
            } => {
                let factors = self.reference.get_factors(
                    UNDERGROUND,
                    &raw_coal_production.key,
                    &depth_of_mining.key,
                );
                let mining = underground_emissions(raw_coal_production.value, factors);
                let post_mining = post_mining_production
                    .map(|production| {
                        post_mining_emissions(
                            production,
                            post_mining_emission_factor(depth_of_mining.value),
                            factors.conversion_factor,
                        )
                    })
                    .unwrap_or(0.0);

                debug!(mining, post_mining, "Underground emissions");
                match methane_recovered {
                    Some(recovered) => adjusted_emissions(mining, post_mining, *recovered),
                    None => mining + post_mining,
                }
            }
            MineInput::Surface {
                raw_coal_production,
                depth_of_mining,
                surface_coal_production,
                methane_recovered,
            } => {
                let factors = self.reference.get_factors(
                    SURFACE,
                    &raw_coal_production.key,
                    &depth_of_mining.key,
                );
                let mining = surface_emissions(*surface_coal_production, factors);

                debug!(mining, "Surface emissions");
                match methane_recovered {
                    Some(recovered) => adjusted_emissions(mining, 0.0, *recovered),
                    None => mining,
                }
            }
            MineInput::Abandoned {
                number_of_abandoned_mines,
                fraction_of_gassy_mines,
                time_period,
            } => {
                let factors = self.reference.get_factors(ABANDONED, time_period, "");
                abandoned_emissions(
                    *number_of_abandoned_mines,
                    *fraction_of_gassy_mines,
                    factors,
                )
            }
            MineInput::Unrecognized(mine_type) => {
                warn!("No emission formula for mine type '{}'", mine_type);
                0.0
            }
        }
    }

    pub fn calculate(&self, input: &EmissionInput) -> EmissionResult {
        let mining = self.mining_emissions(&input.mine);
        let total_emission = mining
            + normalize_to_tonnes(input.excavation_emissions)
            + normalize_to_tonnes(input.transportation_emissions);

        let carbon_sink = self
            .reference
            .statewise_carbon_sink(input.location.as_deref());
        let gap = total_emission - carbon_sink;

        EmissionResult {
            total_emission,
            carbon_sink,
            gap,
            co2_equivalent: gap * GWP_METHANE,
        }
    }

    /// Validate a request body and calculate it.
    pub fn calculate_request(
        &self,
        request: &EmissionRequest,
    ) -> Result<EmissionResult, ValidationError> {
        let input = request.validate()?;
        Ok(self.calculate(&input))
    }
}
