//! Factor lookup over the reference tables

use tracing::debug;

use super::reference_data::{EmissionFactorRow, ReferenceData};

/// Tonnes-per-hectare pools are scaled to absolute tonnes.
const CARBON_SINK_SCALE: f64 = 1000.0;

const SHALLOW_DEPTH_M: f64 = 200.0;
const DEEP_DEPTH_M: f64 = 400.0;

/// Emission factor and conversion factor selected for a mine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Factors {
    pub emission_factor: f64,
    pub conversion_factor: f64,
}

impl Factors {
    /// Contribution used when no table row matches.
    pub const ZERO: Factors = Factors {
        emission_factor: 0.0,
        conversion_factor: 0.0,
    };
}

impl From<&EmissionFactorRow> for Factors {
    fn from(row: &EmissionFactorRow) -> Self {
        Self {
            emission_factor: row.value,
            conversion_factor: row.conversion_factor.unwrap_or(1.0),
        }
    }
}

impl ReferenceData {
    /// First row, in load order, whose category contains `mine_type` and whose
    /// production and depth cells equal the given keys.
    pub fn find_factor_row(
        &self,
        mine_type: &str,
        raw_coal_production: &str,
        depth_of_mining: &str,
    ) -> Option<&EmissionFactorRow> {
        self.emission_factors().iter().find(|row| {
            row.source_category.contains(mine_type)
                && row.raw_coal_production == raw_coal_production
                && row.depth_of_mining == depth_of_mining
        })
    }

    pub fn get_factors(
        &self,
        mine_type: &str,
        raw_coal_production: &str,
        depth_of_mining: &str,
    ) -> Factors {
        match self.find_factor_row(mine_type, raw_coal_production, depth_of_mining) {
            Some(row) => Factors::from(row),
            None => {
                debug!(
                    mine_type,
                    raw_coal_production, depth_of_mining, "No emission factor row matched"
                );
                Factors::ZERO
            }
        }
    }

    /// Sum of the region's carbon pools scaled to absolute tonnes; 0 for an
    /// unknown or absent region.
    pub fn statewise_carbon_sink(&self, region: Option<&str>) -> f64 {
        match region.and_then(|r| self.carbon_stock(r)) {
            Some(stock) => stock.total() * CARBON_SINK_SCALE,
            None => 0.0,
        }
    }
}

/// Post-mining emission factor by depth in metres.
pub fn post_mining_emission_factor(depth_of_mining: f64) -> f64 {
    if depth_of_mining < SHALLOW_DEPTH_M {
        0.9
    } else if depth_of_mining > DEEP_DEPTH_M {
        4.0
    } else {
        2.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emissions::reference_data::CarbonStock;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn row(category: &str, production: &str, depth: &str, value: f64, cf: Option<f64>) -> EmissionFactorRow {
        EmissionFactorRow {
            source_category: category.to_string(),
            raw_coal_production: production.to_string(),
            depth_of_mining: depth.to_string(),
            value,
            conversion_factor: cf,
        }
    }

    fn data() -> ReferenceData {
        let mut stocks = HashMap::new();
        stocks.insert(
            "Jharkhand".to_string(),
            CarbonStock {
                above_ground_biomass: 0.5,
                below_ground_biomass: 0.5,
                dead_wood: 0.25,
                litter: 0.25,
                soil_organic_carbon: 0.5,
            },
        );

        ReferenceData::new(
            stocks,
            vec![
                row("Underground mines", "100", "150", 0.5, Some(1.0)),
                row("Underground mines", "100", "150", 9.9, Some(9.9)),
                row("Surface mines", "100", "150", 1.2, None),
                row("Abandoned underground mines", "1901-1925", "", 1.52, Some(0.67)),
            ],
        )
    }

    #[test]
    fn first_match_in_load_order_wins() {
        let factors = data().get_factors("Underground", "100", "150");
        assert_eq!(
            factors,
            Factors {
                emission_factor: 0.5,
                conversion_factor: 1.0
            }
        );
    }

    #[test]
    fn category_match_is_substring_and_case_sensitive() {
        let data = data();
        assert!(data.find_factor_row("Surface", "100", "150").is_some());
        assert!(data.find_factor_row("surface", "100", "150").is_none());
    }

    #[test]
    fn production_and_depth_must_match_exactly() {
        let data = data();
        assert!(data.find_factor_row("Underground", "100.0", "150").is_none());
        assert!(data.find_factor_row("Underground", "100", "151").is_none());
    }

    #[test]
    fn miss_defaults_to_zero() {
        assert_eq!(data().get_factors("Underground", "5", "5"), Factors::ZERO);
    }

    #[test]
    fn blank_conversion_factor_defaults_to_one() {
        let factors = data().get_factors("Surface", "100", "150");
        assert_relative_eq!(factors.emission_factor, 1.2);
        assert_relative_eq!(factors.conversion_factor, 1.0);
    }

    #[test]
    fn abandoned_rows_match_blank_depth() {
        let factors = data().get_factors("Abandoned", "1901-1925", "");
        assert_relative_eq!(factors.emission_factor, 1.52);
        assert_relative_eq!(factors.conversion_factor, 0.67);
    }

    #[test]
    fn carbon_sink_sums_pools_and_scales() {
        let data = data();
        assert_relative_eq!(data.statewise_carbon_sink(Some("Jharkhand")), 2000.0);
        assert_eq!(data.statewise_carbon_sink(Some("Atlantis")), 0.0);
        assert_eq!(data.statewise_carbon_sink(None), 0.0);
    }

    #[test]
    fn post_mining_factor_boundaries() {
        assert_eq!(post_mining_emission_factor(0.0), 0.9);
        assert_eq!(post_mining_emission_factor(199.99), 0.9);
        assert_eq!(post_mining_emission_factor(200.0), 2.5);
        assert_eq!(post_mining_emission_factor(400.0), 2.5);
        assert_eq!(post_mining_emission_factor(400.01), 4.0);
    }

    proptest! {
        #[test]
        fn post_mining_factor_is_a_step_function(depth in 0.0f64..10_000.0) {
            let expected = if depth < 200.0 {
                0.9
            } else if depth > 400.0 {
                4.0
            } else {
                2.5
            };
            prop_assert_eq!(post_mining_emission_factor(depth), expected);
        }
    }
}
