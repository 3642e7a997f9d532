//! Coal-mine methane emissions
//!
//! - `reference_data`: carbon-stock and emission-factor tables, loaded once
//! - `factors`: factor lookup, post-mining factor, regional carbon sink
//! - `validation`: request body parsing and required-field checks
//! - `calculator`: the emission formulas and their orchestration by mine type

pub mod calculator;
pub mod factors;
pub mod reference_data;
pub mod validation;

pub use calculator::{EmissionCalculator, EmissionResult, GWP_METHANE, KG_PER_TONNE};
pub use factors::{post_mining_emission_factor, Factors};
pub use reference_data::{CarbonStock, EmissionFactorRow, ReferenceData, ReferenceDataError};
pub use validation::{
    EmissionInput, EmissionRequest, MineInput, NumberOrText, Quantity, ValidationError,
};
