//! Emission request body and the checks that turn it into calculator input
//!
//! The body is accepted loosely (numbers may arrive as JSON strings, blanks
//! count as absent) and then validated per mine type into an [`EmissionInput`],
//! so the formulas never see a missing or non-numeric value.

use serde::Deserialize;
use thiserror::Error;

pub const UNDERGROUND: &str = "underground";
pub const SURFACE: &str = "surface";
pub const ABANDONED: &str = "abandoned";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("mineType is required")]
    MissingMineType,

    #[error("{field} is required for {mine_type} mines")]
    MissingField {
        field: &'static str,
        mine_type: &'static str,
    },

    #[error("{field} must be a number, got '{value}'")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} must be a finite, non-negative number")]
    OutOfRange { field: &'static str },

    #[error("fractionOfGassyMines must be between 0 and 1")]
    FractionOutOfRange,
}

/// A JSON value that may be sent either as a number or as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    /// Text used to match factor table cells. Numbers are rendered without a
    /// trailing `.0`; text is trimmed.
    pub fn lookup_key(&self) -> String {
        match self {
            NumberOrText::Number(n) => n.to_string(),
            NumberOrText::Text(s) => s.trim().to_string(),
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, NumberOrText::Text(s) if s.trim().is_empty())
    }
}

/// A validated numeric input together with the key used for table lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub key: String,
}

/// Body of `POST /api/calculate-emissions`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionRequest {
    pub mine_type: Option<String>,
    pub raw_coal_production: Option<NumberOrText>,
    pub depth_of_mining: Option<NumberOrText>,
    pub post_mining: Option<bool>,
    pub underground_coal_production: Option<NumberOrText>,
    pub surface_coal_production: Option<NumberOrText>,
    pub number_of_abandoned_mines: Option<NumberOrText>,
    pub fraction_of_gassy_mines: Option<NumberOrText>,
    pub time_period: Option<NumberOrText>,
    #[serde(
        rename = "AdjustedEmissions",
        alias = "adjustedEmissions",
        alias = "methaneUtilization"
    )]
    pub adjusted_emissions: Option<bool>,
    pub methane_recovered: Option<NumberOrText>,
    pub excavation_emissions: Option<NumberOrText>,
    pub transportation_emissions: Option<NumberOrText>,
    pub location: Option<String>,
}

/// Mine-level inputs, one variant per formula.
#[derive(Debug, Clone, PartialEq)]
pub enum MineInput {
    Underground {
        raw_coal_production: Quantity,
        depth_of_mining: Quantity,
        /// Underground production used for post-mining emissions, when requested.
        post_mining_production: Option<f64>,
        /// Recovered methane, present when the adjusted total is requested.
        methane_recovered: Option<f64>,
    },
    Surface {
        raw_coal_production: Quantity,
        depth_of_mining: Quantity,
        surface_coal_production: f64,
        methane_recovered: Option<f64>,
    },
    Abandoned {
        number_of_abandoned_mines: f64,
        fraction_of_gassy_mines: f64,
        time_period: String,
    },
    /// A mine type with no formula; contributes nothing.
    Unrecognized(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmissionInput {
    pub mine: MineInput,
    /// Raw excavation emissions, kg.
    pub excavation_emissions: f64,
    /// Raw transportation emissions, kg.
    pub transportation_emissions: f64,
    pub location: Option<String>,
}

impl EmissionRequest {
    pub fn validate(&self) -> Result<EmissionInput, ValidationError> {
        let mine_type = self
            .mine_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ValidationError::MissingMineType)?;

        let mine = match mine_type {
            UNDERGROUND => {
                let post_mining_production = if self.post_mining.unwrap_or(false) {
                    Some(required(
                        &self.underground_coal_production,
                        "undergroundCoalProduction",
                        UNDERGROUND,
                    )?)
                } else {
                    None
                };
                MineInput::Underground {
                    raw_coal_production: required_quantity(
                        &self.raw_coal_production,
                        "rawCoalProduction",
                        UNDERGROUND,
                    )?,
                    depth_of_mining: required_quantity(
                        &self.depth_of_mining,
                        "depthOfMining",
                        UNDERGROUND,
                    )?,
                    post_mining_production,
                    methane_recovered: self.recovered_methane(UNDERGROUND)?,
                }
            }
            SURFACE => MineInput::Surface {
                raw_coal_production: required_quantity(
                    &self.raw_coal_production,
                    "rawCoalProduction",
                    SURFACE,
                )?,
                depth_of_mining: required_quantity(&self.depth_of_mining, "depthOfMining", SURFACE)?,
                surface_coal_production: required(
                    &self.surface_coal_production,
                    "surfaceCoalProduction",
                    SURFACE,
                )?,
                methane_recovered: self.recovered_methane(SURFACE)?,
            },
            ABANDONED => {
                let fraction_of_gassy_mines = required(
                    &self.fraction_of_gassy_mines,
                    "fractionOfGassyMines",
                    ABANDONED,
                )?;
                if fraction_of_gassy_mines > 1.0 {
                    return Err(ValidationError::FractionOutOfRange);
                }
                let time_period = present(&self.time_period)
                    .map(NumberOrText::lookup_key)
                    .ok_or(ValidationError::MissingField {
                        field: "timePeriod",
                        mine_type: ABANDONED,
                    })?;
                MineInput::Abandoned {
                    number_of_abandoned_mines: required(
                        &self.number_of_abandoned_mines,
                        "numberOfAbandonedMines",
                        ABANDONED,
                    )?,
                    fraction_of_gassy_mines,
                    time_period,
                }
            }
            other => MineInput::Unrecognized(other.to_string()),
        };

        Ok(EmissionInput {
            mine,
            excavation_emissions: optional(&self.excavation_emissions, "excavationEmissions")?
                .unwrap_or(0.0),
            transportation_emissions: optional(
                &self.transportation_emissions,
                "transportationEmissions",
            )?
            .unwrap_or(0.0),
            location: self
                .location
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
    }

    fn recovered_methane(&self, mine_type: &'static str) -> Result<Option<f64>, ValidationError> {
        if self.adjusted_emissions.unwrap_or(false) {
            required(&self.methane_recovered, "methaneRecovered", mine_type).map(Some)
        } else {
            Ok(None)
        }
    }
}

fn present(value: &Option<NumberOrText>) -> Option<&NumberOrText> {
    value.as_ref().filter(|v| !v.is_blank())
}

fn parse_number(value: &NumberOrText, field: &'static str) -> Result<f64, ValidationError> {
    let number = match value {
        NumberOrText::Number(n) => *n,
        NumberOrText::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ValidationError::NotANumber {
                field,
                value: s.clone(),
            })?,
    };

    if number.is_finite() && number >= 0.0 {
        Ok(number)
    } else {
        Err(ValidationError::OutOfRange { field })
    }
}

fn optional(
    value: &Option<NumberOrText>,
    field: &'static str,
) -> Result<Option<f64>, ValidationError> {
    present(value).map(|v| parse_number(v, field)).transpose()
}

fn required(
    value: &Option<NumberOrText>,
    field: &'static str,
    mine_type: &'static str,
) -> Result<f64, ValidationError> {
    optional(value, field)?.ok_or(ValidationError::MissingField { field, mine_type })
}

fn required_quantity(
    value: &Option<NumberOrText>,
    field: &'static str,
    mine_type: &'static str,
) -> Result<Quantity, ValidationError> {
    let raw = present(value).ok_or(ValidationError::MissingField { field, mine_type })?;
    Ok(Quantity {
        value: parse_number(raw, field)?,
        key: raw.lookup_key(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: serde_json::Value) -> EmissionRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn underground_minimal_request() {
        let input = request(json!({
            "mineType": "underground",
            "rawCoalProduction": 100,
            "depthOfMining": 150,
            "postMining": false,
            "location": "Jharkhand"
        }))
        .validate()
        .unwrap();

        assert_eq!(
            input.mine,
            MineInput::Underground {
                raw_coal_production: Quantity {
                    value: 100.0,
                    key: "100".to_string()
                },
                depth_of_mining: Quantity {
                    value: 150.0,
                    key: "150".to_string()
                },
                post_mining_production: None,
                methane_recovered: None,
            }
        );
        assert_eq!(input.excavation_emissions, 0.0);
        assert_eq!(input.location.as_deref(), Some("Jharkhand"));
    }

    #[test]
    fn numeric_strings_are_accepted_and_keep_their_text_as_key() {
        let input = request(json!({
            "mineType": "surface",
            "rawCoalProduction": " 250.5 ",
            "depthOfMining": "150",
            "surfaceCoalProduction": "80",
            "excavationEmissions": "1200"
        }))
        .validate()
        .unwrap();

        match input.mine {
            MineInput::Surface {
                raw_coal_production,
                surface_coal_production,
                ..
            } => {
                assert_eq!(raw_coal_production.value, 250.5);
                assert_eq!(raw_coal_production.key, "250.5");
                assert_eq!(surface_coal_production, 80.0);
            }
            other => panic!("expected surface input, got {other:?}"),
        }
        assert_eq!(input.excavation_emissions, 1200.0);
    }

    #[test]
    fn mine_type_is_required() {
        assert_eq!(
            request(json!({"rawCoalProduction": 1})).validate(),
            Err(ValidationError::MissingMineType)
        );
        assert_eq!(
            request(json!({"mineType": "  "})).validate(),
            Err(ValidationError::MissingMineType)
        );
    }

    #[test]
    fn missing_fields_are_reported_per_mine_type() {
        assert_eq!(
            request(json!({"mineType": "underground", "depthOfMining": 150})).validate(),
            Err(ValidationError::MissingField {
                field: "rawCoalProduction",
                mine_type: UNDERGROUND
            })
        );
        assert_eq!(
            request(json!({
                "mineType": "underground",
                "rawCoalProduction": 100,
                "depthOfMining": 150,
                "postMining": true
            }))
            .validate(),
            Err(ValidationError::MissingField {
                field: "undergroundCoalProduction",
                mine_type: UNDERGROUND
            })
        );
        assert_eq!(
            request(json!({
                "mineType": "surface",
                "rawCoalProduction": 100,
                "depthOfMining": 150
            }))
            .validate(),
            Err(ValidationError::MissingField {
                field: "surfaceCoalProduction",
                mine_type: SURFACE
            })
        );
        assert_eq!(
            request(json!({
                "mineType": "abandoned",
                "numberOfAbandonedMines": 4,
                "fractionOfGassyMines": 0.5
            }))
            .validate(),
            Err(ValidationError::MissingField {
                field: "timePeriod",
                mine_type: ABANDONED
            })
        );
    }

    #[test]
    fn adjusted_flag_requires_recovered_methane_under_either_name() {
        for flag in ["AdjustedEmissions", "adjustedEmissions", "methaneUtilization"] {
            let mut body = json!({
                "mineType": "underground",
                "rawCoalProduction": 100,
                "depthOfMining": 150
            });
            body[flag] = json!(true);
            assert_eq!(
                request(body.clone()).validate(),
                Err(ValidationError::MissingField {
                    field: "methaneRecovered",
                    mine_type: UNDERGROUND
                }),
                "flag {flag}"
            );

            body["methaneRecovered"] = json!(12.5);
            match request(body).validate().unwrap().mine {
                MineInput::Underground {
                    methane_recovered, ..
                } => assert_eq!(methane_recovered, Some(12.5)),
                other => panic!("expected underground input, got {other:?}"),
            }
        }
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert_eq!(
            request(json!({
                "mineType": "underground",
                "rawCoalProduction": "lots",
                "depthOfMining": 150
            }))
            .validate(),
            Err(ValidationError::NotANumber {
                field: "rawCoalProduction",
                value: "lots".to_string()
            })
        );
        assert_eq!(
            request(json!({
                "mineType": "underground",
                "rawCoalProduction": -5,
                "depthOfMining": 150
            }))
            .validate(),
            Err(ValidationError::OutOfRange {
                field: "rawCoalProduction"
            })
        );
        assert_eq!(
            request(json!({
                "mineType": "abandoned",
                "numberOfAbandonedMines": 3,
                "fractionOfGassyMines": 1.5,
                "timePeriod": "1901-1925"
            }))
            .validate(),
            Err(ValidationError::FractionOutOfRange)
        );
    }

    #[test]
    fn blank_and_null_optionals_default_to_zero() {
        let input = request(json!({
            "mineType": "openpit",
            "excavationEmissions": "",
            "transportationEmissions": null,
            "location": ""
        }))
        .validate()
        .unwrap();

        assert_eq!(input.mine, MineInput::Unrecognized("openpit".to_string()));
        assert_eq!(input.excavation_emissions, 0.0);
        assert_eq!(input.transportation_emissions, 0.0);
        assert_eq!(input.location, None);
    }

    #[test]
    fn abandoned_time_period_accepts_numbers() {
        let input = request(json!({
            "mineType": "abandoned",
            "numberOfAbandonedMines": 3,
            "fractionOfGassyMines": 0.25,
            "timePeriod": 1925
        }))
        .validate()
        .unwrap();

        assert_eq!(
            input.mine,
            MineInput::Abandoned {
                number_of_abandoned_mines: 3.0,
                fraction_of_gassy_mines: 0.25,
                time_period: "1925".to_string(),
            }
        );
    }
}
