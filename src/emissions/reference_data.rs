//! Reference data loader
//!
//! Two static tables back the calculator:
//!
//! - a JSON object mapping region name → carbon pools
//!   (`AGB`, `BGB`, `DeadWood`, `Litter`, `SOC`)
//! - a CSV table of emission factors with the headers
//!   `IPCC 2006 Source/Sink Category, Raw Coal Production, Depth of Mining,
//!   Value, Conversion Factor`
//!
//! A malformed carbon-stock file or an unreadable factor table is fatal. Once
//! the factor table opens, row-level failures are skipped with a warning.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

const CATEGORY_COLUMN: &str = "IPCC 2006 Source/Sink Category";
const PRODUCTION_COLUMN: &str = "Raw Coal Production";
const DEPTH_COLUMN: &str = "Depth of Mining";
const VALUE_COLUMN: &str = "Value";

#[derive(Error, Debug)]
pub enum ReferenceDataError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed carbon stock data: {0}")]
    CarbonStocks(#[from] serde_json::Error),

    #[error("Malformed emission factor table: {0}")]
    FactorTable(#[from] csv::Error),

    #[error("Emission factor table is missing the '{0}' column")]
    MissingColumn(&'static str),
}

/// Carbon pools for one region, in tonnes of carbon per hectare.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CarbonStock {
    #[serde(rename = "AGB")]
    pub above_ground_biomass: f64,
    #[serde(rename = "BGB")]
    pub below_ground_biomass: f64,
    #[serde(rename = "DeadWood")]
    pub dead_wood: f64,
    #[serde(rename = "Litter")]
    pub litter: f64,
    #[serde(rename = "SOC")]
    pub soil_organic_carbon: f64,
}

impl CarbonStock {
    pub fn total(&self) -> f64 {
        self.above_ground_biomass
            + self.below_ground_biomass
            + self.dead_wood
            + self.litter
            + self.soil_organic_carbon
    }
}

/// One row of the emission-factor table.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionFactorRow {
    pub source_category: String,
    pub raw_coal_production: String,
    pub depth_of_mining: String,
    pub value: f64,
    /// `None` when the cell is blank, zero or not a number.
    pub conversion_factor: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawFactorRecord {
    #[serde(rename = "IPCC 2006 Source/Sink Category")]
    category: String,
    #[serde(rename = "Raw Coal Production", default)]
    raw_coal_production: String,
    #[serde(rename = "Depth of Mining", default)]
    depth_of_mining: String,
    #[serde(rename = "Value")]
    value: String,
    #[serde(rename = "Conversion Factor", default)]
    conversion_factor: String,
}

impl RawFactorRecord {
    fn into_row(self) -> Result<EmissionFactorRow, String> {
        let value = self
            .value
            .parse::<f64>()
            .map_err(|e| format!("Value '{}': {}", self.value, e))?;

        Ok(EmissionFactorRow {
            source_category: self.category,
            raw_coal_production: self.raw_coal_production,
            depth_of_mining: self.depth_of_mining,
            value,
            conversion_factor: leading_number(&self.conversion_factor).filter(|cf| *cf != 0.0),
        })
    }
}

/// Longest numeric prefix of `text`, so `"0.67 Gg"` reads as 0.67.
fn leading_number(text: &str) -> Option<f64> {
    (1..=text.len())
        .rev()
        .filter(|&end| text.is_char_boundary(end))
        .find_map(|end| text[..end].parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

/// Parse the carbon-stock mapping. Unknown per-region fields are ignored.
pub fn parse_carbon_stocks<R: Read>(
    reader: R,
) -> Result<HashMap<String, CarbonStock>, ReferenceDataError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Parse the emission-factor table, keeping rows in file order.
pub fn parse_emission_factors<R: Read>(
    reader: R,
) -> Result<Vec<EmissionFactorRow>, ReferenceDataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    for required in [CATEGORY_COLUMN, PRODUCTION_COLUMN, DEPTH_COLUMN, VALUE_COLUMN] {
        if !headers.iter().any(|h| h == required) {
            return Err(ReferenceDataError::MissingColumn(required));
        }
    }

    let mut rows = Vec::new();
    for (idx, result) in reader.deserialize::<RawFactorRecord>().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let line = idx + 2;
        match result.map_err(|e| e.to_string()).and_then(RawFactorRecord::into_row) {
            Ok(row) => rows.push(row),
            Err(e) => warn!("Skipping emission factor row {}: {}", line, e),
        }
    }

    Ok(rows)
}

/// Immutable reference tables shared by every calculation.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    carbon_stocks: HashMap<String, CarbonStock>,
    emission_factors: Vec<EmissionFactorRow>,
}

impl ReferenceData {
    pub fn new(
        carbon_stocks: HashMap<String, CarbonStock>,
        emission_factors: Vec<EmissionFactorRow>,
    ) -> Self {
        Self {
            carbon_stocks,
            emission_factors,
        }
    }

    /// Load both tables from disk.
    pub fn load(
        carbon_stocks_path: &Path,
        emission_factors_path: &Path,
    ) -> Result<Self, ReferenceDataError> {
        let carbon_stocks = parse_carbon_stocks(open(carbon_stocks_path)?)?;
        let emission_factors = parse_emission_factors(open(emission_factors_path)?)?;

        info!(
            "Loaded reference data: {} regions, {} emission factor rows",
            carbon_stocks.len(),
            emission_factors.len()
        );

        Ok(Self::new(carbon_stocks, emission_factors))
    }

    pub fn carbon_stock(&self, region: &str) -> Option<&CarbonStock> {
        self.carbon_stocks.get(region)
    }

    pub fn emission_factors(&self) -> &[EmissionFactorRow] {
        &self.emission_factors
    }

    pub fn region_count(&self) -> usize {
        self.carbon_stocks.len()
    }
}

fn open(path: &Path) -> Result<File, ReferenceDataError> {
    File::open(path).map_err(|source| ReferenceDataError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    const STOCKS: &str = r#"{
        "Jharkhand": {"AGB": 0.5, "BGB": 0.25, "DeadWood": 0.05, "Litter": 0.2, "SOC": 1.0, "co2Equivalent": 7.3},
        "Odisha": {"AGB": 1, "BGB": 2, "DeadWood": 3, "Litter": 4, "SOC": 5}
    }"#;

    const FACTORS: &str = "\
IPCC 2006 Source/Sink Category,Raw Coal Production,Depth of Mining,Value,Conversion Factor
1.B.1.a.i Underground mines,100,150,0.5,1
1.B.1.a.ii Surface mines,100,150,1.2,0.67
1.B.1.a.i Underground mines,200,450,n/a,1
1.B.1.a.iii Abandoned underground mines,1901-1925,,1.52,
";

    #[test]
    fn carbon_stocks_parse_and_sum() {
        let stocks = parse_carbon_stocks(STOCKS.as_bytes()).unwrap();

        assert_eq!(stocks.len(), 2);
        assert_relative_eq!(stocks["Jharkhand"].total(), 2.0);
        assert_relative_eq!(stocks["Odisha"].total(), 15.0);
    }

    #[test]
    fn malformed_carbon_stocks_are_fatal() {
        let err = parse_carbon_stocks(r#"{"Jharkhand": {"AGB": "lots"}}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, ReferenceDataError::CarbonStocks(_)));

        let err = parse_carbon_stocks("not json".as_bytes()).unwrap_err();
        assert!(matches!(err, ReferenceDataError::CarbonStocks(_)));
    }

    #[test]
    fn factor_rows_keep_file_order_and_skip_bad_rows() {
        let rows = parse_emission_factors(FACTORS.as_bytes()).unwrap();

        // the "n/a" value row is dropped
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].source_category, "1.B.1.a.i Underground mines");
        assert_eq!(rows[0].raw_coal_production, "100");
        assert_eq!(rows[0].depth_of_mining, "150");
        assert_relative_eq!(rows[0].value, 0.5);
        assert_eq!(rows[0].conversion_factor, Some(1.0));

        assert_eq!(rows[1].conversion_factor, Some(0.67));

        assert_eq!(rows[2].raw_coal_production, "1901-1925");
        assert_eq!(rows[2].depth_of_mining, "");
        assert_eq!(rows[2].conversion_factor, None);
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let csv = "IPCC 2006 Source/Sink Category,Raw Coal Production,Value\nx,1,2\n";
        let err = parse_emission_factors(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            ReferenceDataError::MissingColumn("Depth of Mining")
        ));
    }

    #[test]
    fn conversion_factor_column_is_optional() {
        let csv = "IPCC 2006 Source/Sink Category,Raw Coal Production,Depth of Mining,Value\n\
                   Underground,100,150,0.5\n";
        let rows = parse_emission_factors(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].conversion_factor, None);
    }

    #[test]
    fn conversion_factor_reads_leading_number_and_ignores_zero() {
        let csv = "IPCC 2006 Source/Sink Category,Raw Coal Production,Depth of Mining,Value,Conversion Factor\n\
                   underground,100,150,18,0\n\
                   underground,100,300,25,0.67 Gg\n\
                   underground,100,500,30,per tonne\n";
        let rows = parse_emission_factors(csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].conversion_factor, None);
        assert_eq!(rows[1].conversion_factor, Some(0.67));
        assert_eq!(rows[2].conversion_factor, None);
    }

    #[test]
    fn leading_number_prefixes() {
        assert_eq!(leading_number("1.5"), Some(1.5));
        assert_eq!(leading_number("2e3 kg"), Some(2000.0));
        assert_eq!(leading_number(""), None);
        assert_eq!(leading_number("NaN"), None);
        assert_eq!(leading_number("inf"), None);
    }

    #[test]
    fn load_reads_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let stocks_path = dir.path().join("carbon_stocks.json");
        let factors_path = dir.path().join("emission_factors.csv");
        File::create(&stocks_path)
            .unwrap()
            .write_all(STOCKS.as_bytes())
            .unwrap();
        File::create(&factors_path)
            .unwrap()
            .write_all(FACTORS.as_bytes())
            .unwrap();

        let data = ReferenceData::load(&stocks_path, &factors_path).unwrap();
        assert_eq!(data.region_count(), 2);
        assert_eq!(data.emission_factors().len(), 3);
        assert!(data.carbon_stock("Jharkhand").is_some());
        assert!(data.carbon_stock("Atlantis").is_none());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReferenceData::load(
            &dir.path().join("nope.json"),
            &dir.path().join("nope.csv"),
        )
        .unwrap_err();

        match err {
            ReferenceDataError::Io { path, .. } => assert!(path.ends_with("nope.json")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
