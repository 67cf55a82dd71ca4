//! Common routines for handling input data.
use crate::assumptions::MarketAdjustments;
use crate::investor::InvestorType;
use crate::simulation::SimulationRequest;
use crate::units::{Dimensionless, Money, MoneyPerNight, Tokens};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Format an error message to include the file path
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Read a simulation request from a JSON file
pub fn read_request_json(file_path: &Path) -> Result<SimulationRequest> {
    let json_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let request = serde_json::from_str(&json_str).with_context(|| input_err_msg(file_path))?;
    Ok(request)
}

/// Read a series of type Ts from a CSV file into a Vec<T>.
///
/// # Arguments
///
/// * `file_path`: Path to the CSV file
pub fn read_vec_from_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = csv::Reader::from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .with_context(|| input_err_msg(file_path))?;

    ensure!(!vec.is_empty(), "CSV file {} cannot be empty", file_path.display());

    Ok(vec)
}

/// A row of a scenarios CSV file.
///
/// Adjustment columns are optional; empty cells take their default values.
#[derive(Debug, Deserialize, PartialEq)]
pub struct ScenarioRow {
    /// Tokens to buy
    pub tokens_purchased: f64,
    /// Total token supply
    pub total_tokens: f64,
    /// The class of investor
    pub investor_type: InvestorType,
    /// Change to nightly rates
    pub rate_delta: Option<f64>,
    /// Change to high-season occupancy
    pub high_occ_delta: Option<f64>,
    /// Change to low-season occupancy
    pub low_occ_delta: Option<f64>,
    /// Change to amenity revenue
    pub amenity_delta: Option<f64>,
    /// Annual token appreciation
    pub token_growth_pct: Option<f64>,
    /// Holding horizon in years
    pub exit_years: Option<u32>,
}

impl From<ScenarioRow> for SimulationRequest {
    fn from(row: ScenarioRow) -> Self {
        let defaults = MarketAdjustments::default();
        Self {
            tokens_purchased: Tokens(row.tokens_purchased),
            total_tokens: Tokens(row.total_tokens),
            investor_type: row.investor_type,
            adjustments: MarketAdjustments {
                rate_delta: row.rate_delta.map_or(defaults.rate_delta, MoneyPerNight),
                high_occ_delta: row.high_occ_delta.map_or(defaults.high_occ_delta, Dimensionless),
                low_occ_delta: row.low_occ_delta.map_or(defaults.low_occ_delta, Dimensionless),
                amenity_delta: row.amenity_delta.map_or(defaults.amenity_delta, Money),
                token_growth_pct: row
                    .token_growth_pct
                    .map_or(defaults.token_growth_pct, Dimensionless),
                exit_years: row.exit_years.unwrap_or(defaults.exit_years),
            },
        }
    }
}

/// Read simulation scenarios from a CSV file
pub fn read_scenarios(file_path: &Path) -> Result<Vec<SimulationRequest>> {
    let rows: Vec<ScenarioRow> = read_vec_from_csv(file_path)?;
    Ok(rows.into_iter().map(SimulationRequest::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Record {
        a: u32,
        b: String,
    }

    #[test]
    fn test_read_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.toml");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "a = 1\nb = \"hello\"").unwrap();
        }

        let record: Record = read_toml(&file_path).unwrap();
        assert_eq!(
            record,
            Record {
                a: 1,
                b: "hello".to_string()
            }
        );

        // Missing file
        assert!(read_toml::<Record>(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_read_request_json() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("request.json");
        fs::write(
            &file_path,
            r#"{"tokensPurchased": 10, "totalTokens": 100, "investorType": "FOREIGN",
                "adjustments": {"exitYears": 3}}"#,
        )
        .unwrap();

        let request = read_request_json(&file_path).unwrap();
        assert_eq!(request.tokens_purchased, Tokens(10.0));
        assert_eq!(request.investor_type, InvestorType::Foreign);
        assert_eq!(request.adjustments.exit_years, 3);
        assert_eq!(
            request.adjustments.token_growth_pct,
            MarketAdjustments::default().token_growth_pct
        );
    }

    #[test]
    fn test_read_request_json_invalid() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("request.json");
        fs::write(&file_path, r#"{"tokensPurchased": 10}"#).unwrap();
        assert!(read_request_json(&file_path).is_err());
    }

    #[test]
    fn test_read_scenarios() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("scenarios.csv");
        fs::write(
            &file_path,
            "tokens_purchased,total_tokens,investor_type,rate_delta,high_occ_delta,\
             low_occ_delta,amenity_delta,token_growth_pct,exit_years\n\
             1000,248400,PHILIPPINE,,,,,,\n\
             500,248400,FOREIGN,50,0.05,-0.05,1000,0.1,5\n",
        )
        .unwrap();

        let scenarios = read_scenarios(&file_path).unwrap();
        assert_eq!(scenarios.len(), 2);
        assert_eq!(
            scenarios[0],
            SimulationRequest::new(Tokens(1000.0), Tokens(248_400.0), InvestorType::Philippine)
        );
        assert_eq!(
            scenarios[1].adjustments,
            MarketAdjustments {
                rate_delta: MoneyPerNight(50.0),
                high_occ_delta: Dimensionless(0.05),
                low_occ_delta: Dimensionless(-0.05),
                amenity_delta: Money(1000.0),
                token_growth_pct: Dimensionless(0.1),
                exit_years: 5,
            }
        );
    }

    #[test]
    fn test_read_scenarios_empty() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("scenarios.csv");
        fs::write(&file_path, "tokens_purchased,total_tokens,investor_type\n").unwrap();
        assert!(read_scenarios(&file_path).is_err());
    }
}
