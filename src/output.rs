//! The module responsible for writing simulation results.
use crate::finance::{PROPERTY_COUNT, PROPERTY_VALUE};
use crate::investor::{InvestorType, investor_types};
use crate::simulation::{SimulationError, SimulationRequest, SimulationResult};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::{self, Write};
use std::io;
use std::path::Path;

/// Represents a row in the sweep results CSV file
#[derive(Serialize, Debug, PartialEq)]
struct SweepRow {
    tokens_purchased: f64,
    total_tokens: f64,
    investor_type: InvestorType,
    investment: Option<f64>,
    ownership_pct: Option<f64>,
    total_stay_days: Option<f64>,
    annual_dividend: Option<f64>,
    projected_equity_value: Option<f64>,
    exit_proceeds: Option<f64>,
    return_multiple: Option<f64>,
    error: Option<String>,
}

impl SweepRow {
    /// Create a new [`SweepRow`] from a request and its outcome
    fn new(request: &SimulationRequest, outcome: &Result<SimulationResult, SimulationError>) -> Self {
        let mut row = Self {
            tokens_purchased: request.tokens_purchased.value(),
            total_tokens: request.total_tokens.value(),
            investor_type: request.investor_type,
            investment: None,
            ownership_pct: None,
            total_stay_days: None,
            annual_dividend: None,
            projected_equity_value: None,
            exit_proceeds: None,
            return_multiple: None,
            error: None,
        };

        match outcome {
            Ok(result) => {
                row.investment = Some(result.investment.value());
                row.ownership_pct = Some(result.ownership_pct.0);
                row.total_stay_days = Some(result.total_stay_days.value());
                row.annual_dividend = Some(result.annual_dividend.value());
                row.projected_equity_value = Some(result.projected_equity_value.value());
                row.exit_proceeds = Some(result.exit_proceeds.value());
                row.return_multiple = Some(result.return_multiple.0);
            }
            Err(err) => row.error = Some(err.to_string()),
        }

        row
    }
}

/// Write the outcomes of a sweep as CSV to the given writer
pub fn write_sweep_results<W: io::Write>(
    writer: W,
    outcomes: &[(SimulationRequest, Result<SimulationResult, SimulationError>)],
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for (request, outcome) in outcomes {
        writer.serialize(SweepRow::new(request, outcome))?;
    }
    writer.flush()?;

    Ok(())
}

/// Write the outcomes of a sweep to a CSV file
pub fn write_sweep_results_to_path(
    file_path: &Path,
    outcomes: &[(SimulationRequest, Result<SimulationResult, SimulationError>)],
) -> Result<()> {
    let file = std::fs::File::create(file_path)
        .with_context(|| format!("Failed to create output file: {}", file_path.display()))?;
    write_sweep_results(file, outcomes)
}

/// Render a simulation result as a human-readable report
pub fn format_report(request: &SimulationRequest, result: &SimulationResult) -> String {
    let mut out = String::new();
    write_report(&mut out, request, result).expect("Writing to a String cannot fail");
    out
}

fn write_report(
    out: &mut impl Write,
    request: &SimulationRequest,
    result: &SimulationResult,
) -> fmt::Result {
    writeln!(
        out,
        "{} tokens of {} ({} investor)",
        request.tokens_purchased, request.total_tokens, request.investor_type
    )?;
    writeln!(out, "  Investment:             ${:.2}", result.investment.value())?;
    writeln!(out, "  Ownership:              {:.3}%", result.ownership_pct.0)?;
    writeln!(out, "  Base stay days:         {:.1}", result.base_stay_days.value())?;
    if let Some(bonus) = result.user_bonus_stay_days {
        writeln!(out, "  Bonus stay days:        {:.1}", bonus.value())?;
    }
    writeln!(out, "  Total stay days:        {:.1}", result.total_stay_days.value())?;
    writeln!(out, "  Annual dividend:        ${:.2}", result.annual_dividend.value())?;
    writeln!(
        out,
        "  Projected equity:       ${:.2} (gain ${:.2})",
        result.projected_equity_value.value(),
        result.equity_gain.value()
    )?;
    writeln!(
        out,
        "  Cumulative dividends:   ${:.2}",
        result.cumulative_dividends.value()
    )?;
    writeln!(out, "  Exit proceeds:          ${:.2}", result.exit_proceeds.value())?;
    writeln!(out, "  Return multiple:        {:.2}x", result.return_multiple.0)?;

    writeln!(
        out,
        "Development ({PROPERTY_COUNT} properties valued at ${:.2} each, annual figures)",
        PROPERTY_VALUE.value()
    )?;
    let breakdown = &result.breakdown;
    writeln!(out, "  Gross rental:           ${:.2}", breakdown.gross_rental.value())?;
    writeln!(out, "  Gross amenities:        ${:.2}", breakdown.gross_amenities.value())?;
    writeln!(out, "  Net income:             ${:.2}", breakdown.net_income.value())?;
    writeln!(out, "  Dividend pool:          ${:.2}", breakdown.dividend_pool.value())?;

    writeln!(out, "Caps")?;
    for investor_type in investor_types() {
        writeln!(
            out,
            "  {:<12} cap {:>10}  remaining {:>10}",
            investor_type.to_string(),
            result.caps.cap_for(investor_type).value(),
            result.caps.remaining_for(investor_type).value()
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::request;
    use crate::simulation::simulate;
    use crate::units::Tokens;
    use rstest::rstest;

    #[rstest]
    fn test_write_sweep_results(request: SimulationRequest) {
        let rejected =
            SimulationRequest::new(Tokens(0.0), Tokens(248_400.0), InvestorType::Foreign);
        let outcomes = vec![
            (request.clone(), simulate(&request)),
            (rejected.clone(), simulate(&rejected)),
        ];

        let mut buf = Vec::new();
        write_sweep_results(&mut buf, &outcomes).unwrap();
        let csv = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "tokens_purchased,total_tokens,investor_type,investment,ownership_pct,\
             total_stay_days,annual_dividend,projected_equity_value,exit_proceeds,\
             return_multiple,error"
        );
        assert!(lines[1].starts_with("1000.0,248400.0,PHILIPPINE,25000.0,0.403,"));
        assert!(lines[1].ends_with(','));
        assert!(lines[2].starts_with("0.0,248400.0,FOREIGN,,,,,,,,"));
        assert!(lines[2].contains("Invalid token quantity"));
    }

    #[rstest]
    fn test_format_report(request: SimulationRequest) {
        let result = simulate(&request).unwrap();
        let report = format_report(&request, &result);
        assert!(report.contains("Investment:             $25000.00"));
        assert!(report.contains("Ownership:              0.403%"));
        assert!(!report.contains("Bonus stay days"));
        assert!(report.contains("Return multiple:        3.49x"));
        assert!(report.contains("62 properties valued at $250000.00 each"));
    }
}
