//! Functionality for running the investment simulation.
//!
//! A simulation takes a proposed token purchase and projects ownership, stay entitlement,
//! dividends and exit proceeds for it. It is a pure calculation: the only state consulted is the
//! [`PoolLedger`] supplied by the caller.
use crate::assumptions::{MarketAdjustments, MarketAssumptions};
use crate::finance::{IncomeStatement, compound_growth, holder_dividend, investment_cost};
use crate::investor::{Caps, InvestorType, remaining_capacity};
use crate::pool::{EmptyLedger, PoolLedger};
use crate::units::{Days, Dimensionless, Money, MoneyPerDay, Tokens};
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt;

/// Investment buying one day's stay
pub const STAY_DAY_COST: MoneyPerDay = MoneyPerDay(1000.0);

/// The minimum stay entitlement for any holder
pub const MIN_STAY_DAYS: Days = Days(7.0);

/// Holders owning more than this percentage of the pool receive bonus stay days
pub const BONUS_OWNERSHIP_THRESHOLD_PCT: Dimensionless = Dimensionless(5.0);

/// Bonus stay days as a proportion of the base entitlement
pub const BONUS_STAY_RATIO: Dimensionless = Dimensionless(0.2);

/// Decimal places for reported monetary values and the return multiple
const MONEY_DP: i32 = 2;

/// Decimal places for reported percentages
const PERCENT_DP: i32 = 3;

/// Decimal places for reported day counts
const DAYS_DP: i32 = 1;

fn no_tokens() -> Tokens {
    Tokens(0.0)
}

/// Read a token count, treating `null` like a missing value
fn deserialize_tokens_or_none<'de, D>(deserializer: D) -> Result<Tokens, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Tokens>::deserialize(deserializer)?.unwrap_or_else(no_tokens))
}

/// A proposed token purchase to simulate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    /// Tokens the investor wants to buy (missing or null is treated as zero, and rejected)
    #[serde(default = "no_tokens", deserialize_with = "deserialize_tokens_or_none")]
    pub tokens_purchased: Tokens,
    /// Total token supply of the pool
    pub total_tokens: Tokens,
    /// The class of investor, which determines the applicable cap
    pub investor_type: InvestorType,
    /// Adjustments to the baseline market assumptions
    #[serde(default)]
    pub adjustments: MarketAdjustments,
}

impl SimulationRequest {
    /// Create a request with default market assumptions
    pub fn new(tokens_purchased: Tokens, total_tokens: Tokens, investor_type: InvestorType) -> Self {
        Self {
            tokens_purchased,
            total_tokens,
            investor_type,
            adjustments: MarketAdjustments::default(),
        }
    }
}

/// Headline figures for the whole development
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    /// Gross rental revenue across all properties
    pub gross_rental: Money,
    /// Gross amenity revenue
    pub gross_amenities: Money,
    /// Net income after operating and amenity costs
    pub net_income: Money,
    /// Net income distributed to token holders
    pub dividend_pool: Money,
}

/// The projected outcome of a token purchase.
///
/// All values are rounded for reporting: money and the return multiple to 2 decimal places,
/// percentages to 3 and day counts to 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// Cost of the tokens
    pub investment: Money,
    /// Share of the total supply, as a percentage
    pub ownership_pct: Dimensionless,
    /// Stay days bought by the investment
    pub base_stay_days: Days,
    /// Only present for holders above the bonus threshold
    pub user_bonus_stay_days: Option<Days>,
    /// Base plus bonus stay days
    pub total_stay_days: Days,
    /// The holder's share of the dividend pool
    #[serde(rename = "annualDividendUSD")]
    pub annual_dividend: Money,
    /// Value of the holding today
    pub current_equity_value: Money,
    /// Value of the holding at exit
    pub projected_equity_value: Money,
    /// Projected less current value
    pub equity_gain: Money,
    /// Dividends over the holding period (not reinvested)
    pub cumulative_dividends: Money,
    /// Projected equity plus cumulative dividends
    pub exit_proceeds: Money,
    /// Exit proceeds as a multiple of the investment
    pub return_multiple: Dimensionless,
    /// Figures for the development as a whole
    pub breakdown: Breakdown,
    /// Ownership caps for the pool
    pub caps: Caps,
}

/// The reasons a simulation may be rejected
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// The token count was missing, non-finite or not positive
    InvalidQuantity,
    /// The purchase would take the investor class over its ownership cap
    CapExceeded {
        /// The class of investor
        investor_type: InvestorType,
        /// Tokens which could be bought (rounded down)
        available: Tokens,
    },
    /// Any other failure, e.g. malformed input
    Processing(String),
}

impl SimulationError {
    /// Whether the error was caused by the caller's request (as opposed to a processing failure)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Processing(_))
    }
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidQuantity => {
                write!(f, "Invalid token quantity: tokensPurchased must be greater than zero")
            }
            Self::CapExceeded {
                investor_type,
                available,
            } => write!(
                f,
                "{} investors can only purchase up to {} tokens ({}% cap)",
                investor_type.description(),
                available,
                (investor_type.cap_fraction().0 * 100.0).round()
            ),
            Self::Processing(msg) => write!(f, "Failed to process simulation: {msg}"),
        }
    }
}

impl Error for SimulationError {}

/// Stay entitlement for a holder.
///
/// Returns the base number of days and, for holders above the ownership threshold, bonus days.
pub fn stay_entitlement(investment: Money, ownership_pct: Dimensionless) -> (Days, Option<Days>) {
    let base = (investment / STAY_DAY_COST).max(MIN_STAY_DAYS);
    let bonus = (ownership_pct > BONUS_OWNERSHIP_THRESHOLD_PCT).then(|| base * BONUS_STAY_RATIO);
    (base, bonus)
}

/// Run a simulation assuming no tokens have been sold yet.
///
/// The reported remaining capacity is therefore the full cap for each investor class.
pub fn simulate(request: &SimulationRequest) -> Result<SimulationResult, SimulationError> {
    simulate_with_ledger(request, &EmptyLedger)
}

/// Run a simulation against a pool whose sales are recorded in `ledger`.
///
/// The purchase is checked against the capacity remaining under the investor's cap.
pub fn simulate_with_ledger(
    request: &SimulationRequest,
    ledger: &dyn PoolLedger,
) -> Result<SimulationResult, SimulationError> {
    debug!("Simulating request: {request:?}");

    let tokens = request.tokens_purchased;
    if !(tokens.is_finite() && tokens > Tokens(0.0)) {
        return Err(SimulationError::InvalidQuantity);
    }
    check_request_shape(request)?;

    let total_tokens = request.total_tokens;
    let sold = |investor_type| ledger.sold_tokens(investor_type);
    let available = remaining_capacity(total_tokens, request.investor_type, sold);
    if tokens > available {
        return Err(SimulationError::CapExceeded {
            investor_type: request.investor_type,
            available: available.floor(),
        });
    }

    let adjustments = &request.adjustments;
    let assumptions = MarketAssumptions::from_adjustments(adjustments);
    debug!("Market assumptions after adjustment: {assumptions:?}");

    // Ownership and stay entitlement
    let investment = investment_cost(tokens);
    let ownership = tokens / total_tokens;
    let ownership_pct = ownership * Dimensionless(100.0);
    let (base_stay_days, bonus_stay_days) = stay_entitlement(investment, ownership_pct);
    let total_stay_days = base_stay_days + bonus_stay_days.unwrap_or(Days(0.0));

    // Income and dividends
    let income = IncomeStatement::new(&assumptions);
    let annual_dividend = holder_dividend(income.dividend_pool, ownership_pct);

    // Equity and exit
    let years = adjustments.exit_years;
    let projected_equity_value = compound_growth(investment, adjustments.token_growth_pct, years);
    let equity_gain = projected_equity_value - investment;
    let cumulative_dividends = annual_dividend * Dimensionless(f64::from(years));
    let exit_proceeds = projected_equity_value + cumulative_dividends;
    let return_multiple = exit_proceeds / investment;

    if !(exit_proceeds.is_finite() && return_multiple.is_finite()) {
        return Err(SimulationError::Processing(
            "projection produced a non-finite value".into(),
        ));
    }

    Ok(SimulationResult {
        investment: investment.round_dp(MONEY_DP),
        ownership_pct: ownership_pct.round_dp(PERCENT_DP),
        base_stay_days: base_stay_days.round_dp(DAYS_DP),
        user_bonus_stay_days: bonus_stay_days.map(|days| days.round_dp(DAYS_DP)),
        total_stay_days: total_stay_days.round_dp(DAYS_DP),
        annual_dividend: annual_dividend.round_dp(MONEY_DP),
        current_equity_value: investment.round_dp(MONEY_DP),
        projected_equity_value: projected_equity_value.round_dp(MONEY_DP),
        equity_gain: equity_gain.round_dp(MONEY_DP),
        cumulative_dividends: cumulative_dividends.round_dp(MONEY_DP),
        exit_proceeds: exit_proceeds.round_dp(MONEY_DP),
        return_multiple: return_multiple.round_dp(MONEY_DP),
        breakdown: Breakdown {
            gross_rental: income.gross_rental.round_dp(MONEY_DP),
            gross_amenities: income.gross_amenities.round_dp(MONEY_DP),
            net_income: income.net_income.round_dp(MONEY_DP),
            dividend_pool: income.dividend_pool.round_dp(MONEY_DP),
        },
        caps: Caps::new(total_tokens, sold),
    })
}

/// Check the fields other than the token count are usable
fn check_request_shape(request: &SimulationRequest) -> Result<(), SimulationError> {
    let invalid = |msg: &str| Err(SimulationError::Processing(msg.into()));

    if !(request.total_tokens.is_finite() && request.total_tokens > Tokens(0.0)) {
        return invalid("totalTokens must be a finite number greater than zero");
    }

    let adjustments = &request.adjustments;
    let deltas_finite = adjustments.rate_delta.is_finite()
        && adjustments.high_occ_delta.is_finite()
        && adjustments.low_occ_delta.is_finite()
        && adjustments.amenity_delta.is_finite()
        && adjustments.token_growth_pct.is_finite();
    if !deltas_finite {
        return invalid("adjustments must be finite numbers");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_sim_error, request};
    use crate::pool::TokenPool;
    use crate::units::MoneyPerNight;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_simulate_concrete_scenario(request: SimulationRequest) {
        let result = simulate(&request).unwrap();

        assert_eq!(result.investment, Money(25_000.0));
        assert_eq!(result.ownership_pct, Dimensionless(0.403));
        assert_eq!(result.base_stay_days, Days(25.0));
        assert_eq!(result.user_bonus_stay_days, None);
        assert_eq!(result.total_stay_days, Days(25.0));
        assert_eq!(result.annual_dividend, Money(3519.40));
        assert_eq!(result.current_equity_value, Money(25_000.0));
        assert_eq!(result.projected_equity_value, Money(44_896.41));
        assert_eq!(result.equity_gain, Money(19_896.41));
        assert_eq!(result.cumulative_dividends, Money(42_232.83));
        assert_eq!(result.exit_proceeds, Money(87_129.23));
        assert_eq!(result.return_multiple, Dimensionless(3.49));
        assert_eq!(
            result.breakdown,
            Breakdown {
                gross_rental: Money(4_681_775.0),
                gross_amenities: Money(150_000.0),
                net_income: Money(2_914_065.0),
                dividend_pool: Money(874_219.5),
            }
        );
        assert_eq!(
            result.caps,
            Caps {
                foreign_cap: Tokens(99_360.0),
                philippine_cap: Tokens(149_040.0),
                remaining_foreign: Tokens(99_360.0),
                remaining_philippine: Tokens(149_040.0),
            }
        );
    }

    #[rstest]
    fn test_simulate_is_deterministic(request: SimulationRequest) {
        assert_eq!(simulate(&request).unwrap(), simulate(&request).unwrap());
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(-1e9)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_simulate_invalid_quantity(mut request: SimulationRequest, #[case] tokens: f64) {
        request.tokens_purchased = Tokens(tokens);
        assert_eq!(simulate(&request), Err(SimulationError::InvalidQuantity));
    }

    #[rstest]
    fn test_simulate_invalid_quantity_checked_first(mut request: SimulationRequest) {
        request.tokens_purchased = Tokens(0.0);
        request.total_tokens = Tokens(-5.0);
        assert_eq!(simulate(&request), Err(SimulationError::InvalidQuantity));
    }

    #[rstest]
    #[case(InvestorType::Foreign, 400.0, true)]
    #[case(InvestorType::Foreign, 400.5, false)]
    #[case(InvestorType::Philippine, 600.0, true)]
    #[case(InvestorType::Philippine, 600.001, false)]
    #[case(InvestorType::Philippine, 500.0, true)] // Over the foreign cap but fine here
    fn test_simulate_cap(
        #[case] investor_type: InvestorType,
        #[case] tokens: f64,
        #[case] expected_ok: bool,
    ) {
        let request = SimulationRequest::new(Tokens(tokens), Tokens(1000.0), investor_type);
        let result = simulate(&request);
        if expected_ok {
            assert!(result.is_ok(), "Expected success, got {result:?}");
        } else {
            assert!(matches!(
                result,
                Err(SimulationError::CapExceeded { investor_type: t, .. }) if t == investor_type
            ));
        }
    }

    #[test]
    fn test_cap_exceeded_message() {
        let request =
            SimulationRequest::new(Tokens(100_000.0), Tokens(248_400.0), InvestorType::Foreign);
        assert_sim_error!(
            simulate(&request),
            "Foreign investors can only purchase up to 99360 tokens (40% cap)"
        );

        let request =
            SimulationRequest::new(Tokens(1001.0), Tokens(1001.0), InvestorType::Philippine);
        assert_sim_error!(
            simulate(&request),
            "Philippine investors can only purchase up to 600 tokens (60% cap)"
        );
    }

    #[rstest]
    #[case(0.0)]
    #[case(-10.0)]
    #[case(f64::INFINITY)]
    fn test_simulate_invalid_total(mut request: SimulationRequest, #[case] total: f64) {
        request.total_tokens = Tokens(total);
        let result = simulate(&request);
        assert!(matches!(result, Err(SimulationError::Processing(_))));
        assert!(!result.unwrap_err().is_client_error());
    }

    #[rstest]
    fn test_simulate_non_finite_adjustment(mut request: SimulationRequest) {
        request.adjustments.rate_delta = MoneyPerNight(f64::NAN);
        assert!(matches!(
            simulate(&request),
            Err(SimulationError::Processing(_))
        ));
    }

    #[rstest]
    fn test_simulate_clamped_rate(mut request: SimulationRequest) {
        request.adjustments.rate_delta = MoneyPerNight(1000.0);
        let result = simulate(&request).unwrap();

        // High season clamped to 500, low season clamped to 350
        let expected = (500.0 * 120.0 * 0.85 + 350.0 * 245.0 * 0.65) * 62.0;
        assert_approx_eq!(
            Money,
            result.breakdown.gross_rental,
            Money(expected),
            epsilon = 1e-2
        );
    }

    #[rstest]
    #[case(50_000.0, false)] // Exactly 5%
    #[case(50_001.0, true)] // 5.0001%
    fn test_bonus_threshold(#[case] tokens: f64, #[case] expect_bonus: bool) {
        let request =
            SimulationRequest::new(Tokens(tokens), Tokens(1_000_000.0), InvestorType::Philippine);
        let result = simulate(&request).unwrap();
        assert_eq!(result.user_bonus_stay_days.is_some(), expect_bonus);
        if let Some(bonus) = result.user_bonus_stay_days {
            assert_approx_eq!(
                Days,
                bonus,
                result.base_stay_days * BONUS_STAY_RATIO,
                epsilon = 0.1
            );
        }
    }

    #[test]
    fn test_bonus_stay_days() {
        // 6% ownership: base 1500 days, bonus 300
        let request =
            SimulationRequest::new(Tokens(60_000.0), Tokens(1_000_000.0), InvestorType::Foreign);
        let result = simulate(&request).unwrap();
        assert_eq!(result.base_stay_days, Days(1500.0));
        assert_eq!(result.user_bonus_stay_days, Some(Days(300.0)));
        assert_eq!(result.total_stay_days, Days(1800.0));
    }

    #[rstest]
    #[case(1.0, 7.0)] // $25 investment still gets the minimum
    #[case(280.0, 7.0)] // $7000
    #[case(400.0, 10.0)] // $10000
    fn test_minimum_stay(#[case] tokens: f64, #[case] expected: f64) {
        let request =
            SimulationRequest::new(Tokens(tokens), Tokens(248_400.0), InvestorType::Philippine);
        let result = simulate(&request).unwrap();
        assert_eq!(result.base_stay_days, Days(expected));
    }

    #[test]
    fn test_monotonic_in_tokens() {
        let total = Tokens(248_400.0);
        let results: Vec<_> = [100.0, 1000.0, 10_000.0, 50_000.0]
            .into_iter()
            .map(|tokens| {
                let request = SimulationRequest::new(Tokens(tokens), total, InvestorType::Foreign);
                simulate(&request).unwrap()
            })
            .collect();

        for pair in results.windows(2) {
            assert!(pair[1].investment > pair[0].investment);
            assert!(pair[1].ownership_pct > pair[0].ownership_pct);
            assert!(pair[1].annual_dividend > pair[0].annual_dividend);
        }
    }

    #[rstest]
    fn test_no_growth_no_time(mut request: SimulationRequest) {
        request.adjustments.token_growth_pct = Dimensionless(0.0);
        request.adjustments.exit_years = 0;
        let result = simulate(&request).unwrap();

        assert_eq!(result.projected_equity_value, result.investment);
        assert_eq!(result.equity_gain, Money(0.0));
        assert_eq!(result.cumulative_dividends, Money(0.0));
        assert_eq!(result.return_multiple, Dimensionless(1.0));
    }

    #[rstest]
    fn test_simulate_with_ledger(request: SimulationRequest) {
        let pool = TokenPool {
            total_tokens: Tokens(248_400.0),
            sold_foreign: Tokens(99_000.0),
            sold_philippine: Tokens(149_000.0),
        };

        // Only 40 Philippine tokens left
        assert_eq!(
            simulate_with_ledger(&request, &pool),
            Err(SimulationError::CapExceeded {
                investor_type: InvestorType::Philippine,
                available: Tokens(40.0),
            })
        );

        let request =
            SimulationRequest::new(Tokens(40.0), Tokens(248_400.0), InvestorType::Philippine);
        let result = simulate_with_ledger(&request, &pool).unwrap();
        assert_eq!(result.caps.remaining_philippine, Tokens(40.0));
        assert_eq!(result.caps.remaining_foreign, Tokens(360.0));
        assert_eq!(result.caps.philippine_cap, Tokens(149_040.0));
    }

    #[test]
    fn test_request_from_json() {
        let request: SimulationRequest = serde_json::from_str(
            r#"{"tokensPurchased": 1000, "totalTokens": 248400, "investorType": "PHILIPPINE"}"#,
        )
        .unwrap();
        assert_eq!(
            request,
            SimulationRequest::new(Tokens(1000.0), Tokens(248_400.0), InvestorType::Philippine)
        );
    }

    #[rstest]
    #[case(r#"{"totalTokens": 248400, "investorType": "FOREIGN"}"#)]
    #[case(r#"{"tokensPurchased": null, "totalTokens": 248400, "investorType": "FOREIGN"}"#)]
    fn test_request_missing_tokens(#[case] json: &str) {
        let request: SimulationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.tokens_purchased, Tokens(0.0));
        assert_eq!(simulate(&request), Err(SimulationError::InvalidQuantity));
    }

    #[rstest]
    fn test_simulate_long_horizon(mut request: SimulationRequest) {
        request.adjustments.exit_years = u32::MAX;
        let result = simulate(&request);
        assert!(matches!(result, Err(SimulationError::Processing(_))));
        assert!(!result.unwrap_err().is_client_error());
    }

    #[rstest]
    fn test_annual_dividend_uses_ownership_pct(request: SimulationRequest) {
        let result = simulate(&request).unwrap();
        let income = IncomeStatement::new(&MarketAssumptions::default());
        let ownership_pct = 1000.0 / 248_400.0 * 100.0;
        let expected = income.dividend_pool.value() * (ownership_pct / 100.0);
        assert_eq!(result.annual_dividend, Money(expected).round_dp(MONEY_DP));
    }

    #[rstest]
    fn test_result_json_fields(request: SimulationRequest) {
        let value = serde_json::to_value(simulate(&request).unwrap()).unwrap();
        assert_eq!(value["annualDividendUSD"], serde_json::json!(3519.4));
        assert!(value["userBonusStayDays"].is_null());
        assert_eq!(value["breakdown"]["dividendPool"], serde_json::json!(874_219.5));
        assert_eq!(value["caps"]["remainingForeign"], serde_json::json!(99_360.0));
    }
}
