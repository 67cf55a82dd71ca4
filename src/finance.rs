//! General functions related to finance: rental revenue, dividends and equity growth.
use crate::assumptions::MarketAssumptions;
use crate::units::{Days, Dimensionless, Money, MoneyPerToken, Tokens};

/// The fixed price of a single token
pub const TOKEN_PRICE: MoneyPerToken = MoneyPerToken(25.0);

/// The number of rentable properties in the development
pub const PROPERTY_COUNT: f64 = 62.0;

/// The value of a single property.
///
/// Only used descriptively; it does not enter the dividend calculation.
pub const PROPERTY_VALUE: Money = Money(250_000.0);

/// Length of the high season
pub const HIGH_SEASON_DAYS: Days = Days(120.0);

/// Length of the low season
pub const LOW_SEASON_DAYS: Days = Days(245.0);

/// Operating expenses as a proportion of gross rental revenue
pub const OPERATING_EXPENSE_RATIO: Dimensionless = Dimensionless(0.40);

/// Amenity costs as a proportion of amenity revenue
pub const AMENITY_COST_RATIO: Dimensionless = Dimensionless(0.30);

/// The proportion of net income distributed to token holders
pub const DIVIDEND_PAYOUT_RATIO: Dimensionless = Dimensionless(0.30);

/// Annual income for the whole development and how it is split
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncomeStatement {
    /// Gross rental revenue across all properties
    pub gross_rental: Money,
    /// Operating expenses
    pub operating_expenses: Money,
    /// Rental revenue less operating expenses
    pub net_rental: Money,
    /// Gross amenity revenue
    pub gross_amenities: Money,
    /// Amenity revenue less amenity costs
    pub net_amenities: Money,
    /// Net rental plus net amenity income
    pub net_income: Money,
    /// The share of net income paid out as dividends
    pub dividend_pool: Money,
}

impl IncomeStatement {
    /// Calculate annual income for the given market assumptions
    pub fn new(assumptions: &MarketAssumptions) -> Self {
        let gross_rental = gross_rental_per_property(assumptions) * Dimensionless(PROPERTY_COUNT);
        let operating_expenses = gross_rental * OPERATING_EXPENSE_RATIO;
        let net_rental = gross_rental - operating_expenses;

        let gross_amenities = assumptions.amenity_revenue;
        let net_amenities = gross_amenities * (Dimensionless(1.0) - AMENITY_COST_RATIO);

        let net_income = net_rental + net_amenities;
        Self {
            gross_rental,
            operating_expenses,
            net_rental,
            gross_amenities,
            net_amenities,
            net_income,
            dividend_pool: net_income * DIVIDEND_PAYOUT_RATIO,
        }
    }
}

/// Annual gross rental revenue for a single property
pub fn gross_rental_per_property(assumptions: &MarketAssumptions) -> Money {
    let high = assumptions.high_season_rate * HIGH_SEASON_DAYS * assumptions.high_season_occupancy;
    let low = assumptions.low_season_rate * LOW_SEASON_DAYS * assumptions.low_season_occupancy;
    high + low
}

/// The cost of buying the given number of tokens
pub fn investment_cost(tokens: Tokens) -> Money {
    tokens * TOKEN_PRICE
}

/// The share of the dividend pool paid to a holder owning `ownership_pct` percent of the pool
pub fn holder_dividend(dividend_pool: Money, ownership_pct: Dimensionless) -> Money {
    dividend_pool * (ownership_pct / Dimensionless(100.0))
}

/// Value of an investment after growing at a fixed annual rate for a number of years.
///
/// Overflows to infinity rather than wrapping for very long horizons.
pub fn compound_growth(principal: Money, annual_growth: Dimensionless, years: u32) -> Money {
    principal * (Dimensionless(1.0) + annual_growth).powf(f64::from(years))
}
