//! Market assumptions used by the simulation and the adjustments users may apply to them.
//!
//! Each assumption has a baseline value and a band of permitted values. Users supply deltas which
//! are added to the baseline, with the result clamped to the band.
use crate::units::{Dimensionless, Money, MoneyPerNight};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

macro_rules! define_unit_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            <$type>::new($value)
        }
    };
}

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_unit_param_default!(default_rate_delta, MoneyPerNight, 0.0);
define_unit_param_default!(default_amenity_delta, Money, 0.0);
define_param_default!(default_occupancy_delta, Dimensionless, Dimensionless(0.0));
define_param_default!(default_token_growth, Dimensionless, Dimensionless(0.05));
define_param_default!(default_exit_years, u32, 12);

/// A baseline value and the band within which the adjusted value must lie
#[derive(Debug, Clone, PartialEq)]
pub struct Band<T> {
    /// The unadjusted value
    pub baseline: T,
    /// Permitted values once adjusted
    pub range: RangeInclusive<T>,
}

impl<T> Band<T>
where
    T: Copy + PartialOrd + std::ops::Add<Output = T>,
{
    /// Apply a delta to the baseline, clamping the result to the permitted range
    pub fn apply(&self, delta: T) -> T {
        let value = self.baseline + delta;
        let (lo, hi) = (*self.range.start(), *self.range.end());

        // min(max(v, lo), hi)
        let value = if value < lo { lo } else { value };
        if value > hi { hi } else { value }
    }
}

/// Nightly rate during the high season
pub const HIGH_SEASON_RATE: Band<MoneyPerNight> = Band {
    baseline: MoneyPerNight(350.0),
    range: MoneyPerNight(250.0)..=MoneyPerNight(500.0),
};

/// Nightly rate during the low season
pub const LOW_SEASON_RATE: Band<MoneyPerNight> = Band {
    baseline: MoneyPerNight(250.0),
    range: MoneyPerNight(150.0)..=MoneyPerNight(350.0),
};

/// Occupancy during the high season
pub const HIGH_SEASON_OCCUPANCY: Band<Dimensionless> = Band {
    baseline: Dimensionless(0.85),
    range: Dimensionless(0.60)..=Dimensionless(0.95),
};

/// Occupancy during the low season
pub const LOW_SEASON_OCCUPANCY: Band<Dimensionless> = Band {
    baseline: Dimensionless(0.65),
    range: Dimensionless(0.40)..=Dimensionless(0.85),
};

/// Annual revenue from amenities across the whole development
pub const AMENITY_REVENUE: Band<Money> = Band {
    baseline: Money(150_000.0),
    range: Money(50_000.0)..=Money(300_000.0),
};

/// User-supplied adjustments to the baseline market assumptions.
///
/// Any field which is omitted takes its default value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAdjustments {
    /// Change to both high- and low-season nightly rates
    #[serde(default = "default_rate_delta")]
    pub rate_delta: MoneyPerNight,
    /// Change to high-season occupancy
    #[serde(default = "default_occupancy_delta")]
    pub high_occ_delta: Dimensionless,
    /// Change to low-season occupancy
    #[serde(default = "default_occupancy_delta")]
    pub low_occ_delta: Dimensionless,
    /// Change to annual amenity revenue
    #[serde(default = "default_amenity_delta")]
    pub amenity_delta: Money,
    /// Assumed annual appreciation of the token price
    #[serde(default = "default_token_growth")]
    pub token_growth_pct: Dimensionless,
    /// Holding horizon in whole years
    #[serde(default = "default_exit_years")]
    pub exit_years: u32,
}

impl Default for MarketAdjustments {
    fn default() -> Self {
        Self {
            rate_delta: default_rate_delta(),
            high_occ_delta: default_occupancy_delta(),
            low_occ_delta: default_occupancy_delta(),
            amenity_delta: default_amenity_delta(),
            token_growth_pct: default_token_growth(),
            exit_years: default_exit_years(),
        }
    }
}

/// Market assumptions after adjustments have been applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketAssumptions {
    /// Nightly rate in the high season
    pub high_season_rate: MoneyPerNight,
    /// Nightly rate in the low season
    pub low_season_rate: MoneyPerNight,
    /// Occupancy in the high season
    pub high_season_occupancy: Dimensionless,
    /// Occupancy in the low season
    pub low_season_occupancy: Dimensionless,
    /// Annual amenity revenue
    pub amenity_revenue: Money,
}

impl MarketAssumptions {
    /// Apply adjustments to the baseline assumptions, clamping each to its band
    pub fn from_adjustments(adjustments: &MarketAdjustments) -> Self {
        Self {
            high_season_rate: HIGH_SEASON_RATE.apply(adjustments.rate_delta),
            low_season_rate: LOW_SEASON_RATE.apply(adjustments.rate_delta),
            high_season_occupancy: HIGH_SEASON_OCCUPANCY.apply(adjustments.high_occ_delta),
            low_season_occupancy: LOW_SEASON_OCCUPANCY.apply(adjustments.low_occ_delta),
            amenity_revenue: AMENITY_REVENUE.apply(adjustments.amenity_delta),
        }
    }
}

impl Default for MarketAssumptions {
    fn default() -> Self {
        Self::from_adjustments(&MarketAdjustments::default())
    }
}
