//! Investor classes and the nationality-based ownership caps which apply to them.
use crate::units::{Dimensionless, Tokens};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// The class of investor, which determines the applicable ownership cap
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    Serialize,
    Deserialize,
    ValueEnum,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestorType {
    /// A Philippine national
    #[default]
    Philippine,
    /// Any other investor
    Foreign,
}

impl InvestorType {
    /// The maximum proportion of the total token supply investors of this class may hold
    pub fn cap_fraction(self) -> Dimensionless {
        match self {
            Self::Philippine => Dimensionless(0.60),
            Self::Foreign => Dimensionless(0.40),
        }
    }

    /// The maximum number of tokens investors of this class may hold
    pub fn cap(self, total_tokens: Tokens) -> Tokens {
        total_tokens * self.cap_fraction()
    }

    /// A human-readable description, used in error messages
    pub fn description(self) -> &'static str {
        match self {
            Self::Philippine => "Philippine",
            Self::Foreign => "Foreign",
        }
    }
}

/// Ownership caps for a pool and the capacity still available under each.
///
/// All figures are rounded down to whole tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Caps {
    /// Cap for foreign investors
    pub foreign_cap: Tokens,
    /// Cap for Philippine investors
    pub philippine_cap: Tokens,
    /// Foreign allocation not yet sold
    pub remaining_foreign: Tokens,
    /// Philippine allocation not yet sold
    pub remaining_philippine: Tokens,
}

impl Caps {
    /// Calculate caps for a pool, given a function returning the tokens already sold to each class
    pub fn new<F>(total_tokens: Tokens, sold: F) -> Self
    where
        F: Fn(InvestorType) -> Tokens,
    {
        let remaining =
            |investor_type: InvestorType| remaining_capacity(total_tokens, investor_type, &sold);

        Self {
            foreign_cap: InvestorType::Foreign.cap(total_tokens).floor(),
            philippine_cap: InvestorType::Philippine.cap(total_tokens).floor(),
            remaining_foreign: remaining(InvestorType::Foreign).floor(),
            remaining_philippine: remaining(InvestorType::Philippine).floor(),
        }
    }

    /// The (floored) cap for the given investor class
    pub fn cap_for(&self, investor_type: InvestorType) -> Tokens {
        match investor_type {
            InvestorType::Philippine => self.philippine_cap,
            InvestorType::Foreign => self.foreign_cap,
        }
    }

    /// The (floored) remaining capacity for the given investor class
    pub fn remaining_for(&self, investor_type: InvestorType) -> Tokens {
        match investor_type {
            InvestorType::Philippine => self.remaining_philippine,
            InvestorType::Foreign => self.remaining_foreign,
        }
    }
}

/// Capacity left under an investor class's cap, never negative
pub fn remaining_capacity<F>(total_tokens: Tokens, investor_type: InvestorType, sold: F) -> Tokens
where
    F: Fn(InvestorType) -> Tokens,
{
    (investor_type.cap(total_tokens) - sold(investor_type)).max(Tokens(0.0))
}

/// Iterate over all investor classes
pub fn investor_types() -> impl Iterator<Item = InvestorType> {
    InvestorType::iter()
}
