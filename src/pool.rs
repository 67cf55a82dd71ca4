//! Token pools and the ledger of tokens sold from them.
//!
//! A pool is described by a `pool.toml` file recording the total token supply and the number of
//! tokens already sold to each class of investor. The simulation consults the ledger through the
//! [`PoolLedger`] trait, so callers decide where sales figures come from.
use crate::input::{input_err_msg, read_toml};
use crate::investor::{Caps, InvestorType, investor_types};
use crate::units::Tokens;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The default file name for pool descriptions
pub const POOL_FILE_NAME: &str = "pool.toml";

/// The token supply of a freshly bootstrapped pool
pub const DEFAULT_TOTAL_TOKENS: Tokens = Tokens(248_400.0);

/// Source of figures for tokens already sold from a pool
pub trait PoolLedger {
    /// The number of tokens sold to investors of the given class
    fn sold_tokens(&self, investor_type: InvestorType) -> Tokens;
}

/// A ledger with no recorded sales, so every cap is fully available
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyLedger;

impl PoolLedger for EmptyLedger {
    fn sold_tokens(&self, _investor_type: InvestorType) -> Tokens {
        Tokens(0.0)
    }
}

/// A token pool and its sales to date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPool {
    /// Total token supply
    pub total_tokens: Tokens,
    /// Tokens sold to foreign investors
    #[serde(default = "no_tokens")]
    pub sold_foreign: Tokens,
    /// Tokens sold to Philippine investors
    #[serde(default = "no_tokens")]
    pub sold_philippine: Tokens,
}

fn no_tokens() -> Tokens {
    Tokens(0.0)
}

impl Default for TokenPool {
    fn default() -> Self {
        Self::new(DEFAULT_TOTAL_TOKENS)
    }
}

impl PoolLedger for TokenPool {
    fn sold_tokens(&self, investor_type: InvestorType) -> Tokens {
        match investor_type {
            InvestorType::Philippine => self.sold_philippine,
            InvestorType::Foreign => self.sold_foreign,
        }
    }
}

impl TokenPool {
    /// Create a new pool with nothing sold
    pub fn new(total_tokens: Tokens) -> Self {
        Self {
            total_tokens,
            sold_foreign: no_tokens(),
            sold_philippine: no_tokens(),
        }
    }

    /// Read a pool description from the specified file.
    ///
    /// # Arguments
    ///
    /// * `file_path` - Path to a pool TOML file
    ///
    /// # Returns
    ///
    /// The pool as a [`TokenPool`] or an error if the file is missing or invalid
    pub fn from_path(file_path: &Path) -> Result<TokenPool> {
        let pool: TokenPool = read_toml(file_path)?;
        pool.validate().with_context(|| input_err_msg(file_path))?;

        Ok(pool)
    }

    /// Write a freshly bootstrapped pool to the specified file.
    ///
    /// Fails if the file already exists, so existing sales records are never overwritten.
    pub fn bootstrap(file_path: &Path, total_tokens: Tokens) -> Result<TokenPool> {
        ensure!(
            !file_path.exists(),
            "Pool file {} already exists",
            file_path.display()
        );

        let pool = Self::new(total_tokens);
        pool.validate()?;
        fs::write(file_path, toml::to_string(&pool)?)
            .with_context(|| format!("Failed to write pool file: {}", file_path.display()))?;

        Ok(pool)
    }

    /// Caps and remaining capacity for this pool
    pub fn caps(&self) -> Caps {
        Caps::new(self.total_tokens, |investor_type| {
            self.sold_tokens(investor_type)
        })
    }

    /// Check the pool is internally consistent
    fn validate(&self) -> Result<()> {
        ensure!(
            self.total_tokens.is_finite() && self.total_tokens > Tokens(0.0),
            "total_tokens must be a finite number greater than zero"
        );

        for investor_type in investor_types() {
            let sold = self.sold_tokens(investor_type);
            ensure!(
                sold.is_finite() && sold >= Tokens(0.0),
                "Tokens sold to {investor_type} investors must be a finite, non-negative number"
            );
            ensure!(
                sold <= investor_type.cap(self.total_tokens),
                "Tokens sold to {investor_type} investors ({sold}) exceed the cap of {}",
                investor_type.cap(self.total_tokens).floor()
            );
        }

        Ok(())
    }
}
