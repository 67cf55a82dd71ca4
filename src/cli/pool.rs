//! Code related to CLI interface for managing token pool files
use crate::investor::investor_types;
use crate::pool::{DEFAULT_TOTAL_TOKENS, POOL_FILE_NAME, PoolLedger, TokenPool};
use crate::units::Tokens;
use anyhow::Result;
use clap::Subcommand;
use std::fmt::{self, Write};
use std::path::{Path, PathBuf};

/// Subcommands for pools
#[derive(Subcommand)]
pub enum PoolSubcommands {
    /// Create a new pool file with no tokens sold
    Init {
        /// Where to write the pool file
        #[arg(default_value = POOL_FILE_NAME)]
        path: PathBuf,
        /// Total token supply
        #[arg(long, default_value_t = DEFAULT_TOTAL_TOKENS.value())]
        total_tokens: f64,
    },
    /// Show the caps and remaining capacity recorded in a pool file
    Show {
        /// Path to the pool file
        #[arg(default_value = POOL_FILE_NAME)]
        path: PathBuf,
    },
}

impl PoolSubcommands {
    /// Execute the supplied pool subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::Init { path, total_tokens } => handle_init_command(&path, Tokens(total_tokens)),
            Self::Show { path } => handle_show_command(&path),
        }
    }
}

/// Handle the `init` command
fn handle_init_command(path: &Path, total_tokens: Tokens) -> Result<()> {
    TokenPool::bootstrap(path, total_tokens)?;
    println!(
        "Created pool with {total_tokens} tokens at {}",
        path.display()
    );

    Ok(())
}

/// Handle the `show` command
fn handle_show_command(path: &Path) -> Result<()> {
    let pool = TokenPool::from_path(path)?;
    print!("{}", describe_pool(&pool));

    Ok(())
}

/// A summary of sales against each cap
fn describe_pool(pool: &TokenPool) -> String {
    let mut out = String::new();
    write_pool_summary(&mut out, pool).expect("Writing to a String cannot fail");
    out
}

fn write_pool_summary(out: &mut impl Write, pool: &TokenPool) -> fmt::Result {
    let caps = pool.caps();
    writeln!(out, "Total supply: {} tokens", pool.total_tokens)?;
    for investor_type in investor_types() {
        writeln!(
            out,
            "{}: cap {}, sold {}, remaining {}",
            investor_type.description(),
            caps.cap_for(investor_type),
            pool.sold_tokens(investor_type),
            caps.remaining_for(investor_type)
        )?;
    }

    Ok(())
}
