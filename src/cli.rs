//! The command line interface for the simulator.
use crate::assumptions::MarketAdjustments;
use crate::input::{read_request_json, read_scenarios};
use crate::investor::InvestorType;
use crate::log;
use crate::output::{format_report, write_sweep_results, write_sweep_results_to_path};
use crate::pool::{DEFAULT_TOTAL_TOKENS, EmptyLedger, PoolLedger, TokenPool};
use crate::server::{SharedLedger, empty_ledger, run_server};
use crate::settings::Settings;
use crate::simulation::{SimulationRequest, simulate_with_ledger};
use crate::units::{Dimensionless, Money, MoneyPerNight, Tokens};
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod pool;
use pool::PoolSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the simulator.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options describing a single purchase to simulate
#[derive(Args, Debug, Default)]
pub struct SimulateOpts {
    /// Read the request from a JSON file instead of the options below
    #[arg(long, conflicts_with_all = ["tokens", "total_tokens"])]
    pub request: Option<PathBuf>,
    /// Number of tokens to buy
    #[arg(short, long, required_unless_present = "request")]
    pub tokens: Option<f64>,
    /// Total token supply (defaults to the pool's supply, if given, else 248400)
    #[arg(long)]
    pub total_tokens: Option<f64>,
    /// The class of investor
    #[arg(short, long, value_enum, default_value_t = InvestorType::Philippine)]
    pub investor_type: InvestorType,
    /// Change to both nightly rates
    #[arg(long, allow_negative_numbers = true)]
    pub rate_delta: Option<f64>,
    /// Change to high-season occupancy
    #[arg(long, allow_negative_numbers = true)]
    pub high_occ_delta: Option<f64>,
    /// Change to low-season occupancy
    #[arg(long, allow_negative_numbers = true)]
    pub low_occ_delta: Option<f64>,
    /// Change to annual amenity revenue
    #[arg(long, allow_negative_numbers = true)]
    pub amenity_delta: Option<f64>,
    /// Assumed annual token appreciation (e.g. 0.05 for 5%)
    #[arg(long, allow_negative_numbers = true)]
    pub token_growth: Option<f64>,
    /// Holding period in years
    #[arg(long)]
    pub exit_years: Option<u32>,
}

impl SimulateOpts {
    /// Build the adjustments, falling back to defaults for anything not specified
    fn adjustments(&self) -> MarketAdjustments {
        let defaults = MarketAdjustments::default();
        MarketAdjustments {
            rate_delta: self.rate_delta.map_or(defaults.rate_delta, MoneyPerNight),
            high_occ_delta: self.high_occ_delta.map_or(defaults.high_occ_delta, Dimensionless),
            low_occ_delta: self.low_occ_delta.map_or(defaults.low_occ_delta, Dimensionless),
            amenity_delta: self.amenity_delta.map_or(defaults.amenity_delta, Money),
            token_growth_pct: self.token_growth.map_or(defaults.token_growth_pct, Dimensionless),
            exit_years: self.exit_years.unwrap_or(defaults.exit_years),
        }
    }

    /// Build the simulation request described by these options
    pub fn to_request(&self, pool: Option<&TokenPool>) -> Result<SimulationRequest> {
        if let Some(path) = &self.request {
            return read_request_json(path);
        }

        let default_total = pool.map_or(DEFAULT_TOTAL_TOKENS, |pool| pool.total_tokens);
        Ok(SimulationRequest {
            tokens_purchased: Tokens(self.tokens.unwrap_or_default()),
            total_tokens: self.total_tokens.map_or(default_total, Tokens),
            investor_type: self.investor_type,
            adjustments: self.adjustments(),
        })
    }
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Simulate a single token purchase.
    Simulate {
        /// The purchase to simulate
        #[command(flatten)]
        opts: SimulateOpts,
        /// Pool file recording tokens already sold
        #[arg(long)]
        pool: Option<PathBuf>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Simulate every scenario in a CSV file.
    Sweep {
        /// Path to the scenarios CSV file
        scenarios: PathBuf,
        /// File to write results to (defaults to standard output)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Pool file recording tokens already sold
        #[arg(long)]
        pool: Option<PathBuf>,
    },
    /// Serve the simulator over HTTP.
    Serve {
        /// Address to listen on (defaults to the value in settings)
        #[arg(short, long)]
        address: Option<String>,
        /// Pool file recording tokens already sold
        #[arg(long)]
        pool: Option<PathBuf>,
        /// Directory in which to write log files
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
    /// Manage token pool files.
    Pool {
        /// The available subcommands for managing pools.
        #[command(subcommand)]
        subcommand: PoolSubcommands,
    },
    /// Manage settings file.
    Settings {
        /// The subcommands for managing the settings file
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Simulate { opts, pool, json } => {
                handle_simulate_command(&opts, pool.as_deref(), json, None)
            }
            Self::Sweep {
                scenarios,
                output,
                pool,
            } => handle_sweep_command(&scenarios, output.as_deref(), pool.as_deref(), None),
            Self::Serve {
                address,
                pool,
                log_dir,
            } => handle_serve_command(address, pool.as_deref(), log_dir.as_deref(), None),
            Self::Pool { subcommand } => subcommand.execute(),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and start propsim
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ propsim --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        // Output program help
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load program settings, if not provided
fn settings_or_load(settings: Option<Settings>) -> Result<Settings> {
    if let Some(settings) = settings {
        Ok(settings)
    } else {
        Settings::load().context("Failed to load settings.")
    }
}

/// Load the pool given on the command line, or else the one named in settings
fn load_pool(pool_path: Option<&Path>, settings: &Settings) -> Result<Option<TokenPool>> {
    let Some(path) = pool_path.or(settings.pool_file.as_deref()) else {
        return Ok(None);
    };

    let pool = TokenPool::from_path(path).context("Failed to load pool.")?;
    info!("Loaded pool from {}", path.display());

    Ok(Some(pool))
}

/// The ledger to check purchases against, if any sales have been recorded
fn as_ledger(pool: Option<&TokenPool>) -> &dyn PoolLedger {
    match pool {
        Some(pool) => pool,
        None => &EmptyLedger,
    }
}

/// Handle the `simulate` command.
pub fn handle_simulate_command(
    opts: &SimulateOpts,
    pool_path: Option<&Path>,
    json: bool,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = settings_or_load(settings)?;
    log::init(Some(&settings.log_level), None).context("Failed to initialise logging.")?;

    let pool = load_pool(pool_path, &settings)?;
    let request = opts.to_request(pool.as_ref())?;
    let result = simulate_with_ledger(&request, as_ledger(pool.as_ref()))
        .context("Simulation rejected.")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", format_report(&request, &result));
    }

    Ok(())
}

/// Handle the `sweep` command.
pub fn handle_sweep_command(
    scenarios_path: &Path,
    output_path: Option<&Path>,
    pool_path: Option<&Path>,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = settings_or_load(settings)?;
    log::init(Some(&settings.log_level), None).context("Failed to initialise logging.")?;

    let pool = load_pool(pool_path, &settings)?;
    let ledger = as_ledger(pool.as_ref());

    let scenarios = read_scenarios(scenarios_path).context("Failed to load scenarios.")?;
    info!(
        "Loaded {} scenarios from {}",
        scenarios.len(),
        scenarios_path.display()
    );

    let outcomes: Vec<_> = scenarios
        .into_iter()
        .map(|request| {
            let outcome = simulate_with_ledger(&request, ledger);
            (request, outcome)
        })
        .collect();

    let rejected = outcomes.iter().filter(|(_, outcome)| outcome.is_err()).count();
    if rejected > 0 {
        warn!("{rejected} of {} scenarios were rejected", outcomes.len());
    }

    if let Some(output_path) = output_path {
        write_sweep_results_to_path(output_path, &outcomes)?;
        info!("Results written to {}", output_path.display());
    } else {
        write_sweep_results(std::io::stdout().lock(), &outcomes)?;
    }

    Ok(())
}

/// Handle the `serve` command.
pub fn handle_serve_command(
    address: Option<String>,
    pool_path: Option<&Path>,
    log_dir: Option<&Path>,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = settings_or_load(settings)?;
    log::init(Some(&settings.log_level), log_dir).context("Failed to initialise logging.")?;

    let ledger: SharedLedger = match load_pool(pool_path, &settings)? {
        Some(pool) => Arc::new(pool),
        None => {
            info!("No pool file given; remaining capacity will be reported as the full cap");
            empty_ledger()
        }
    };

    let address = address.unwrap_or(settings.bind_address);
    run_server(&address, ledger)
}
