//! Common functionality for propsim, a simulator for tokenized real-estate investments.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod assumptions;
pub mod cli;
pub mod finance;
pub mod input;
pub mod investor;
pub mod log;
pub mod output;
pub mod pool;
pub mod server;
pub mod settings;
pub mod simulation;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the directory in which the program's configuration files are stored
pub fn get_propsim_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        // No config dir on this platform; fall back to the current directory
        return PathBuf::new();
    };
    config_dir.push("propsim");

    config_dir
}
