//! Program settings, read from `settings.toml` in the user's config directory.
use crate::get_propsim_config_dir;
use crate::input::{input_err_msg, read_toml};
use crate::log::DEFAULT_LOG_LEVEL;
use anyhow::{Context, Result, ensure};
use documented::DocumentedFields;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const SETTINGS_FILE_NAME: &str = "settings.toml";

const DEFAULT_SETTINGS_FILE_HEADER: &str = "# Program settings for propsim
# Uncomment a setting to change it from its default
";

/// The address the HTTP server listens on unless told otherwise
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

/// Get the path to where the settings file will be read from
pub fn get_settings_file_path() -> PathBuf {
    get_propsim_config_dir().join(SETTINGS_FILE_NAME)
}

/// Program settings from config file
#[derive(Debug, DocumentedFields, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// The log level (off, error, warn, info, debug or trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// The IP address and port the HTTP server listens on
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// A pool file recording tokens already sold, used to check purchases against remaining
    /// capacity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            bind_address: default_bind_address(),
            pool_file: None,
        }
    }
}

impl Settings {
    /// Read the program settings file, using default values if it is not present
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    /// Read settings from the specified path, using default values if there is no file there
    pub fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        let settings: Settings = read_toml(file_path)?;
        settings
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            LevelFilter::from_str(&self.log_level).is_ok(),
            "Invalid log_level: {}",
            self.log_level
        );
        ensure!(
            self.bind_address.parse::<SocketAddr>().is_ok(),
            "bind_address must be an IP address and port (e.g. {DEFAULT_BIND_ADDRESS}), got {}",
            self.bind_address
        );

        Ok(())
    }

    /// The contents of a settings file with every setting documented and commented out
    pub fn default_file_contents() -> Result<String> {
        let defaults: toml::Table = toml::to_string(&Settings::default())?.parse()?;

        let mut out = DEFAULT_SETTINGS_FILE_HEADER.to_string();
        for field in Settings::FIELD_NAMES {
            let docs = Settings::get_field_docs(field)
                .ok()
                .with_context(|| format!("Missing documentation for setting {field}"))?;
            out.push('\n');
            for line in docs.lines() {
                writeln!(out, "# # {}", line.trim())?;
            }

            match defaults.get(*field) {
                Some(value) => writeln!(out, "# {field} = {value}")?,
                None => writeln!(out, "# {field} = (no default)")?,
            }
        }

        Ok(out)
    }
}
