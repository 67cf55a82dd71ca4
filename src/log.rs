//! Logging for propsim.
//!
//! Messages go to the console (ordinary messages on stdout, warnings and errors on stderr) and,
//! when a log directory is given, to a pair of files in that directory. The level can be set in
//! `settings.toml` or overridden with the `PROPSIM_LOG_LEVEL` environment variable.
use anyhow::{Context, Result, ensure};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::fs::{File, OpenOptions};
use std::io::IsTerminal;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// The log level used when neither the environment nor settings specify one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable which takes precedence over the configured log level
const LOG_LEVEL_ENV_VAR: &str = "PROPSIM_LOG_LEVEL";

/// Log file for messages about ordinary operation (e.g. requests served)
const LOG_INFO_FILE_NAME: &str = "propsim_info.log";

/// Log file for warnings (e.g. rejected purchases) and errors
const LOG_ERROR_FILE_NAME: &str = "propsim_error.log";

/// Whether [`init`] has completed successfully
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

fn parse_log_level(log_level: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(log_level)
        .ok()
        .with_context(|| format!("Unknown log level: {log_level}"))
}

/// Work out the log level, preferring the environment variable to the settings file
fn resolve_log_level(level_from_settings: Option<&str>) -> Result<LevelFilter> {
    match env::var(LOG_LEVEL_ENV_VAR) {
        Ok(level) => parse_log_level(&level),
        Err(_) => parse_log_level(level_from_settings.unwrap_or(DEFAULT_LOG_LEVEL)),
    }
}

/// Initialise the program logger.
///
/// This can only be done once per process.
///
/// # Arguments
///
/// * `level_from_settings`: The log level given in `settings.toml`, if any
/// * `log_dir`: If given, messages are also appended to log files in this directory
pub fn init(level_from_settings: Option<&str>, log_dir: Option<&Path>) -> Result<()> {
    ensure!(!is_logger_initialised(), "Logger already initialised");

    let level = resolve_log_level(level_from_settings)?;
    let mut dispatch = Dispatch::new().chain(console_dispatch(level));
    if let Some(log_dir) = log_dir {
        dispatch = dispatch.chain(file_dispatch(level, log_dir)?);
    }
    dispatch.apply()?;

    let _ = LOGGER_INIT.set(());

    Ok(())
}

/// Console output, coloured when the stream is a terminal
fn console_dispatch(level: LevelFilter) -> Dispatch {
    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let stdout_colour = std::io::stdout().is_terminal();
    let stderr_colour = std::io::stderr().is_terminal();

    let stdout = Dispatch::new()
        .filter(|metadata| metadata.level() > LevelFilter::Warn)
        .format(move |out, message, record| {
            format_coloured(out, message, record, stdout_colour.then_some(&colours));
        })
        .level(level)
        .chain(std::io::stdout());
    let stderr = Dispatch::new()
        .format(move |out, message, record| {
            format_coloured(out, message, record, stderr_colour.then_some(&colours));
        })
        .level(level.min(LevelFilter::Warn))
        .chain(std::io::stderr());

    Dispatch::new().chain(stdout).chain(stderr)
}

/// Plain-text output to the info and error log files in `log_dir`
fn file_dispatch(level: LevelFilter, log_dir: &Path) -> Result<Dispatch> {
    let open = |file_name: &str| -> Result<File> {
        let path = log_dir.join(file_name);
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Could not open log file {}", path.display()))
    };

    let info = Dispatch::new()
        .filter(|metadata| metadata.level() > LevelFilter::Warn)
        .format(format_plain)
        .level(level.max(LevelFilter::Info))
        .chain(open(LOG_INFO_FILE_NAME)?);
    let errors = Dispatch::new()
        .format(format_plain)
        .level(LevelFilter::Warn)
        .chain(open(LOG_ERROR_FILE_NAME)?);

    Ok(Dispatch::new().chain(info).chain(errors))
}

fn write_line<T: Display>(out: FormatCallback, level: T, target: &str, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");
    out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
}

fn format_plain(out: FormatCallback, message: &Arguments, record: &Record) {
    write_line(out, record.level(), record.target(), message);
}

fn format_coloured(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    colours: Option<&ColoredLevelConfig>,
) {
    match colours {
        Some(colours) => write_line(out, colours.color(record.level()), record.target(), message),
        None => format_plain(out, message, record),
    }
}
