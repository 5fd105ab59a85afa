use std::time::Duration;

use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::parsers::duration_from_str;
use crate::args::{PositiveU64, PositiveUsize, VolleyArgs};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

/// Applies configuration values to CLI arguments. CLI-provided values win.
///
/// # Errors
///
/// Returns an error when config values are invalid.
pub fn apply_config(
    args: &mut VolleyArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "url")
        && let Some(url) = config.url.clone()
    {
        args.url = Some(url);
    }

    if !is_cli(matches, "requests")
        && let Some(requests) = config.requests
    {
        args.requests = Some(ensure_positive_u64(requests, "requests")?);
    }

    if !is_cli(matches, "concurrency")
        && let Some(concurrency) = config.concurrency
    {
        args.concurrency = Some(ensure_positive_usize(concurrency, "concurrency")?);
    }

    if !is_cli(matches, "timeout")
        && let Some(timeout) = config.timeout.as_deref()
    {
        args.timeout = Some(parse_config_duration(timeout, "timeout")?);
    }

    if !is_cli(matches, "refresh_ms")
        && let Some(refresh_ms) = config.refresh_ms
    {
        args.refresh_ms = ensure_positive_u64(refresh_ms, "refresh_ms")?;
    }

    if !is_cli(matches, "no_ui")
        && let Some(no_ui) = config.no_ui
    {
        args.no_ui = no_ui;
    }

    if !is_cli(matches, "no_color")
        && let Some(no_color) = config.no_color
    {
        args.no_color = no_color;
    }

    if !is_cli(matches, "output")
        && let Some(output) = config.output
    {
        args.output = output;
    }

    if !is_cli(matches, "log_file")
        && let Some(log_file) = config.log_file.clone()
    {
        args.log_file = log_file;
    }

    if !is_cli(matches, "verbose")
        && let Some(verbose) = config.verbose
    {
        args.verbose = verbose;
    }

    Ok(())
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

fn ensure_positive_u64(value: u64, field: &'static str) -> AppResult<PositiveU64> {
    PositiveU64::try_from(value)
        .map_err(|source| AppError::config(ConfigError::FieldMustBePositive { field, source }))
}

fn ensure_positive_usize(value: usize, field: &'static str) -> AppResult<PositiveUsize> {
    PositiveUsize::try_from(value)
        .map_err(|source| AppError::config(ConfigError::FieldMustBePositive { field, source }))
}

fn parse_config_duration(value: &str, field: &'static str) -> AppResult<Duration> {
    duration_from_str(value)
        .map_err(|source| AppError::config(ConfigError::InvalidField { field, source }))
}
