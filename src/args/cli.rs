use clap::Parser;
use std::time::Duration;

use super::defaults::{DEFAULT_LOG_FILE, DEFAULT_REFRESH_MS};
use super::parsers::{parse_duration_arg, parse_positive_u64, parse_positive_usize};
use super::types::{OutputFormat, PositiveU64, PositiveUsize};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Concurrent single-URL GET batcher - fires N requests from a background async runner, tallies status codes and error classes, and reports progress live in the terminal.",
    next_help_heading = "Output Options"
)]
pub struct VolleyArgs {
    /// Target URL for the batch
    #[arg(long, short, help_heading = "Common Options")]
    pub url: Option<String>,

    /// Number of GET requests to fire
    #[arg(
        long,
        short = 'n',
        value_parser = parse_positive_u64,
        help_heading = "Common Options"
    )]
    pub requests: Option<PositiveU64>,

    /// Cap on in-flight requests (default: unbounded fan-out)
    #[arg(
        long,
        short = 'c',
        value_parser = parse_positive_usize,
        help_heading = "Common Options"
    )]
    pub concurrency: Option<PositiveUsize>,

    /// Per-request timeout, e.g. 500ms, 10s, 1m (default: client default, none)
    #[arg(long, value_parser = parse_duration_arg, help_heading = "Common Options")]
    pub timeout: Option<Duration>,

    /// Path to a TOML or JSON config file
    #[arg(long, env = "VOLLEY_CONFIG", help_heading = "Common Options")]
    pub config: Option<String>,

    /// Progress poll cadence in milliseconds
    #[arg(
        long = "refresh-ms",
        default_value = DEFAULT_REFRESH_MS,
        value_parser = parse_positive_u64
    )]
    pub refresh_ms: PositiveU64,

    /// Disable the terminal dashboard and print the report to stdout
    #[arg(long)]
    pub no_ui: bool,

    /// Report format for --no-ui runs
    #[arg(long, default_value = "text", value_enum)]
    pub output: OutputFormat,

    /// Log file path (truncated on every run)
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: String,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable debug-level logging
    #[arg(long, short)]
    pub verbose: bool,
}
