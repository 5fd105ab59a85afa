//! Error types shared across the binary.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error for the binary. Every failure that can stop a run
/// funnels into this type so `main` has a single exit path.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("Argument error: {0}")]
    Clap(#[from] clap::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation<E: Into<ValidationError>>(error: E) -> Self {
        Self::Validation(error.into())
    }

    pub fn config<E: Into<ConfigError>>(error: E) -> Self {
        Self::Config(error.into())
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("No target URL. Pass --url or set one in a config file.")]
    MissingUrl,
    #[error("No request count. Pass --requests or set one in a config file.")]
    MissingRequests,
    #[error("Invalid URL '{value}': {source}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("URL '{value}' has no host.")]
    UrlMissingHost { value: String },
    #[error("Unsupported URL scheme '{scheme}'. Only http and https are supported.")]
    UnsupportedScheme { scheme: String },
    #[error("Value must be at least {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Not a valid number: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Invalid duration '{value}'. Use forms like 250ms, 10s, 2m, 1h.")]
    InvalidDuration { value: String },
    #[error("Duration '{value}' is too large.")]
    DurationOverflow { value: String },
    #[error("Duration must be greater than zero.")]
    DurationZero,
    #[error("Failed to build the async runtime: {source}")]
    RuntimeBuildFailed {
        #[source]
        source: std::io::Error,
    },
    #[error("Runner thread exited before handing back a runtime handle.")]
    RunnerUnavailable,
    #[error("Run finished without delivering a final report.")]
    MissingFinalReport,
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid TOML in '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid JSON in '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Config files must end in .toml or .json, got '.{ext}'")]
    UnsupportedExtension { ext: String },
    #[error("Config files must end in .toml or .json")]
    MissingExtension,
    #[error("Config field '{field}' must be at least 1")]
    FieldMustBePositive {
        field: &'static str,
        #[source]
        source: ValidationError,
    },
    #[error("Config field '{field}': {source}")]
    InvalidField {
        field: &'static str,
        #[source]
        source: ValidationError,
    },
}
