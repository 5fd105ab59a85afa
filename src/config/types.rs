use serde::Deserialize;

use crate::args::OutputFormat;

/// On-disk run settings. Every field is optional; CLI flags take precedence
/// over values found here, and unknown keys are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub url: Option<String>,
    pub requests: Option<u64>,
    pub concurrency: Option<usize>,
    pub timeout: Option<String>,
    pub refresh_ms: Option<u64>,
    pub no_ui: Option<bool>,
    pub no_color: Option<bool>,
    pub output: Option<OutputFormat>,
    pub log_file: Option<String>,
    pub verbose: Option<bool>,
}
