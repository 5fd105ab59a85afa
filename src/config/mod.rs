//! Config file discovery, parsing, and merging into the parsed CLI args.

use std::fs;
use std::path::Path;

use crate::error::{AppResult, ConfigError};

pub(crate) mod apply;
pub mod types;


pub use apply::apply_config;

use types::ConfigFile;

/// File names probed in the working directory when no explicit path is given.
const DEFAULT_CONFIG_FILES: [&str; 2] = ["volley.toml", "volley.json"];

/// True when one of the default config files exists in the working directory.
pub(crate) fn default_config_present() -> bool {
    DEFAULT_CONFIG_FILES
        .iter()
        .any(|name| Path::new(name).exists())
}

/// Loads the config from `path`, or probes the default locations when absent.
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> AppResult<Option<ConfigFile>> {
    if let Some(path) = path {
        return Ok(Some(load_config_file(Path::new(path))?));
    }
    for name in DEFAULT_CONFIG_FILES {
        let candidate = Path::new(name);
        if candidate.exists() {
            return Ok(Some(load_config_file(candidate)?));
        }
    }
    Ok(None)
}

fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let format = Format::for_path(path)?;
    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    match format {
        Format::Toml => toml::from_str(&content).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        }),
        Format::Json => serde_json::from_str(&content).map_err(|source| ConfigError::ParseJson {
            path: path.to_path_buf(),
            source,
        }),
    }
}

enum Format {
    Toml,
    Json,
}

impl Format {
    fn for_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            Some(ext) => Err(ConfigError::UnsupportedExtension {
                ext: ext.to_owned(),
            }),
            None => Err(ConfigError::MissingExtension),
        }
    }
}
