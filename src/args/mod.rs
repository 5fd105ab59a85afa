//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;


pub use cli::VolleyArgs;
pub use types::{OutputFormat, PositiveU64, PositiveUsize};

pub(crate) use defaults::{DEFAULT_LOG_FILE, DEFAULT_USER_AGENT};
