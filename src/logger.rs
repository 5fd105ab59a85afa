use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::error::AppResult;

/// Installs the global log subscriber, writing to `path`.
///
/// The file is truncated on every run. Output goes to a file rather than
/// stderr because the terminal dashboard owns the screen.
///
/// # Errors
///
/// Returns an error when the log file cannot be created.
pub fn init_logging(verbose: bool, path: &Path) -> AppResult<()> {
    let log_file = File::create(path)?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter_from_env(verbose))
        .with_writer(Mutex::new(log_file))
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .finish();

    // A second init keeps the first subscriber.
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("log subscriber already installed");
    }

    Ok(())
}

// VOLLEY_LOG wins over RUST_LOG; --verbose only raises the fallback level.
fn filter_from_env(verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "info" };
    match std::env::var("VOLLEY_LOG").or_else(|_| std::env::var("RUST_LOG")) {
        Ok(value) => EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new(fallback)),
        Err(_) => EnvFilter::new(fallback),
    }
}
