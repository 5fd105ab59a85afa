mod app;
mod args;
mod cancel;
mod config;
mod entry;
mod error;
mod http;
mod logger;
mod progress;
mod runner;
mod session;
#[cfg(test)]
mod test_support;
mod ui;

use error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
