//! Process entry: argument parsing, config merge, and mode dispatch.

use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tracing::info;

use crate::args::VolleyArgs;
use crate::error::{AppResult, ValidationError};
use crate::runner::BackgroundRunner;
use crate::session::{SessionController, SessionOptions};
use crate::{app, config, logger, ui};

pub(crate) fn run() -> AppResult<()> {
    let (mut args, matches) = match parse_args()? {
        Some(parsed) => parsed,
        None => return Ok(()),
    };

    if let Some(file) = config::load_config(args.config.as_deref())? {
        config::apply_config(&mut args, &matches, &file)?;
    }

    let target = args.url.clone().ok_or(ValidationError::MissingUrl)?;
    let requested = args.requests.ok_or(ValidationError::MissingRequests)?;

    logger::init_logging(args.verbose, Path::new(&args.log_file))?;
    info!(
        url = %target,
        requests = requested.get(),
        concurrency = ?args.concurrency,
        timeout = ?args.timeout,
        "starting run"
    );

    let runner = BackgroundRunner::start()?;
    let options = SessionOptions {
        concurrency: args.concurrency,
        timeout: args.timeout,
    };
    let mut session = SessionController::new(runner.handle().clone(), options);
    session.start(&target, requested.get())?;

    let refresh = Duration::from_millis(args.refresh_ms.get());
    if args.no_ui {
        app::run_headless(
            &mut session,
            runner.handle(),
            &target,
            requested.get(),
            refresh,
            args.output,
            args.no_color,
        )
    } else {
        ui::run_ui(
            &mut session,
            &target,
            requested.get(),
            refresh,
            args.no_color,
        )
    }
}

// A bare invocation prints help instead of failing on the missing URL,
// unless a default config file can supply the run settings.
fn parse_args() -> AppResult<Option<(VolleyArgs, ArgMatches)>> {
    let raw: Vec<OsString> = std::env::args_os().collect();
    let mut cmd = VolleyArgs::command();

    if bare_invocation(&raw) && !config::default_config_present() {
        cmd.print_help()?;
        println!();
        return Ok(None);
    }

    let matches = cmd.get_matches_from(raw);
    let args = VolleyArgs::from_arg_matches(&matches)?;
    Ok(Some((args, matches)))
}

fn bare_invocation(raw: &[OsString]) -> bool {
    match raw {
        [] | [_] => true,
        [_, second] => second == "--",
        _ => false,
    }
}
