//! Headless run loop: strict progress polling with a stderr indicator.
//!
//! One tick per refresh interval, at most one progress value per tick,
//! progress polling stops once the final percent arrives. The indicator
//! only renders while stderr is a terminal, so piped output stays clean.

use std::io::IsTerminal;
use std::thread;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::args::OutputFormat;
use crate::cancel::{CancelReceiver, cancel_channel};
use crate::error::{AppResult, ValidationError};
use crate::http::dispatch::BatchReport;
use crate::progress::FINAL_PERCENT;
use crate::session::SessionController;

use super::indicator::{ProgressStyle, finish_progress_line, render_progress_line};
use super::summary::{RunSummary, print_summary};

const PROGRESS_BAR_SIZE: usize = 30;
const REPORT_DEADLINE: Duration = Duration::from_secs(5);
const CANCEL_REPORT_DEADLINE: Duration = Duration::from_secs(2);
const REPORT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Drives an already-started batch to its final report on the calling
/// thread. `Ctrl+C` (or SIGTERM) cancels the batch and prints the partial
/// report instead.
pub(crate) fn run_headless(
    session: &mut SessionController,
    handle: &Handle,
    target: &str,
    requested: u64,
    refresh: Duration,
    output: OutputFormat,
    no_color: bool,
) -> AppResult<()> {
    let mut interrupt_rx = spawn_interrupt_watcher(handle);
    let style = ProgressStyle::new(PROGRESS_BAR_SIZE);
    let show_progress = std::io::stderr().is_terminal();
    let run_start = Instant::now();
    let mut percent = 0u8;

    let report = loop {
        if interrupted(&mut interrupt_rx) {
            return finish_cancelled(session, target, requested, output, show_progress);
        }
        thread::sleep(refresh);
        if let Some(value) = session.try_progress() {
            percent = value;
            if show_progress {
                render_progress_line(&style, percent, run_start.elapsed().as_millis(), no_color)?;
            }
        }
        if percent >= FINAL_PERCENT {
            break wait_for_report(session)?;
        }
        // The dispatcher queues the final percent before the end message,
        // so an end observed here only means progress values were dropped.
        if let Some(report) = session.try_complete() {
            break report;
        }
        if !session.is_running() {
            return Err(ValidationError::MissingFinalReport.into());
        }
    };

    if show_progress {
        render_progress_line(
            &style,
            FINAL_PERCENT,
            run_start.elapsed().as_millis(),
            no_color,
        )?;
        finish_progress_line()?;
    }

    let summary = RunSummary::from_report(target, requested, false, &report);
    print_summary(&summary, output)
}

fn wait_for_report(session: &mut SessionController) -> AppResult<BatchReport> {
    let deadline = Instant::now().checked_add(REPORT_DEADLINE);
    loop {
        if let Some(report) = session.try_complete() {
            return Ok(report);
        }
        if !session.is_running() {
            return Err(ValidationError::MissingFinalReport.into());
        }
        if deadline.map_or(true, |end| Instant::now() >= end) {
            return Err(ValidationError::MissingFinalReport.into());
        }
        thread::sleep(REPORT_POLL_INTERVAL);
    }
}

fn finish_cancelled(
    session: &mut SessionController,
    target: &str,
    requested: u64,
    output: OutputFormat,
    show_progress: bool,
) -> AppResult<()> {
    if show_progress {
        finish_progress_line()?;
    }
    info!("interrupt received; cancelling the running batch");
    let report = session
        .cancel()
        .and_then(|mut cancelled| cancelled.wait_report(CANCEL_REPORT_DEADLINE));
    match report {
        Some(report) => {
            let summary = RunSummary::from_report(target, requested, true, &report);
            print_summary(&summary, output)
        }
        None => {
            warn!("no partial report arrived before shutdown");
            eprintln!("Cancelled; partial results were not available in time.");
            Ok(())
        }
    }
}

fn interrupted(interrupt_rx: &mut CancelReceiver) -> bool {
    match interrupt_rx.try_recv() {
        Ok(()) | Err(broadcast::error::TryRecvError::Lagged(_)) => true,
        Err(broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed) => {
            false
        }
    }
}

fn spawn_interrupt_watcher(handle: &Handle) -> CancelReceiver {
    let (interrupt_tx, interrupt_rx) = cancel_channel();
    drop(handle.spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut term_signal = match signal(SignalKind::terminate()) {
                Ok(term) => Some(term),
                Err(err) => {
                    eprintln!("Failed to register SIGTERM handler: {}", err);
                    None
                }
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                () = async {
                    if let Some(term) = term_signal.as_mut() {
                        term.recv().await;
                    } else {
                        std::future::pending::<()>().await;
                    }
                } => {}
            }
            drop(interrupt_tx.send(()));
        }

        #[cfg(not(unix))]
        {
            if tokio::signal::ctrl_c().await.is_ok() {
                drop(interrupt_tx.send(()));
            }
        }
    }));
    interrupt_rx
}
