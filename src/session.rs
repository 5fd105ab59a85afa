//! Single-batch session state machine between the surfaces and the
//! dispatcher.
//!
//! The controller owns at most one live batch. Surfaces poll it instead of
//! holding channel ends themselves, which keeps the start/cancel/report
//! lifecycle in one place.

use std::thread;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, warn};
use url::Url;

use crate::args::{PositiveU64, PositiveUsize};
use crate::error::{AppResult, ValidationError};
use crate::http::dispatch::{
    BatchEnd, BatchHandle, BatchReport, BatchSpec, EndReceiver, build_client, end_channel,
    spawn_batch,
};
use crate::progress::{ProgressReceiver, progress_channel};

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Knobs that apply to every batch the controller launches.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SessionOptions {
    pub(crate) concurrency: Option<PositiveUsize>,
    pub(crate) timeout: Option<Duration>,
}

pub(crate) struct SessionController {
    handle: Handle,
    options: SessionOptions,
    state: SessionState,
}

enum SessionState {
    Idle,
    Running(ActiveBatch),
}

struct ActiveBatch {
    batch: BatchHandle,
    progress_rx: ProgressReceiver,
    end_rx: EndReceiver,
}

impl SessionController {
    pub(crate) const fn new(handle: Handle, options: SessionOptions) -> Self {
        Self {
            handle,
            options,
            state: SessionState::Idle,
        }
    }

    /// Validates the target and submits a new batch to the runner.
    ///
    /// A second `start` while a batch is running is a no-op; the original's
    /// submit control was disabled mid-run and this keeps that contract.
    pub(crate) fn start(&mut self, url: &str, total: u64) -> AppResult<()> {
        if let SessionState::Running(_) = self.state {
            warn!("start ignored; a batch is already running");
            return Ok(());
        }

        let spec = self.batch_spec(url, total)?;
        let client = build_client(self.options.timeout)?;
        let (progress_tx, progress_rx) = progress_channel();
        let (end_tx, end_rx) = end_channel();
        let batch = spawn_batch(&self.handle, client, spec, progress_tx, end_tx);
        self.state = SessionState::Running(ActiveBatch {
            batch,
            progress_rx,
            end_rx,
        });
        Ok(())
    }

    fn batch_spec(&self, url: &str, total: u64) -> AppResult<BatchSpec> {
        let total = PositiveU64::try_from(total)?;
        let parsed = Url::parse(url).map_err(|source| ValidationError::InvalidUrl {
            value: url.to_owned(),
            source,
        })?;
        if parsed.host_str().is_none() {
            return Err(ValidationError::UrlMissingHost {
                value: url.to_owned(),
            }
            .into());
        }
        let scheme = parsed.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(ValidationError::UnsupportedScheme {
                scheme: scheme.to_owned(),
            }
            .into());
        }
        Ok(BatchSpec {
            url: parsed,
            total,
            concurrency: self.options.concurrency,
        })
    }

    /// Drains at most one buffered progress value.
    pub(crate) fn try_progress(&mut self) -> Option<u8> {
        match &mut self.state {
            SessionState::Running(active) => active.progress_rx.try_pop(),
            SessionState::Idle => None,
        }
    }

    /// Non-blocking completion poll. Yields the final report exactly once
    /// and returns the controller to idle.
    pub(crate) fn try_complete(&mut self) -> Option<BatchReport> {
        let polled = match &mut self.state {
            SessionState::Idle => return None,
            SessionState::Running(active) => active.end_rx.try_recv(),
        };
        match polled {
            Ok(BatchEnd::Completed(report)) => {
                self.state = SessionState::Idle;
                Some(report)
            }
            Ok(BatchEnd::Cancelled(report)) => {
                // Only `cancel` sends the signal, and it leaves the running
                // state first; a cancelled end here bypassed the state
                // machine and is dropped.
                debug!(completed = report.completed, "discarding stray cancelled end");
                self.state = SessionState::Idle;
                None
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                warn!("batch task ended without sending a report");
                self.state = SessionState::Idle;
                None
            }
        }
    }

    /// Signals the running batch to stop and returns to idle immediately.
    ///
    /// In-flight requests unwind in the background; the partial report is
    /// polled from the returned handle. `None` when no batch is running.
    pub(crate) fn cancel(&mut self) -> Option<CancelledBatch> {
        match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Idle => None,
            SessionState::Running(active) => {
                active.batch.cancel();
                Some(CancelledBatch {
                    end_rx: active.end_rx,
                })
            }
        }
    }

    pub(crate) const fn is_running(&self) -> bool {
        matches!(self.state, SessionState::Running(_))
    }
}

/// Receiver side of a batch that was told to stop. The dispatcher still
/// owns the abort/drain sequence; the partial report lands here once the
/// remaining tasks have unwound.
pub(crate) struct CancelledBatch {
    end_rx: EndReceiver,
}

impl CancelledBatch {
    /// Non-blocking poll for the partial report. A batch that finished
    /// before the signal landed reports through the same channel and counts
    /// as the final partial state.
    pub(crate) fn try_report(&mut self) -> Option<BatchReport> {
        match self.end_rx.try_recv() {
            Ok(BatchEnd::Completed(report) | BatchEnd::Cancelled(report)) => Some(report),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Polls for the partial report until `deadline` passes. Runs on
    /// synchronous shutdown paths, so it sleeps between polls instead of
    /// awaiting.
    pub(crate) fn wait_report(&mut self, deadline: Duration) -> Option<BatchReport> {
        let end = Instant::now().checked_add(deadline)?;
        loop {
            if let Some(report) = self.try_report() {
                return Some(report);
            }
            if Instant::now() >= end {
                return None;
            }
            thread::sleep(WAIT_POLL_INTERVAL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionController, SessionOptions};
    use crate::http::dispatch::BatchReport;
    use crate::runner::BackgroundRunner;
    use crate::test_support::spawn_test_server;
    use std::thread;
    use std::time::{Duration, Instant};

    fn controller(timeout: Option<Duration>) -> Result<SessionController, String> {
        let runner = BackgroundRunner::start().map_err(|err| format!("runner failed: {}", err))?;
        Ok(SessionController::new(
            runner.handle().clone(),
            SessionOptions {
                concurrency: None,
                timeout,
            },
        ))
    }

    fn poll_report(
        session: &mut SessionController,
        deadline: Duration,
    ) -> Result<BatchReport, String> {
        let end = Instant::now()
            .checked_add(deadline)
            .ok_or_else(|| "deadline overflow".to_owned())?;
        loop {
            if let Some(report) = session.try_complete() {
                return Ok(report);
            }
            if Instant::now() >= end {
                return Err("Timed out waiting for the report".to_owned());
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn start_rejects_invalid_targets() -> Result<(), String> {
        let mut session = controller(None)?;
        if session.start("", 5).is_ok() {
            return Err("Empty URL must be rejected".to_owned());
        }
        if session.start("http://example.com/", 0).is_ok() {
            return Err("Zero requests must be rejected".to_owned());
        }
        if session.start("ftp://example.com/", 5).is_ok() {
            return Err("Non-http scheme must be rejected".to_owned());
        }
        if session.start("mailto:user@example.com", 5).is_ok() {
            return Err("URL without a host must be rejected".to_owned());
        }
        if session.is_running() {
            return Err("Rejected starts must stay idle".to_owned());
        }
        Ok(())
    }

    #[test]
    fn cancel_when_idle_is_a_noop() -> Result<(), String> {
        let mut session = controller(None)?;
        if session.cancel().is_some() {
            return Err("Idle cancel must return nothing".to_owned());
        }
        if session.try_progress().is_some() {
            return Err("Idle session has no progress".to_owned());
        }
        if session.try_complete().is_some() {
            return Err("Idle session has no report".to_owned());
        }
        Ok(())
    }

    #[test]
    fn completed_batch_reports_exactly_once() -> Result<(), String> {
        let base = spawn_test_server(200, None)?;
        let mut session = controller(None)?;
        session
            .start(&base, 8)
            .map_err(|err| format!("start failed: {}", err))?;
        if !session.is_running() {
            return Err("Expected a running session".to_owned());
        }

        let report = poll_report(&mut session, Duration::from_secs(10))?;
        if report.completed != 8 {
            return Err(format!("Expected 8 completed, got {}", report.completed));
        }
        if session.is_running() {
            return Err("Completion must return the session to idle".to_owned());
        }
        if session.try_complete().is_some() {
            return Err("The report must only be yielded once".to_owned());
        }
        Ok(())
    }

    #[test]
    fn second_start_keeps_first_batch() -> Result<(), String> {
        // Respond to nothing so the first batch is still running when the
        // second start lands.
        let base = spawn_test_server(200, Some(0))?;
        let mut session = controller(Some(Duration::from_secs(30)))?;
        session
            .start(&base, 3)
            .map_err(|err| format!("start failed: {}", err))?;
        session
            .start(&base, 3)
            .map_err(|err| format!("start while running must stay a no-op: {}", err))?;
        if !session.is_running() {
            return Err("Expected the first batch to keep running".to_owned());
        }

        let mut cancelled = session
            .cancel()
            .ok_or_else(|| "Expected a cancel handle".to_owned())?;
        if session.is_running() {
            return Err("Cancel must return to idle immediately".to_owned());
        }
        let report = cancelled
            .wait_report(Duration::from_secs(5))
            .ok_or_else(|| "Expected a partial report".to_owned())?;
        if report.completed != 0 {
            return Err(format!(
                "Expected no completed requests, got {}",
                report.completed
            ));
        }
        Ok(())
    }

    #[test]
    fn cancel_after_completion_returns_the_full_report() -> Result<(), String> {
        let base = spawn_test_server(200, None)?;
        let mut session = controller(None)?;
        session
            .start(&base, 6)
            .map_err(|err| format!("start failed: {}", err))?;

        // Drain progress to the final value but never poll completion,
        // leaving the finished batch in the running state when cancel lands.
        let end = Instant::now()
            .checked_add(Duration::from_secs(10))
            .ok_or_else(|| "deadline overflow".to_owned())?;
        loop {
            match session.try_progress() {
                Some(100) => break,
                Some(_) => {}
                None => {
                    if Instant::now() >= end {
                        return Err("Timed out waiting for final progress".to_owned());
                    }
                    thread::sleep(Duration::from_millis(10));
                }
            }
        }
        if !session.is_running() {
            return Err("Progress alone must not settle the session".to_owned());
        }

        let mut cancelled = session
            .cancel()
            .ok_or_else(|| "Expected a cancel handle".to_owned())?;
        if session.is_running() {
            return Err("Cancel must return to idle immediately".to_owned());
        }
        let report = cancelled
            .wait_report(Duration::from_secs(5))
            .ok_or_else(|| "Expected the finished report".to_owned())?;
        if report.completed != 6 {
            return Err(format!("Expected 6 completed, got {}", report.completed));
        }
        if report.tally.total() != 6 {
            return Err("Expected every outcome in the tally".to_owned());
        }
        Ok(())
    }
}
