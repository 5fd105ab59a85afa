use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use reqwest::{Client, Response};
use tokio::runtime::Handle;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::args::{DEFAULT_USER_AGENT, PositiveU64, PositiveUsize};
use crate::cancel::{CancelReceiver, CancelSender, cancel_channel};
use crate::error::{AppError, AppResult};
use crate::progress::{ProgressSender, ProgressTracker};

use super::outcome::{FailureKind, Outcome, Tally};

const OUTCOME_CHANNEL_CAPACITY: usize = 10_000;
const END_CHANNEL_CAPACITY: usize = 1;

/// Everything one batch needs to run.
#[derive(Debug, Clone)]
pub(crate) struct BatchSpec {
    pub(crate) url: Url,
    pub(crate) total: PositiveU64,
    pub(crate) concurrency: Option<PositiveUsize>,
}

/// Aggregate state of a batch when it stopped accepting outcomes.
#[derive(Debug, Clone)]
pub(crate) struct BatchReport {
    pub(crate) tally: Tally,
    pub(crate) completed: u64,
    pub(crate) elapsed: Duration,
}

/// Terminal message of a batch, sent exactly once per batch.
#[derive(Debug)]
pub(crate) enum BatchEnd {
    Completed(BatchReport),
    Cancelled(BatchReport),
}

pub(crate) type EndSender = mpsc::Sender<BatchEnd>;
pub(crate) type EndReceiver = mpsc::Receiver<BatchEnd>;

pub(crate) fn end_channel() -> (EndSender, EndReceiver) {
    mpsc::channel(END_CHANNEL_CAPACITY)
}

/// Requests cooperative cancellation of one running batch.
pub(crate) struct BatchHandle {
    cancel_tx: CancelSender,
}

impl BatchHandle {
    pub(crate) fn cancel(&self) {
        drop(self.cancel_tx.send(()));
    }
}

/// Builds the shared client used by every request of a batch.
///
/// # Errors
///
/// Returns an error when the underlying TLS/connector setup fails.
pub(crate) fn build_client(timeout: Option<Duration>) -> AppResult<Client> {
    let mut builder = Client::builder().user_agent(DEFAULT_USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(AppError::from)
}

/// Submits the batch future to the runner loop and hands back its cancel
/// handle. The batch itself reports through `progress_tx` and `end_tx`.
pub(crate) fn spawn_batch(
    handle: &Handle,
    client: Client,
    spec: BatchSpec,
    progress_tx: ProgressSender,
    end_tx: EndSender,
) -> BatchHandle {
    let (cancel_tx, cancel_rx) = cancel_channel();
    drop(handle.spawn(run_batch(client, spec, progress_tx, end_tx, cancel_rx)));
    BatchHandle { cancel_tx }
}

/// Fans out `total` requests, aggregates outcomes serially, and sends the
/// terminal report. Never returns an error: per-request failures become
/// outcomes, and a failing batch is still a completed batch.
async fn run_batch(
    client: Client,
    spec: BatchSpec,
    progress_tx: ProgressSender,
    end_tx: EndSender,
    mut cancel_rx: CancelReceiver,
) {
    let started = Instant::now();
    let total = spec.total.get();
    info!(url = %spec.url, total, "batch started");

    let (outcome_tx, mut outcome_rx) = mpsc::channel::<Outcome>(OUTCOME_CHANNEL_CAPACITY);
    let limiter = spec
        .concurrency
        .map(|cap| Arc::new(Semaphore::new(cap.get())));

    let mut requests = JoinSet::new();
    for _ in 0..total {
        let client = client.clone();
        let url = spec.url.clone();
        let outcome_tx = outcome_tx.clone();
        let limiter = limiter.clone();
        requests.spawn(async move {
            let _permit = match limiter {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            let outcome = send_request(&client, url).await;
            drop(outcome_tx.send(outcome).await);
        });
    }
    drop(outcome_tx);

    let tracker = ProgressTracker::new(total);
    let mut tally = Tally::default();
    let mut completed: u64 = 0;

    let cancelled = loop {
        tokio::select! {
            _ = cancel_rx.recv() => break true,
            received = outcome_rx.recv() => match received {
                Some(outcome) => {
                    completed = completed.saturating_add(1);
                    tally.record(outcome);
                    if tracker.should_emit(completed) {
                        let percent = tracker.percent(completed);
                        info!(completed, total, percent, "batch progress");
                        progress_tx.push(percent);
                    }
                    if completed == total {
                        break false;
                    }
                }
                None => break false,
            },
        }
    };

    if cancelled {
        requests.abort_all();
        while requests.join_next().await.is_some() {}
        // Requests that finished before the abort landed keep their
        // outcomes; everything still in flight is abandoned.
        while let Ok(outcome) = outcome_rx.try_recv() {
            completed = completed.saturating_add(1);
            tally.record(outcome);
        }
        let report = BatchReport {
            tally,
            completed,
            elapsed: started.elapsed(),
        };
        warn!(completed, total, "batch cancelled");
        drop(end_tx.send(BatchEnd::Cancelled(report)).await);
        return;
    }

    while requests.join_next().await.is_some() {}
    if completed != total {
        warn!(completed, total, "batch ended early; some outcomes were lost");
    }
    let elapsed = started.elapsed();
    let report = BatchReport {
        tally,
        completed,
        elapsed,
    };
    info!(
        completed,
        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        tally = %report.tally,
        "batch finished"
    );
    drop(end_tx.send(BatchEnd::Completed(report)).await);
}

async fn send_request(client: &Client, url: Url) -> Outcome {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            // The response headers already decide the outcome; the body is
            // drained for connection reuse, never inspected.
            if let Err(err) = drain_response_body(response).await {
                debug!("Failed to drain response body: {}", err);
            }
            Outcome::Status(status)
        }
        Err(err) => {
            let kind = FailureKind::classify(&err);
            error!("Request failed ({}): {}", kind, err);
            Outcome::Failed(kind)
        }
    }
}

async fn drain_response_body(response: Response) -> Result<(), reqwest::Error> {
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        drop(chunk?);
    }
    Ok(())
}
