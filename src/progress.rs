//! Percent-progress bridge between the runner thread and the main thread.
use tokio::sync::mpsc;

const PERCENT_STEPS: u64 = 100;
pub(crate) const FINAL_PERCENT: u8 = 100;

pub(crate) struct ProgressSender(mpsc::UnboundedSender<u8>);

pub(crate) struct ProgressReceiver(mpsc::UnboundedReceiver<u8>);

/// One bridge per session. The trigger policy bounds traffic to roughly one
/// value per percent step, so unbounded buffering is safe.
pub(crate) fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSender(tx), ProgressReceiver(rx))
}

impl ProgressSender {
    /// Non-blocking; a dropped receiver just discards the value.
    pub(crate) fn push(&self, percent: u8) {
        drop(self.0.send(percent));
    }
}

impl ProgressReceiver {
    pub(crate) fn try_pop(&mut self) -> Option<u8> {
        self.0.try_recv().ok()
    }
}

/// Decides when the aggregation loop reports progress.
///
/// The step clamps to 1 so small batches (total < 100) still report on
/// every completion instead of never.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ProgressTracker {
    total: u64,
    step: u64,
}

impl ProgressTracker {
    pub(crate) fn new(total: u64) -> Self {
        let step = total.checked_div(PERCENT_STEPS).unwrap_or(0).max(1);
        Self { total, step }
    }

    /// True when `completed` crosses a percent-step boundary or finishes
    /// the batch.
    pub(crate) fn should_emit(&self, completed: u64) -> bool {
        completed == self.total || completed.checked_rem(self.step) == Some(0)
    }

    /// Floored percent, always 100 at completion.
    #[must_use]
    pub(crate) fn percent(&self, completed: u64) -> u8 {
        let scaled = completed
            .saturating_mul(PERCENT_STEPS)
            .checked_div(self.total)
            .unwrap_or(0)
            .min(u64::from(FINAL_PERCENT));
        u8::try_from(scaled).unwrap_or(FINAL_PERCENT)
    }
}
