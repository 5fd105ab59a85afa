use tokio::sync::broadcast;

pub(crate) type CancelSender = broadcast::Sender<()>;
pub(crate) type CancelReceiver = broadcast::Receiver<()>;

const CANCEL_CHANNEL_CAPACITY: usize = 1;

/// One cancel channel per batch. Cancellation is cooperative: the batch
/// observes the signal at its next loop turn, nothing is interrupted
/// mid-request by the sender itself.
pub(crate) fn cancel_channel() -> (CancelSender, CancelReceiver) {
    broadcast::channel(CANCEL_CHANNEL_CAPACITY)
}
