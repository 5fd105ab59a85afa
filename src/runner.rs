use std::sync::mpsc;
use std::thread;

use tokio::runtime::{Builder, Handle};
use tracing::debug;

use crate::error::{AppError, AppResult, ValidationError};

/// Dedicated thread hosting the async event loop all HTTP work runs on.
///
/// The loop lives for the rest of the process and the thread is detached,
/// so process exit never waits on it. A failing task is contained by the
/// runtime; the loop itself keeps running.
pub(crate) struct BackgroundRunner {
    handle: Handle,
}

impl BackgroundRunner {
    /// Spawns the runner thread and blocks until its event loop is live.
    ///
    /// # Errors
    ///
    /// Returns an error when the thread cannot be spawned or the runtime
    /// cannot be built.
    pub(crate) fn start() -> AppResult<Self> {
        let (handle_tx, handle_rx) = mpsc::channel();

        thread::Builder::new()
            .name("volley-runner".to_owned())
            .spawn(move || {
                let runtime = match Builder::new_current_thread().enable_all().build() {
                    Ok(runtime) => runtime,
                    Err(err) => {
                        drop(handle_tx.send(Err(err)));
                        return;
                    }
                };
                drop(handle_tx.send(Ok(runtime.handle().clone())));
                runtime.block_on(std::future::pending::<()>());
            })?;

        let outcome = handle_rx.recv().map_err(|err| {
            debug!("runner handshake failed: {}", err);
            AppError::validation(ValidationError::RunnerUnavailable)
        })?;
        let handle = outcome.map_err(|err| {
            AppError::validation(ValidationError::RuntimeBuildFailed { source: err })
        })?;

        debug!("background runner started");
        Ok(Self { handle })
    }

    pub(crate) const fn handle(&self) -> &Handle {
        &self.handle
    }
}
