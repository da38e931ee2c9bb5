use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Work that runs once after a delay unless cancelled first.
///
/// Dropping the task cancels it.
pub struct ScheduledTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    pub fn schedule<F>(delay: Duration, work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => work.await,
            }
        });

        Self { cancel, handle }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once the work ran or the cancellation was observed.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Collapses bursts of values into one commit carrying the last value.
///
/// A commit is sent on `sink` once `window` passes without another
/// [`notify`](Debouncer::notify).
pub struct Debouncer<T> {
    window: Duration,
    sink: mpsc::UnboundedSender<T>,
    pending: Option<ScheduledTask>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(window: Duration, sink: mpsc::UnboundedSender<T>) -> Self {
        Self {
            window,
            sink,
            pending: None,
        }
    }

    pub fn notify(&mut self, value: T) {
        self.cancel();

        let sink = self.sink.clone();
        self.pending = Some(ScheduledTask::schedule(self.window, async move {
            // The receiver is gone only when the console is shutting down.
            let _ = sink.send(value);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.cancel();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }
}
