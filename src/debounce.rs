//! Coalesces bursts of updates into one emission

use std::time::Duration;

use tap::TapFallible;
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};

/// Emits only the last of a burst of values, once no new value has arrived for `delay`.
///
/// Values are delivered on the channel given at construction. A pending
/// emission is cancelled by a newer [`push`](Debouncer::push), replaced by
/// [`flush`](Debouncer::flush), and dropped along with the debouncer.
/// Requires a running tokio runtime.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    sink: UnboundedSender<T>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub const fn new(delay: Duration, sink: UnboundedSender<T>) -> Debouncer<T> {
        Debouncer {
            delay,
            sink,
            pending: None,
        }
    }

    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules `value`, replacing whatever was waiting
    pub fn push(&mut self, value: T) {
        self.cancel();
        let sink = self.sink.clone();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sink
                .send(value)
                .tap_err(|_| tracing::debug!("debounced value dropped, receiver is gone"));
        }));
    }

    /// Emits `value` now and discards anything waiting
    pub fn flush(&mut self, value: T) {
        self.cancel();
        let _ = self
            .sink
            .send(value)
            .tap_err(|_| tracing::debug!("flushed value dropped, receiver is gone"));
    }

    /// Discards the waiting value, if any
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}
