//! Cooperative cancellation (`please_stop`): sleeps between worker
//! iterations are interruptible, and each iteration re-checks the
//! signal before acquiring the working mutex.

use std::time::Duration;

use crossbeam_channel::{bounded, select, Receiver, Sender};

/// Held by the owner of a worker fleet. Dropping it (or calling
/// [`StopHandle::stop`] explicitly) closes the shared channel, which
/// every [`StopSignal`] clone observes immediately, including mid-sleep.
pub struct StopHandle {
    _tx: Sender<()>,
}

impl StopHandle {
    pub fn stop(self) {
        // Dropping `_tx` closes the channel; every StopSignal clone's
        // `recv()` then resolves immediately.
    }
}

#[derive(Clone)]
pub struct StopSignal {
    rx: Receiver<()>,
}

/// Construct a linked (handle, signal) pair. Clone the signal once per
/// worker thread.
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = bounded(0);
    (StopHandle { _tx: tx }, StopSignal { rx })
}

impl StopSignal {
    pub fn is_stopped(&self) -> bool {
        matches!(self.rx.try_recv(), Err(crossbeam_channel::TryRecvError::Disconnected))
    }

    /// Sleep for `duration`, waking early if stop is signalled.
    /// Returns `true` if the sleep was interrupted by a stop request.
    pub fn sleep(&self, duration: Duration) -> bool {
        select! {
            recv(self.rx) -> _ => true,
            default(duration) => false,
        }
    }
}
