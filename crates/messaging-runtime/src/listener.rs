//! Cancellation handle for listener loops.

use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;

/// State machine guarding a single listener loop per queue instance.
///
/// Transitions are `Idle -> Running -> Stopping -> Idle`. [Listener::start]
/// performs the first transition and hands the loop a [watch::Receiver] to
/// select on; [Listener::stop] performs the rest by signalling the channel
/// and releasing the slot, so the loop wakes promptly even while blocked
/// waiting for a message. Stopping is not awaited: a loop that is mid
/// callback observes the signal once the callback returns.
pub struct Listener {
    stop: Mutex<Option<watch::Sender<bool>>>,
}

impl Listener {
    pub fn new() -> Self {
        Self {
            stop: Mutex::new(None),
        }
    }

    /// Transition to Running and return the cancellation signal for the
    /// loop to watch.
    ///
    /// Returns `None` when a loop is already running; the caller must not
    /// start a second one.
    pub fn start(&self) -> Option<watch::Receiver<bool>> {
        let mut slot = self.stop.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|sender| !sender.is_closed()) {
            return None;
        }

        let (sender, receiver) = watch::channel(false);
        *slot = Some(sender);
        Some(receiver)
    }

    /// Signal cancellation and release the running slot.
    ///
    /// Safe to call when no loop is running.
    pub fn stop(&self) {
        let sender = self
            .stop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sender) = sender {
            // Receiver may already be gone; either way the slot is free.
            let _ = sender.send(true);
        }
    }

    /// Whether a loop currently holds the running slot
    pub fn is_running(&self) -> bool {
        self.stop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|sender| !sender.is_closed())
    }
}

impl Default for Listener {
    fn default() -> Self {
        Self::new()
    }
}
