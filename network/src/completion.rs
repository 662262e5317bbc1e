//! Single-shot result delivery.

use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;

/// Delivers at most one value to a [`oneshot::Receiver`].
///
/// Whichever of [`complete`](Self::complete) or [`cancel`](Self::cancel)
/// runs first wins; every later call is a no-op and returns `false`.
#[derive(Debug)]
pub struct Completion<T> {
    sender: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> Completion<T> {
    pub fn new() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                sender: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    pub fn complete(&self, value: T) -> bool {
        match self.take() {
            Some(sender) => {
                // A dropped receiver still counts as delivered.
                let _ = sender.send(value);
                true
            }
            None => false,
        }
    }

    /// Finish without a value; the receiver observes a closed channel.
    pub fn cancel(&self) -> bool {
        self.take().is_some()
    }

    pub fn is_done(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn take(&self) -> Option<oneshot::Sender<T>> {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
