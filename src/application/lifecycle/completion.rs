//! Single-resolution result slot shared by the signal listener and the
//! confirmation consumer.

use std::sync::Mutex;
use tokio::sync::oneshot;

/// Write side of a one-shot result. Only the first `resolve` is delivered.
pub(crate) struct Completion<T> {
    sender: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> Completion<T> {
    pub(crate) fn new() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        let completion = Self {
            sender: Mutex::new(Some(tx)),
        };
        (completion, rx)
    }

    /// Delivers `value` if nothing was delivered before. Returns true when
    /// this call won.
    pub(crate) fn resolve(&self, value: T) -> bool {
        let sender = match self.sender.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match sender {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }
}
