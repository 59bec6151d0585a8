// src/cancel.rs
// Caller-side cancellation for a query and every probe it dispatches.
use tokio::sync::watch;

/// Owning side. Cancels on `cancel()` or when dropped.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Observing side, cloned into each probe task.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
    // Set when the signal never fires.
    detached: bool,
}

impl CancelHandle {
    pub fn new() -> (Self, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (
            Self { tx },
            CancelSignal {
                rx,
                detached: false,
            },
        )
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        let _ = self.tx.send(true);
    }
}

impl CancelSignal {
    /// A signal nobody can fire.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx, detached: true }
    }

    /// Resolves once cancellation is requested; pends forever for `never()`.
    pub async fn cancelled(&mut self) {
        if self.detached {
            return std::future::pending::<()>().await;
        }
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Sender gone; CancelHandle sends `true` before that.
                return;
            }
        }
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::never()
    }
}
