//! Coalescing "state changed, re-check" signal.
//!
//! A channel with a single slot: a beat sent while one is already pending is
//! dropped, since the listener re-derives everything from a fresh snapshot.

use tokio::sync::mpsc::{self, error::TrySendError};

/// Sending half, cloned into every worker of a batch.
#[derive(Clone, Debug)]
pub struct Heartbeat {
    tx: mpsc::Sender<()>,
}

/// Receiving half, owned by the convergence monitor.
#[derive(Debug)]
pub struct HeartbeatListener {
    rx: mpsc::Receiver<()>,
}

pub fn heartbeat() -> (Heartbeat, HeartbeatListener) {
    let (tx, rx) = mpsc::channel(1);
    (Heartbeat { tx }, HeartbeatListener { rx })
}

impl Heartbeat {
    /// Never blocks.
    pub fn beat(&self) {
        match self.tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Closed(())) => {
                tracing::trace!("Heartbeat listener gone, dropping beat");
            }
        }
    }
}

impl HeartbeatListener {
    /// Wait for the next beat. Returns false once every sender is gone and
    /// nothing is pending.
    pub async fn next(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }

    /// Stop accepting beats and discard any pending one.
    pub fn close(&mut self) {
        self.rx.close();
        while self.rx.try_recv().is_ok() {}
    }
}
