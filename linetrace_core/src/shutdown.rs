//! Cooperative cancellation for the control loop.
//!
//! `ShutdownHandle::trigger` may be called from any thread (e.g. a Ctrl-C
//! handler). The loop observes it between cycles, and `Shutdown::wait` wakes
//! immediately instead of sleeping out the rest of the period.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{self as xch, RecvTimeoutError};

#[derive(Debug)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
    tx: xch::Sender<()>,
    rx: xch::Receiver<()>,
}

#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    tx: xch::Sender<()>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = xch::bounded(1);
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            tx,
            rx,
        }
    }

    pub fn handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.flag),
            tx: self.tx.clone(),
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Sleep for up to `d`. Returns true as soon as shutdown is requested.
    pub fn wait(&self, d: Duration) -> bool {
        if self.is_triggered() {
            return true;
        }
        if d.is_zero() {
            return false;
        }
        match self.rx.recv_timeout(d) {
            Ok(()) => true,
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                self.is_triggered()
            }
        }
    }
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Release);
        // A full channel already holds a wakeup.
        let _ = self.tx.try_send(());
    }
}
