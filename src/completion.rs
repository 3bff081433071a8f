use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::{Error, Result};

/// Counts generals that have finished their part of a round.
///
/// Many generals signal, only the commander waits.
#[derive(Debug)]
pub(crate) struct Completion {
    finished: Semaphore,
    failed: AtomicUsize,
}

impl Completion {
    pub fn new() -> Self {
        Self {
            finished: Semaphore::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    pub fn signal(&self, succeeded: bool) {
        // failures must be visible before the permit that wakes the waiter
        if !succeeded {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        self.finished.add_permits(1);
    }

    /// Blocks until `expected` signals arrived, returning how many of them
    /// reported a failure.
    pub async fn wait_for(&self, expected: usize, watchdog: Option<Duration>) -> Result<usize> {
        // bounded by MAX_GENERALS
        let acquire = self.finished.acquire_many(expected as u32);

        let acquired = match watchdog {
            Some(timeout) => tokio::time::timeout(timeout, acquire).await.map_err(|_| {
                Error::BroadcastTimedOut {
                    finished: self.finished.available_permits(),
                    expected,
                }
            })?,
            None => acquire.await,
        };
        acquired.map_err(|_| Error::SessionClosed)?.forget();

        Ok(self.failed.swap(0, Ordering::SeqCst))
    }

    pub fn close(&self) {
        self.finished.close();
    }
}
