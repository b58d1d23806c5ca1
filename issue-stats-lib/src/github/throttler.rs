use core::time::Duration;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Bounds the number of in-flight GitHub requests and lets any request hold
/// back all the others while a rate limit resets.
#[derive(Debug)]
pub struct Throttler {
    semaphore: Arc<Semaphore>,

    /// When set, no new request starts before this instant
    resume_at: Mutex<Option<Instant>>,
}

impl Throttler {
    #[must_use]
    pub fn new(max_concurrent: usize) -> Arc<Self> {
        Arc::new(Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            resume_at: Mutex::new(None),
        })
    }

    /// Wait out any active pause, then take a request slot.
    ///
    /// The slot is released when the returned permit is dropped.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        loop {
            let resume_at = *self.resume_at.lock().expect("lock not poisoned");
            match resume_at {
                Some(at) if at > Instant::now() => tokio::time::sleep_until(at).await,
                _ => break,
            }
        }

        Arc::clone(&self.semaphore).acquire_owned().await.ok()
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn is_paused(&self) -> bool {
        self.resume_at
            .lock()
            .expect("lock not poisoned")
            .is_some_and(|at| at > Instant::now())
    }

    /// Hold back new requests for `duration`.
    ///
    /// Returns `false` when an equal or longer pause is already in effect.
    pub fn pause_for(&self, duration: Duration) -> bool {
        let until = Instant::now() + duration;
        let mut guard = self.resume_at.lock().expect("lock not poisoned");
        if guard.is_some_and(|existing| existing >= until) {
            return false;
        }

        *guard = Some(until);
        true
    }
}
