//! Global concurrency budget shared by coordinators.
//!
//! [`ConcurrencySlots`] is a counting semaphore. Cloning it shares the
//! budget, so several coordinators holding clones never run more than
//! `max` tools together; separate instances are independent.

use std::sync::Arc;
use std::time::Duration;
use subrecon_domain::ExecutionError;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ConcurrencySlots {
    semaphore: Arc<Semaphore>,
    max: usize,
}

impl ConcurrencySlots {
    /// Create a budget of `max` slots (at least one).
    pub fn new(max: usize) -> Self {
        let max = max.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max)),
            max,
        }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// Slots currently held.
    pub fn in_use(&self) -> usize {
        self.max.saturating_sub(self.semaphore.available_permits())
    }

    /// Wait for a free slot, at most `max_wait` when given.
    ///
    /// The slot is released when the returned permit is dropped.
    pub async fn acquire(
        &self,
        max_wait: Option<Duration>,
    ) -> Result<OwnedSemaphorePermit, ExecutionError> {
        let started = Instant::now();
        let acquire = Arc::clone(&self.semaphore).acquire_owned();

        let permit = match max_wait {
            Some(limit) => match tokio::time::timeout(limit, acquire).await {
                Ok(permit) => permit,
                Err(_) => {
                    return Err(ExecutionError::SlotUnavailable {
                        waited_ms: started.elapsed().as_millis() as u64,
                    });
                }
            },
            None => acquire.await,
        };

        let permit = permit.map_err(|_| ExecutionError::ShuttingDown)?;
        debug!(
            "Acquired concurrency slot after {:?} ({}/{} in use)",
            started.elapsed(),
            self.in_use(),
            self.max
        );
        Ok(permit)
    }

    /// Refuse all further acquisitions; pending waiters fail with `ShuttingDown`.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_and_release() {
        let slots = ConcurrencySlots::new(2);
        let a = slots.acquire(None).await.unwrap();
        let _b = slots.acquire(None).await.unwrap();
        assert_eq!(slots.in_use(), 2);
        drop(a);
        assert_eq!(slots.in_use(), 1);
    }

    #[tokio::test]
    async fn test_zero_is_clamped_to_one() {
        assert_eq!(ConcurrencySlots::new(0).max(), 1);
    }

    #[tokio::test]
    async fn test_bounded_wait_expires() {
        let slots = ConcurrencySlots::new(1);
        let _held = slots.acquire(None).await.unwrap();
        let err = slots
            .acquire(Some(Duration::from_millis(20)))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::SlotUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_clones_share_budget() {
        let slots = ConcurrencySlots::new(1);
        let other = slots.clone();
        let _held = slots.acquire(None).await.unwrap();
        assert_eq!(other.in_use(), 1);
        assert!(other.acquire(Some(Duration::from_millis(10))).await.is_err());
    }

    #[tokio::test]
    async fn test_close_wakes_waiters() {
        let slots = ConcurrencySlots::new(1);
        let _held = slots.acquire(None).await.unwrap();
        let waiter = {
            let slots = slots.clone();
            tokio::spawn(async move { slots.acquire(None).await })
        };
        tokio::task::yield_now().await;
        slots.close();
        let result = waiter.await.unwrap();
        assert_eq!(result.unwrap_err(), ExecutionError::ShuttingDown);
        assert!(slots.is_closed());
    }
}
