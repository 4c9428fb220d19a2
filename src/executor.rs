//! Bounded executor for CPU-heavy frame transforms.
//!
//! The executor enforces a hard ceiling on the number of concurrently
//! executing transforms across the *whole* pipeline run. It is the single
//! shared backpressure point: every per-frame transform acquires a slot
//! before running and returns it when done, so CPU-heavy work cannot
//! exhaust system resources no matter how many sources are live.

use crate::error::{Error, Result};
use crate::observability;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Caps the number of concurrently in-flight CPU-bound jobs.
///
/// Slots are a counted resource: [`acquire`](BoundedExecutor::acquire)
/// suspends the caller until one frees, and the returned [`SlotPermit`]
/// gives it back on drop, including on failure paths (scoped acquisition).
/// Queued acquirers are granted slots in FIFO order by the underlying
/// semaphore; no stronger fairness is guaranteed.
///
/// The executor is shared across all sources of a coordinator run, never
/// reset per source.
#[derive(Debug, Clone)]
pub struct BoundedExecutor {
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
}

impl BoundedExecutor {
    /// Create an executor with a hard ceiling of `max_concurrency` slots.
    pub fn new(max_concurrency: usize) -> Result<Self> {
        if max_concurrency == 0 {
            return Err(Error::Configuration(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        })
    }

    /// Acquire one slot, suspending until one is free.
    pub async fn acquire(&self) -> Result<SlotPermit> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| Error::Executor("slot pool closed".to_string()))?;
        observability::record_slots_available(self.available());
        Ok(SlotPermit { _permit: permit })
    }

    /// Acquire a slot without suspending, if one is free right now.
    pub fn try_acquire(&self) -> Option<SlotPermit> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| {
                observability::record_slots_available(self.available());
                SlotPermit { _permit: permit }
            })
    }

    /// Number of slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Number of slots currently held.
    pub fn in_flight(&self) -> usize {
        self.max_concurrency - self.available()
    }

    /// The configured ceiling.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }
}

/// One unit of executor capacity.
///
/// Dropping the permit returns the slot. Holding the permit across the
/// transform (including any `await`) is what enforces the concurrency
/// ceiling.
#[derive(Debug)]
pub struct SlotPermit {
    _permit: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_zero_slots_rejected() {
        assert!(matches!(
            BoundedExecutor::new(0),
            Err(Error::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let executor = BoundedExecutor::new(2).unwrap();
        assert_eq!(executor.available(), 2);

        let a = executor.acquire().await.unwrap();
        let b = executor.acquire().await.unwrap();
        assert_eq!(executor.available(), 0);
        assert_eq!(executor.in_flight(), 2);

        drop(a);
        assert_eq!(executor.available(), 1);
        drop(b);
        assert_eq!(executor.available(), 2);
    }

    #[tokio::test]
    async fn test_try_acquire_when_exhausted() {
        let executor = BoundedExecutor::new(1).unwrap();
        let held = executor.try_acquire();
        assert!(held.is_some());
        assert!(executor.try_acquire().is_none());

        drop(held);
        assert!(executor.try_acquire().is_some());
    }

    #[tokio::test]
    async fn test_acquire_suspends_until_slot_frees() {
        let executor = BoundedExecutor::new(1).unwrap();
        let held = executor.acquire().await.unwrap();

        let waiter = {
            let executor = executor.clone();
            tokio::spawn(async move {
                let _slot = executor.acquire().await.unwrap();
            })
        };

        // The waiter cannot finish while we hold the only slot.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(held);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_slot_released_when_task_fails() {
        let executor = BoundedExecutor::new(1).unwrap();

        let failing = {
            let executor = executor.clone();
            tokio::spawn(async move {
                let _slot = executor.acquire().await.unwrap();
                panic!("job failed");
            })
        };
        assert!(failing.await.is_err());

        // The slot came back despite the panic.
        assert_eq!(executor.available(), 1);
    }
}
