//! Bulkhead - Process-wide admission control for tool executions.
//!
//! A bounded semaphore caps in-flight tool executions. Admission is
//! first-come-first-served but not strictly fair under contention.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use super::ExecutorError;

/// Bounded-concurrency admission semaphore.
#[derive(Debug, Clone)]
pub struct Bulkhead {
    semaphore: Arc<Semaphore>,
    max_wait: Duration,
}

impl Bulkhead {
    /// Creates a bulkhead admitting up to `max_concurrent` executions, with
    /// a bounded wait before callers are turned away.
    pub fn new(max_concurrent: usize, max_wait: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            max_wait,
        }
    }

    /// Acquires an execution slot.
    ///
    /// Blocks up to the bounded wait; fails with `BulkheadFull` when no slot
    /// frees up in time, or `Cancelled` if the token fires first.
    pub async fn acquire(
        &self,
        cancellation: &CancellationToken,
    ) -> Result<OwnedSemaphorePermit, ExecutorError> {
        let acquire = Arc::clone(&self.semaphore).acquire_owned();
        tokio::select! {
            _ = cancellation.cancelled() => Err(ExecutorError::Cancelled),
            acquired = tokio::time::timeout(self.max_wait, acquire) => match acquired {
                Ok(Ok(permit)) => Ok(permit),
                // The semaphore is never closed while the bulkhead lives.
                Ok(Err(_)) => Err(ExecutorError::Cancelled),
                Err(_) => Err(ExecutorError::BulkheadFull {
                    millis: self.max_wait.as_millis() as u64,
                }),
            },
        }
    }

    /// Number of currently free slots.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn admits_up_to_capacity() {
        let bulkhead = Bulkhead::new(2, Duration::from_millis(20));
        let token = CancellationToken::new();
        let _a = bulkhead.acquire(&token).await.unwrap();
        let _b = bulkhead.acquire(&token).await.unwrap();
        assert_eq!(bulkhead.available(), 0);
    }

    #[tokio::test]
    async fn fails_fast_when_full_past_the_bounded_wait() {
        let bulkhead = Bulkhead::new(1, Duration::from_millis(20));
        let token = CancellationToken::new();
        let _held = bulkhead.acquire(&token).await.unwrap();
        let err = bulkhead.acquire(&token).await.unwrap_err();
        assert!(matches!(err, ExecutorError::BulkheadFull { .. }));
    }

    #[tokio::test]
    async fn released_slot_admits_the_next_caller() {
        let bulkhead = Bulkhead::new(1, Duration::from_millis(100));
        let token = CancellationToken::new();
        let held = bulkhead.acquire(&token).await.unwrap();
        drop(held);
        assert!(bulkhead.acquire(&token).await.is_ok());
    }

    #[tokio::test]
    async fn cancellation_interrupts_the_wait() {
        let bulkhead = Bulkhead::new(1, Duration::from_secs(10));
        let token = CancellationToken::new();
        let _held = bulkhead.acquire(&token).await.unwrap();
        token.cancel();
        let err = bulkhead.acquire(&token).await.unwrap_err();
        assert!(matches!(err, ExecutorError::Cancelled));
    }
}
