use crate::{config::validate_concurrency, error::ScanError};
use std::{future::Future, sync::Arc};
use tokio::sync::Semaphore;

/// Bounds the number of futures running at once.
///
/// Slots are handed out first-come-first-served (tokio's semaphore is fair).
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl ConcurrencyLimiter {
    /// Fails with [`ScanError::Config`] for a zero or oversized limit.
    pub fn new(limit: usize) -> Result<Self, ScanError> {
        validate_concurrency(limit)?;
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Slots not currently held.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Waits for a free slot, then drives `task` to completion while holding it.
    pub async fn run<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        // The semaphore is never closed, so acquiring only waits.
        let _permit = self.semaphore.acquire().await.ok();
        task.await
    }
}
