use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::ServiceError;

/// Bounded admission in front of the backend: `workers` generations run at
/// once and at most `depth` more may wait. Anything beyond is turned away.
pub struct GenerationQueue {
    admission: Arc<Semaphore>,
    workers: Arc<Semaphore>,
    worker_count: usize,
    capacity: usize,
}

/// Held for the duration of one backend generation.
pub struct GenerationPermit {
    _worker: OwnedSemaphorePermit,
    _admission: OwnedSemaphorePermit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub workers: usize,
    pub capacity: usize,
    pub in_flight: usize,
}

impl GenerationQueue {
    pub fn new(workers: usize, depth: usize) -> Self {
        let worker_count = workers.max(1);
        let capacity = worker_count + depth;
        Self {
            admission: Arc::new(Semaphore::new(capacity)),
            workers: Arc::new(Semaphore::new(worker_count)),
            worker_count,
            capacity,
        }
    }

    pub async fn acquire(&self) -> Result<GenerationPermit, ServiceError> {
        let admission = self
            .admission
            .clone()
            .try_acquire_owned()
            .map_err(|_| ServiceError::QueueFull)?;
        let worker = self
            .workers
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ServiceError::Internal("generation queue closed".into()))?;
        Ok(GenerationPermit {
            _worker: worker,
            _admission: admission,
        })
    }

    pub fn status(&self) -> QueueStatus {
        QueueStatus {
            workers: self.worker_count,
            capacity: self.capacity,
            in_flight: self.capacity - self.admission.available_permits(),
        }
    }
}
