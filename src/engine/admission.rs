// src/engine/admission.rs
// =============================================================================
// Admission control: how fast the controller may hand nodes to the pool.
//
// Without the level barrier nothing else stops the controller from spawning a
// task for every node it pops. Two knobs bound that:
// - max_in_flight: a semaphore permit per running task. The controller waits
//   for a permit before it spawns; the task returns it when it ends
// - submit_delay: a fixed pause after each submission, for politeness toward
//   the crawled servers
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::error::{EngineError, EngineResult};

pub struct Admission {
    permits: Option<Arc<Semaphore>>,
    delay: Duration,
}

/// Held by a running task. Dropping it frees the slot.
pub struct AdmissionPermit {
    _permit: Option<OwnedSemaphorePermit>,
}

impl Admission {
    pub fn new(max_in_flight: Option<usize>, delay: Duration) -> EngineResult<Self> {
        let permits = match max_in_flight {
            Some(0) => return Err(EngineError::invalid("max in-flight tasks must be > 0")),
            Some(limit) => Some(Arc::new(Semaphore::new(limit))),
            None => None,
        };
        Ok(Self { permits, delay })
    }

    /// Waits for a free slot.
    pub async fn acquire(&self) -> AdmissionPermit {
        let permit = match &self.permits {
            // The semaphore is never closed, so acquisition only fails if
            // that changes; run unthrottled rather than stall the crawl.
            Some(semaphore) => Arc::clone(semaphore).acquire_owned().await.ok(),
            None => None,
        };
        AdmissionPermit { _permit: permit }
    }

    /// The pause between two submissions.
    pub async fn pace(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    /// Free slots, or `None` when unbounded.
    #[cfg(test)]
    fn available(&self) -> Option<usize> {
        self.permits.as_ref().map(|s| s.available_permits())
    }
}
