// src/engine/barrier.rs
// =============================================================================
// The level barrier used in breadth-first mode.
//
// Every task admitted for the current depth registers with the barrier and
// deregisters when it finishes. Before admitting a task for a deeper level the
// controller waits here until the registration count drops to zero, then the
// phase advances. The result is strict layering: all depth-d expansions finish
// before any depth-(d+1) expansion starts.
//
// The controller is the implicit permanent party. Its arrival is the call to
// `arrive_and_await_advance`, so the phase can never run ahead of work the
// controller has not submitted yet.
//
// Deregistration is tied to `Drop`. A task that returns early, errors, panics
// or is aborted at shutdown still releases the barrier.
// =============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct PhaseState {
    phase: usize,
    registered: usize,
}

#[derive(Debug, Default)]
pub struct LevelBarrier {
    state: Mutex<PhaseState>,
    drained: Notify,
}

impl LevelBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// The depth currently being drained.
    pub fn phase(&self) -> usize {
        self.state.lock().phase
    }

    /// Tasks registered in the current phase that have not arrived yet.
    pub fn registered(&self) -> usize {
        self.state.lock().registered
    }

    /// Registers one task in the current phase. The task arrives and
    /// deregisters when the returned handle is consumed or dropped.
    pub fn register(self: &Arc<Self>) -> PhaseRegistration {
        self.state.lock().registered += 1;
        PhaseRegistration {
            barrier: Some(Arc::clone(self)),
        }
    }

    fn deregister(&self) {
        let drained = {
            let mut state = self.state.lock();
            state.registered = state.registered.saturating_sub(1);
            state.registered == 0
        };
        if drained {
            self.drained.notify_waiters();
        }
    }

    /// Waits for every registered task to arrive, then advances the phase and
    /// returns the new one.
    pub async fn arrive_and_await_advance(&self) -> usize {
        loop {
            let drained = self.drained.notified();
            tokio::pin!(drained);
            drained.as_mut().enable();

            {
                let mut state = self.state.lock();
                if state.registered == 0 {
                    state.phase += 1;
                    return state.phase;
                }
            }

            drained.await;
        }
    }
}

/// A task's membership in the current phase.
#[must_use = "dropping the registration deregisters the task immediately"]
pub struct PhaseRegistration {
    barrier: Option<Arc<LevelBarrier>>,
}

impl PhaseRegistration {
    pub fn arrive_and_deregister(mut self) {
        if let Some(barrier) = self.barrier.take() {
            barrier.deregister();
        }
    }
}

impl Drop for PhaseRegistration {
    fn drop(&mut self) {
        if let Some(barrier) = self.barrier.take() {
            barrier.deregister();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_advances_immediately_with_nothing_registered() {
        let barrier = LevelBarrier::new();
        assert_eq!(barrier.phase(), 0);
        assert_eq!(barrier.arrive_and_await_advance().await, 1);
        assert_eq!(barrier.arrive_and_await_advance().await, 2);
    }

    #[tokio::test]
    async fn test_explicit_and_dropped_registrations_both_count() {
        let barrier = Arc::new(LevelBarrier::new());
        let first = barrier.register();
        let second = barrier.register();
        assert_eq!(barrier.registered(), 2);

        first.arrive_and_deregister();
        drop(second);
        assert_eq!(barrier.registered(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_waits_for_every_task_in_the_phase() {
        let barrier = Arc::new(LevelBarrier::new());
        let finished = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for i in 0..4u64 {
            let registration = barrier.register();
            let finished = Arc::clone(&finished);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10 * (i + 1))).await;
                finished.lock().push(i);
                drop(registration);
            });
        }

        let phase = barrier.arrive_and_await_advance().await;
        assert_eq!(phase, 1);
        assert_eq!(finished.lock().len(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panicking_task_still_releases_the_barrier() {
        let barrier = Arc::new(LevelBarrier::new());
        let registration = barrier.register();

        let task = tokio::spawn(async move {
            let _registration = registration;
            panic!("expansion blew up");
        });
        assert!(task.await.is_err());

        let advanced = tokio::time::timeout(
            Duration::from_secs(5),
            barrier.arrive_and_await_advance(),
        )
        .await;
        assert_eq!(advanced.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_aborted_task_still_releases_the_barrier() {
        let barrier = Arc::new(LevelBarrier::new());
        let registration = barrier.register();

        let task = tokio::spawn(async move {
            let _registration = registration;
            std::future::pending::<()>().await;
        });
        task.abort();
        let _ = task.await;

        assert_eq!(barrier.registered(), 0);
        assert_eq!(barrier.arrive_and_await_advance().await, 1);
    }
}
