// src/engine/gate.rs
// =============================================================================
// The quiescence gate: how the controller waits for more work.
//
// Workers call `signal()` after pushing neighbors (and whenever something the
// controller cares about changes). The controller calls `await_not_empty`,
// which returns as soon as the queue has something in it, or gives up after
// the timeout with nothing new.
//
// In the default termination mode there is no count of running tasks. "No new
// work showed up within the timeout" is read as "the traversal is done". That
// is a heuristic: a worker still inside a slow neighbor call when the timeout
// fires may push work after the controller has stopped looking.
//
// Rust concepts:
// - tokio::sync::Notify: a permit-based wake-up. A signal sent while nobody is
//   waiting is kept, so a push that races with the start of a wait is not lost
// - Pinning: `Notified` must be pinned before `enable()` registers it
// =============================================================================

use std::time::Duration;

use tokio::sync::Notify;

use super::queue::WorkQueue;

#[derive(Default)]
pub struct QuiescenceGate {
    notify: Notify,
}

impl QuiescenceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wakes one waiter, or leaves a permit for the next one.
    pub fn signal(&self) {
        self.notify.notify_one();
    }

    /// Waits until `queue` is non-empty. Each individual wait is bounded by
    /// `timeout`; returns `false` once a wait elapses with the queue still
    /// empty.
    pub async fn await_not_empty<E>(&self, queue: &WorkQueue<E>, timeout: Duration) -> bool {
        self.await_not_empty_or(queue, timeout, || false).await
    }

    /// Like `await_not_empty`, but also returns `false` as soon as `stop`
    /// holds. `stop` is re-evaluated after every wake-up, so whoever changes
    /// its outcome must `signal()` afterwards.
    pub async fn await_not_empty_or<E, F>(
        &self,
        queue: &WorkQueue<E>,
        timeout: Duration,
        stop: F,
    ) -> bool
    where
        F: Fn() -> bool,
    {
        if !queue.is_empty() {
            return true;
        }

        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before looking at the queue, so a push + signal landing
            // between the check and the wait still wakes us.
            notified.as_mut().enable();

            if !queue.is_empty() {
                return true;
            }
            if stop() {
                return false;
            }

            if tokio::time::timeout(timeout, notified).await.is_err() {
                // One last look: a push may have landed right at the deadline.
                return !queue.is_empty();
            }
        }
    }
}
