// src/engine/traversal.rs
// =============================================================================
// The traversal engine: a controller loop feeding a worker pool.
//
// How a run works:
// 1. Seed the work queue (the root, or a checkpoint's frontier) at depth 0
// 2. Wait on the quiescence gate until the queue has a node
// 3. Pop it; in breadth-first mode, wait on the level barrier first if the
//    node belongs to the next depth
// 4. Take an admission slot and spawn a worker task for the node
// 5. Repeat until the gate gives up (quiescence) or a search has a result
// 6. Hard-stop the pool: in-flight tasks are aborted, not drained
//
// A worker task checks the predicate and the visited set, calls the neighbor
// function, pushes the unvisited neighbors one level deeper, marks its element
// visited and signals the gate.
//
// The engine owns the visited set across runs, which is what makes
// `continue_traversing_from` a resume instead of a fresh crawl.
// =============================================================================

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, info, trace, warn};

use super::admission::{Admission, AdmissionPermit};
use super::barrier::{LevelBarrier, PhaseRegistration};
use super::config::{EngineConfig, Termination};
use super::error::{EngineError, EngineResult};
use super::gate::QuiescenceGate;
use super::neighbors::{Neighbors, Normalizer, Predicate};
use super::node::{Element, Node};
use super::queue::WorkQueue;
use super::visited::VisitedSet;

/// Where the engine is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Idle,
    Running,
    Quiescent,
    ResultFound,
    Shutdown,
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Quiescent,
    ResultFound,
}

/// What one run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub stop: StopReason,
    pub submitted: usize,
    pub newly_visited: usize,
    pub total_visited: usize,
    /// Tasks still running when the pool was stopped.
    pub abandoned: usize,
    pub elapsed_ms: u64,
}

/// Write-once holder for the first matching element of a search.
struct SearchResult<E> {
    found: AtomicBool,
    value: Mutex<Option<E>>,
}

impl<E: Clone> SearchResult<E> {
    fn new() -> Self {
        Self {
            found: AtomicBool::new(false),
            value: Mutex::new(None),
        }
    }

    /// Records `element` unless a result is already held.
    fn offer(&self, element: E) -> bool {
        let mut value = self.value.lock();
        if value.is_some() {
            return false;
        }
        *value = Some(element);
        self.found.store(true, Ordering::Release);
        true
    }

    fn is_found(&self) -> bool {
        self.found.load(Ordering::Acquire)
    }

    fn get(&self) -> Option<E> {
        self.value.lock().clone()
    }

    fn clear(&self) {
        let mut value = self.value.lock();
        *value = None;
        self.found.store(false, Ordering::Release);
    }
}

/// State shared between the controller and every worker task.
struct Shared<E: Element> {
    queue: WorkQueue<E>,
    visited: VisitedSet<E>,
    gate: QuiescenceGate,
    result: SearchResult<E>,
    in_flight: AtomicUsize,
    neighbors: Arc<dyn Neighbors<E>>,
    predicate: Option<Predicate<E>>,
    normalize: Option<Normalizer<E>>,
    neighbor_timeout: Duration,
    max_depth: Option<usize>,
}

impl<E: Element> Shared<E> {
    /// The form an element is tracked under: seeds and discovered neighbors
    /// alike go through it before they reach the queue.
    fn canonical(&self, element: E) -> E {
        match &self.normalize {
            Some(normalize) => normalize(element),
            None => element,
        }
    }

    fn seed<I>(&self, elements: I)
    where
        I: IntoIterator<Item = E>,
    {
        self.queue
            .push_all(elements.into_iter().map(|element| Node::root(self.canonical(element))));
    }

    /// Calls the neighbor function for `node`. Any failure is a dead end.
    async fn expand(&self, node: &Node<E>) -> HashSet<E> {
        if let Some(max_depth) = self.max_depth {
            if node.depth() >= max_depth {
                trace!(element = ?node.element(), depth = node.depth(), "depth limit reached");
                return HashSet::new();
            }
        }

        let call = self.neighbors.neighbors(node.element(), self.neighbor_timeout);
        let guarded = AssertUnwindSafe(call).catch_unwind();

        match tokio::time::timeout(self.neighbor_timeout, guarded).await {
            Ok(Ok(Ok(neighbors))) => neighbors,
            Ok(Ok(Err(error))) => {
                warn!(element = ?node.element(), error = %error, "expansion failed, treating node as a dead end");
                HashSet::new()
            }
            Ok(Err(_panic)) => {
                warn!(element = ?node.element(), "neighbor function panicked, treating node as a dead end");
                HashSet::new()
            }
            Err(_elapsed) => {
                warn!(
                    element = ?node.element(),
                    timeout_ms = self.neighbor_timeout.as_millis() as u64,
                    "expansion timed out, treating node as a dead end"
                );
                HashSet::new()
            }
        }
    }
}

/// Counts a task as in flight until dropped; wakes the controller on the way
/// out so exact termination notices the last task finishing.
struct InFlight<E: Element> {
    shared: Arc<Shared<E>>,
}

impl<E: Element> InFlight<E> {
    fn enter(shared: &Arc<Shared<E>>) -> Self {
        shared.in_flight.fetch_add(1, Ordering::AcqRel);
        Self {
            shared: Arc::clone(shared),
        }
    }
}

impl<E: Element> Drop for InFlight<E> {
    fn drop(&mut self) {
        self.shared.in_flight.fetch_sub(1, Ordering::AcqRel);
        self.shared.gate.signal();
    }
}

/// One node's expansion. Owns everything it must release when it ends, so
/// aborting the task releases it too.
struct Worker<E: Element> {
    node: Node<E>,
    searching: bool,
    cancelled: Arc<AtomicBool>,
    in_flight: InFlight<E>,
    _registration: Option<PhaseRegistration>,
    _permit: AdmissionPermit,
}

impl<E: Element> Worker<E> {
    async fn run(self) {
        let shared = &self.in_flight.shared;
        let node = &self.node;

        if self.searching {
            if let Some(predicate) = &shared.predicate {
                if predicate(node) {
                    if shared.result.offer(node.element().clone()) {
                        debug!(element = ?node.element(), depth = node.depth(), "search predicate matched");
                    }
                    shared.gate.signal();
                    return;
                }
            }
        }

        if shared.visited.contains(node.element()) {
            trace!(element = ?node.element(), "already visited");
            return;
        }
        if self.cancelled.load(Ordering::Acquire) {
            return;
        }

        let neighbors = shared.expand(node).await;
        // Abort only lands at the next await. On a multi-thread pool a task
        // whose expansion finishes as the run stops still gets here.
        if self.cancelled.load(Ordering::Acquire) {
            return;
        }

        let discovered: HashSet<E> = neighbors
            .into_iter()
            .map(|element| shared.canonical(element))
            .filter(|element| !shared.visited.contains(element))
            .collect();

        trace!(
            element = ?node.element(),
            depth = node.depth(),
            discovered = discovered.len(),
            "expanded"
        );

        shared
            .queue
            .push_all(discovered.into_iter().map(|element| node.child(element)));
        shared.visited.insert(node.element().clone());
        shared.gate.signal();
    }
}

/// Configures and builds a [`TraversalEngine`].
pub struct EngineBuilder<E: Element> {
    neighbors: Arc<dyn Neighbors<E>>,
    config: EngineConfig,
    predicate: Option<Predicate<E>>,
    normalize: Option<Normalizer<E>>,
}

impl<E: Element> EngineBuilder<E> {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn predicate<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&Node<E>) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn normalize<N>(mut self, normalize: N) -> Self
    where
        N: Fn(E) -> E + Send + Sync + 'static,
    {
        self.normalize = Some(Arc::new(normalize));
        self
    }

    pub fn build(self) -> EngineResult<TraversalEngine<E>> {
        self.config.validate()?;
        let admission = Admission::new(self.config.max_in_flight, self.config.submit_delay())?;

        let shared = Shared {
            queue: WorkQueue::new(self.config.order.queue_order()),
            visited: VisitedSet::new(),
            gate: QuiescenceGate::new(),
            result: SearchResult::new(),
            in_flight: AtomicUsize::new(0),
            neighbors: self.neighbors,
            predicate: self.predicate,
            normalize: self.normalize,
            neighbor_timeout: self.config.neighbor_timeout(),
            max_depth: self.config.max_depth,
        };

        Ok(TraversalEngine {
            shared: Arc::new(shared),
            admission,
            config: self.config,
            state: EngineState::Idle,
            last_summary: None,
        })
    }
}

pub struct TraversalEngine<E: Element> {
    shared: Arc<Shared<E>>,
    admission: Admission,
    config: EngineConfig,
    state: EngineState,
    last_summary: Option<RunSummary>,
}

impl<E: Element> TraversalEngine<E> {
    pub fn builder<N>(neighbors: N) -> EngineBuilder<E>
    where
        N: Neighbors<E>,
    {
        EngineBuilder {
            neighbors: Arc::new(neighbors),
            config: EngineConfig::default(),
            predicate: None,
            normalize: None,
        }
    }

    /// Visits everything reachable from `root`.
    pub async fn traverse(&mut self, root: E) -> RunSummary {
        self.shared.seed([root]);
        self.run(false).await
    }

    /// Looks for an element matching the predicate, starting from `root`.
    pub async fn search(&mut self, root: E) -> EngineResult<Option<E>> {
        self.ensure_predicate()?;
        self.shared.result.clear();
        self.shared.seed([root]);
        self.run(true).await;
        Ok(self.shared.result.get())
    }

    /// Resumes traversal from `elements`, keeping everything already visited.
    /// The elements restart at depth 0.
    pub async fn continue_traversing_from(&mut self, elements: Vec<E>) -> RunSummary {
        self.shared.seed(elements);
        self.run(false).await
    }

    /// Resumes a search from `elements`, keeping everything already visited.
    pub async fn continue_searching_from(&mut self, elements: Vec<E>) -> EngineResult<Option<E>> {
        self.ensure_predicate()?;
        self.shared.result.clear();
        self.shared.seed(elements);
        self.run(true).await;
        Ok(self.shared.result.get())
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn last_summary(&self) -> Option<&RunSummary> {
        self.last_summary.as_ref()
    }

    pub fn is_visited(&self, element: &E) -> bool {
        self.shared.visited.contains(element)
    }

    pub fn visited_len(&self) -> usize {
        self.shared.visited.len()
    }

    pub fn visited_elements(&self) -> Vec<E> {
        self.shared.visited.snapshot()
    }

    /// Marks elements visited without expanding them, e.g. from a checkpoint.
    pub fn restore_visited<I>(&mut self, elements: I)
    where
        I: IntoIterator<Item = E>,
    {
        for element in elements {
            self.shared.visited.insert(element);
        }
    }

    /// Takes whatever a stopped run left in the queue.
    pub fn drain_frontier(&mut self) -> Vec<E> {
        self.shared
            .queue
            .drain()
            .into_iter()
            .map(Node::into_element)
            .collect()
    }

    fn ensure_predicate(&self) -> EngineResult<()> {
        if self.shared.predicate.is_none() {
            return Err(EngineError::MissingPredicate);
        }
        Ok(())
    }

    async fn run(&mut self, searching: bool) -> RunSummary {
        let started = Instant::now();
        let visited_before = self.shared.visited.len();
        let order = self.config.order;
        let exact = self.config.termination == Termination::Exact;
        let timeout = self.config.quiescence_timeout();

        self.state = EngineState::Running;
        info!(
            ?order,
            searching,
            queued = self.shared.queue.len(),
            visited = visited_before,
            "run started"
        );

        // Fresh per run: phase 0 and nothing registered, matching the depth-0
        // seeds.
        let barrier = order.uses_level_barrier().then(|| Arc::new(LevelBarrier::new()));
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut workers = JoinSet::new();
        let mut submitted = 0usize;

        let stop = loop {
            let shared = &self.shared;
            if searching && shared.result.is_found() {
                break StopReason::ResultFound;
            }

            let has_work = shared
                .gate
                .await_not_empty_or(&shared.queue, timeout, || {
                    (searching && shared.result.is_found())
                        || (exact
                            && shared.in_flight.load(Ordering::Acquire) == 0
                            && shared.queue.is_empty())
                })
                .await;

            if !has_work {
                if searching && shared.result.is_found() {
                    break StopReason::ResultFound;
                }
                if exact && shared.in_flight.load(Ordering::Acquire) > 0 {
                    continue;
                }
                break StopReason::Quiescent;
            }

            let Some(node) = shared.queue.pop() else {
                continue;
            };

            if let Some(barrier) = &barrier {
                while barrier.phase() < node.depth() {
                    trace!(
                        phase = barrier.phase(),
                        next_depth = node.depth(),
                        running = barrier.registered(),
                        "waiting for level to drain"
                    );
                    let phase = barrier.arrive_and_await_advance().await;
                    debug!(phase, "level barrier advanced");
                }
                if searching && shared.result.is_found() {
                    // Leave it for a checkpoint instead of dropping it.
                    shared.queue.push(node);
                    break StopReason::ResultFound;
                }
            }

            let permit = self.admission.acquire().await;
            let worker = Worker {
                node,
                searching,
                cancelled: Arc::clone(&cancelled),
                in_flight: InFlight::enter(shared),
                _registration: barrier.as_ref().map(|barrier| barrier.register()),
                _permit: permit,
            };
            workers.spawn(worker.run());
            submitted += 1;

            self.admission.pace().await;

            reap(&mut workers);
        };

        self.state = match stop {
            StopReason::Quiescent => EngineState::Quiescent,
            StopReason::ResultFound => EngineState::ResultFound,
        };

        cancelled.store(true, Ordering::Release);
        reap(&mut workers);
        let abandoned = self.shared.in_flight.load(Ordering::Acquire);
        workers.shutdown().await;
        self.state = EngineState::Shutdown;

        let total_visited = self.shared.visited.len();
        let summary = RunSummary {
            stop,
            submitted,
            newly_visited: total_visited.saturating_sub(visited_before),
            total_visited,
            abandoned,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            stop = ?summary.stop,
            submitted = summary.submitted,
            visited = summary.total_visited,
            abandoned = summary.abandoned,
            elapsed_ms = summary.elapsed_ms,
            "run finished"
        );

        self.last_summary = Some(summary.clone());
        summary
    }
}

// Collects finished worker tasks without waiting for the rest.
fn reap(workers: &mut JoinSet<()>) {
    while let Some(joined) = workers.try_join_next() {
        if let Err(error) = joined {
            if error.is_panic() {
                warn!(error = %error, "worker task panicked");
            }
        }
    }
}
