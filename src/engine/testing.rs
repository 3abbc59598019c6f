// src/engine/testing.rs
// =============================================================================
// Test support: an in-memory graph that plays the neighbor function, and a
// plain sequential BFS to compare the concurrent engine against.
//
// The fixture records every expansion (which element, when it started, when
// it finished), how often each element was expanded, and the highest number
// of expansions that ran at the same time.
// =============================================================================

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;

use super::neighbors::Neighbors;

type Vertex = &'static str;

#[derive(Debug, Clone)]
pub struct Expansion {
    pub element: Vertex,
    pub started: Instant,
    pub finished: Instant,
}

#[derive(Default)]
struct FixtureState {
    edges: HashMap<Vertex, Vec<Vertex>>,
    failing: HashSet<Vertex>,
    panicking: HashSet<Vertex>,
    slow: HashMap<Vertex, Duration>,
    latency: Duration,
    calls: DashMap<Vertex, usize>,
    expansions: Mutex<Vec<Expansion>>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

#[derive(Clone)]
pub struct GraphFixture {
    state: Arc<FixtureState>,
}

struct Running<'a>(&'a FixtureState);

impl<'a> Running<'a> {
    fn enter(state: &'a FixtureState) -> Self {
        let now = state.running.fetch_add(1, Ordering::AcqRel) + 1;
        state.peak.fetch_max(now, Ordering::AcqRel);
        Running(state)
    }
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.0.running.fetch_sub(1, Ordering::AcqRel);
    }
}

impl GraphFixture {
    pub fn new(edges: &[(Vertex, &[Vertex])]) -> Self {
        let state = FixtureState {
            edges: edges
                .iter()
                .map(|(from, to)| (*from, to.to_vec()))
                .collect(),
            ..FixtureState::default()
        };
        Self {
            state: Arc::new(state),
        }
    }

    /// A `rows` x `cols` grid with edges in all four directions. Vertices are
    /// named "row-col".
    pub fn grid(rows: usize, cols: usize) -> Self {
        let name = |r: usize, c: usize| -> Vertex { Box::leak(format!("{r}-{c}").into_boxed_str()) };
        let mut edges = HashMap::new();
        for r in 0..rows {
            for c in 0..cols {
                let mut out = Vec::new();
                if r > 0 {
                    out.push(name(r - 1, c));
                }
                if r + 1 < rows {
                    out.push(name(r + 1, c));
                }
                if c > 0 {
                    out.push(name(r, c - 1));
                }
                if c + 1 < cols {
                    out.push(name(r, c + 1));
                }
                edges.insert(name(r, c), out);
            }
        }
        Self::from_edges(edges)
    }

    /// `hub` pointing at `leaves` dead-end vertices.
    pub fn star(hub: Vertex, leaves: usize) -> Self {
        let leaves: Vec<Vertex> = (0..leaves)
            .map(|i| -> Vertex { Box::leak(format!("leaf-{i}").into_boxed_str()) })
            .collect();
        let mut edges = HashMap::new();
        for leaf in &leaves {
            edges.insert(*leaf, Vec::new());
        }
        edges.insert(hub, leaves);
        Self::from_edges(edges)
    }

    fn from_edges(edges: HashMap<Vertex, Vec<Vertex>>) -> Self {
        Self {
            state: Arc::new(FixtureState {
                edges,
                ..FixtureState::default()
            }),
        }
    }

    fn configure(self, change: impl FnOnce(&mut FixtureState)) -> Self {
        let mut state = Arc::try_unwrap(self.state)
            .unwrap_or_else(|_| panic!("configure the fixture before sharing it"));
        change(&mut state);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn failing_on(self, element: Vertex) -> Self {
        self.configure(|state| {
            state.failing.insert(element);
        })
    }

    pub fn panicking_on(self, element: Vertex) -> Self {
        self.configure(|state| {
            state.panicking.insert(element);
        })
    }

    pub fn slow_on(self, element: Vertex, delay: Duration) -> Self {
        self.configure(|state| {
            state.slow.insert(element, delay);
        })
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        self.configure(|state| state.latency = latency)
    }

    pub fn calls(&self, element: Vertex) -> usize {
        self.state.calls.get(element).map(|count| *count).unwrap_or(0)
    }

    pub fn expansions(&self) -> Vec<Expansion> {
        self.state.expansions.lock().clone()
    }

    pub fn max_concurrency(&self) -> usize {
        self.state.peak.load(Ordering::Acquire)
    }

    pub fn edges(&self, element: Vertex) -> &[Vertex] {
        self.state
            .edges
            .get(element)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Neighbors<Vertex> for GraphFixture {
    fn neighbors(&self, element: &Vertex, _timeout: Duration) -> BoxFuture<'static, anyhow::Result<HashSet<Vertex>>> {
        let state = Arc::clone(&self.state);
        let element = *element;

        async move {
            let started = Instant::now();
            *state.calls.entry(element).or_insert(0) += 1;
            let _running = Running::enter(&state);

            let delay = state.slow.get(element).copied().unwrap_or(state.latency);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if state.panicking.contains(element) {
                panic!("neighbor function exploded on {element}");
            }

            let result = if state.failing.contains(element) {
                Err(anyhow!("fetch failed for {element}"))
            } else {
                Ok(state
                    .edges
                    .get(element)
                    .map(|out| out.iter().copied().collect())
                    .unwrap_or_default())
            };

            state.expansions.lock().push(Expansion {
                element,
                started,
                finished: Instant::now(),
            });
            result
        }
        .boxed()
    }
}

/// Shortest-path depth of every vertex reachable from `root`.
pub fn bfs_depths(graph: &GraphFixture, root: Vertex) -> HashMap<Vertex, usize> {
    let mut depths = HashMap::from([(root, 0)]);
    let mut queue = VecDeque::from([root]);

    while let Some(vertex) = queue.pop_front() {
        let depth = depths[vertex];
        for next in graph.edges(vertex) {
            if !depths.contains_key(next) {
                depths.insert(*next, depth + 1);
                queue.push_back(*next);
            }
        }
    }
    depths
}

/// Every vertex reachable from `root`.
pub fn reachable(graph: &GraphFixture, root: Vertex) -> HashSet<Vertex> {
    bfs_depths(graph, root).into_keys().collect()
}

/// Asserts that every expansion at a shallower depth finished before any
/// expansion at a deeper depth started.
pub fn assert_layered(expansions: &[Expansion], depths: &HashMap<Vertex, usize>) {
    for earlier in expansions {
        for later in expansions {
            if depths[earlier.element] < depths[later.element] {
                assert!(
                    earlier.finished <= later.started,
                    "{} (depth {}) was still running when {} (depth {}) started",
                    earlier.element,
                    depths[earlier.element],
                    later.element,
                    depths[later.element],
                );
            }
        }
    }
}
