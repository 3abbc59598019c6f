// src/engine/mod.rs
// =============================================================================
// The concurrent graph traversal engine.
//
// Given a root element and a neighbor function, the engine visits everything
// reachable (traverse) or stops at the first element a predicate accepts
// (search). A controller loop pops nodes from a shared work queue and hands
// each one to a pool of worker tasks; workers expand nodes and push what they
// discover back onto the queue.
//
// Submodules, leaves first:
// - node: the (element, depth) pair, identified by element alone
// - visited: the concurrent visited set
// - queue: the FIFO/LIFO work queue
// - gate: waiting for "queue non-empty" with a timeout
// - barrier: level synchronization for breadth-first mode
// - admission: bounding in-flight tasks and pacing submissions
// - sizing: choosing and building the worker pool
// - traversal: the controller loop, the worker task and the public engine
// =============================================================================

mod admission;
mod barrier;
mod config;
mod error;
mod gate;
mod neighbors;
mod node;
mod queue;
mod sizing;
mod traversal;
mod visited;

#[cfg(test)]
pub(crate) mod testing;

pub use admission::{Admission, AdmissionPermit};
pub use barrier::{LevelBarrier, PhaseRegistration};
pub use config::{EngineConfig, Termination, TraversalOrder};
pub use error::{EngineError, EngineResult};
pub use gate::QuiescenceGate;
pub use neighbors::{Neighbors, Normalizer, Predicate};
pub use node::{Element, Node};
pub use queue::{QueueOrder, WorkQueue};
pub use sizing::{available_cores, pool_size, ExecutorConfig, PoolKind};
pub use traversal::{EngineBuilder, EngineState, RunSummary, StopReason, TraversalEngine};
pub use visited::VisitedSet;
