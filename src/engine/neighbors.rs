// src/engine/neighbors.rs
// =============================================================================
// The pluggable parts of a traversal: how an element expands into its
// neighbors, what a search is looking for, and how discovered elements are
// normalized before the visited check.
// =============================================================================

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::node::{Element, Node};

/// Expands one element into its neighbors.
///
/// Implementations should honor `timeout` for whatever I/O they do. The engine
/// enforces it too, and treats an error or an elapsed timeout as "no
/// neighbors": the element becomes a dead end, the traversal carries on.
pub trait Neighbors<E>: Send + Sync + 'static {
    fn neighbors(&self, element: &E, timeout: Duration) -> BoxFuture<'static, anyhow::Result<HashSet<E>>>;
}

impl<E, F, Fut> Neighbors<E> for F
where
    E: Element,
    F: Fn(E, Duration) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<HashSet<E>>> + Send + 'static,
{
    fn neighbors(&self, element: &E, timeout: Duration) -> BoxFuture<'static, anyhow::Result<HashSet<E>>> {
        self(element.clone(), timeout).boxed()
    }
}

/// Decides whether a node is what a search is looking for. Must be pure:
/// several workers call it concurrently, sometimes on the same element.
pub type Predicate<E> = Arc<dyn Fn(&Node<E>) -> bool + Send + Sync>;

/// Maps a discovered element to its canonical form before it is compared
/// against the visited set.
pub type Normalizer<E> = Arc<dyn Fn(E) -> E + Send + Sync>;
